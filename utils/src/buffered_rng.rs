//! A deterministic randomness source that replays a caller-provided buffer.

use crate::block::Block;

/// Draws 128 bit blocks from a fixed byte buffer in order.
///
/// Key generation consumes its randomness through this type so that callers
/// fully control it: feeding byte-identical buffers produces byte-identical
/// keys.  Callers size the buffer via the scheme's `rand_buf_size` before
/// drawing; running past the end of the buffer panics.
#[derive(Debug)]
pub struct BufferedRng<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BufferedRng<'a> {
    /// Wrap a byte buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Draw the next block, interpreting the bytes as little-endian.
    pub fn next_block(&mut self) -> Block {
        let end = self.pos + Block::BYTES;
        assert!(end <= self.buf.len(), "random byte buffer exhausted");
        let bytes: [u8; Block::BYTES] = self.buf[self.pos..end]
            .try_into()
            .expect("does not fail since the slice is BYTES long");
        self.pos = end;
        Block::from_le_bytes(bytes)
    }

    /// Number of unconsumed bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_are_consumed_in_order() {
        let mut buf = [0u8; 32];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = i as u8;
        }
        let mut rng = BufferedRng::new(&buf);
        assert_eq!(rng.remaining(), 32);
        let b0 = rng.next_block();
        assert_eq!(b0.to_le_bytes()[0], 0);
        assert_eq!(b0.to_le_bytes()[15], 15);
        let b1 = rng.next_block();
        assert_eq!(b1.to_le_bytes()[0], 16);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let buf = [0x5au8; 32];
        let mut a = BufferedRng::new(&buf);
        let mut b = BufferedRng::new(&buf);
        assert_eq!(a.next_block(), b.next_block());
        assert_eq!(a.next_block(), b.next_block());
    }

    #[test]
    #[should_panic(expected = "random byte buffer exhausted")]
    fn test_overrun_panics() {
        let buf = [0u8; 16];
        let mut rng = BufferedRng::new(&buf);
        rng.next_block();
        rng.next_block();
    }
}
