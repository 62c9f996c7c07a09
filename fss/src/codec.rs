//! Fixed binary wire format for DPF keys.
//!
//! Layout of a serialized key, in order:
//!
//! 1. scheme tag (1 byte, always 0)
//! 2. `domain_bits` (1 byte)
//! 3. `range_bits` (1 byte)
//! 4. root seed (16 bytes, little endian)
//! 5. one 16 byte seed correction word per tree level, little endian
//! 6. party ID (1 byte, 0 or 1)
//! 7. left-branch control bit corrections, deepest level first, packed
//!    LSB-first into `ceil(v / 8)` bytes
//! 8. right-branch control bit corrections, same encoding
//! 9. the packed leaf correction values: bit-packed LSB-first when
//!    `range_bits` is not a multiple of 8, otherwise each value in
//!    `range_bits / 8` little endian bytes
//!
//! The blob length is fully determined by the two width bytes, so parsing
//! rejects any blob whose length does not match exactly.

use crate::bgi1::{CorrectionWord, Key, KEY_HEADER};
use crate::error::Error;
use utils::bits;
use utils::block::Block;

/// Size in bytes of a serialized key with the given parameters.
pub(crate) fn key_blob_size(range_bits: u32, v: u32, pack_count: usize) -> usize {
    let v = v as usize;
    3 + Block::BYTES + v * Block::BYTES + 1
        + 2 * bits::bits_to_bytes(v)
        + bits::bits_to_bytes(pack_count * range_bits as usize)
}

/// Write one control bit correction bitmap, deepest level first.
fn write_tcw(out: &mut Vec<u8>, cw: &[CorrectionWord], branch: usize) {
    let start = out.len();
    out.resize(start + bits::bits_to_bytes(cw.len()), 0);
    for (j, w) in cw.iter().rev().enumerate() {
        bits::write_bits(&mut out[start..], j, w.tcw[branch] as u64, 1);
    }
}

fn read_tcw(blob: &[u8], v: u32) -> Vec<bool> {
    let mut tcw = vec![false; v as usize];
    for j in 0..v as usize {
        tcw[v as usize - 1 - j] = bits::read_bits(blob, j, 1) != 0;
    }
    tcw
}

pub(crate) fn serialize_key(key: &Key) -> Vec<u8> {
    let v = key.cw.len() as u32;
    let mut out = Vec::with_capacity(key_blob_size(key.range_bits, v, key.cw_last.len()));
    out.push(KEY_HEADER);
    out.push(key.domain_bits as u8);
    out.push(key.range_bits as u8);
    out.extend_from_slice(&key.seed.to_le_bytes());
    for w in &key.cw {
        out.extend_from_slice(&w.scw.to_le_bytes());
    }
    out.push(key.party as u8);
    write_tcw(&mut out, &key.cw, 0);
    write_tcw(&mut out, &key.cw, 1);
    if key.range_bits % 8 != 0 {
        let start = out.len();
        out.resize(
            start + bits::bits_to_bytes(key.cw_last.len() * key.range_bits as usize),
            0,
        );
        for (i, &w) in key.cw_last.iter().enumerate() {
            bits::write_bits(
                &mut out[start..],
                i * key.range_bits as usize,
                w,
                key.range_bits,
            );
        }
    } else {
        let n = key.range_bits as usize / 8;
        for &w in &key.cw_last {
            out.extend_from_slice(&w.to_le_bytes()[..n]);
        }
    }
    out
}

/// Parse a blob whose header has already been matched against the scheme
/// parameters.  The caller passes the derived tree shape so the exact blob
/// length can be checked.
pub(crate) fn parse_key(
    domain_bits: u32,
    range_bits: u32,
    n_minus_v: u32,
    v: u32,
    blob: &[u8],
) -> Result<Key, Error> {
    let pack_count = 1usize << n_minus_v;
    if blob.len() != key_blob_size(range_bits, v, pack_count) {
        return Err(Error::MalformedKey);
    }
    let mut pos = 3;
    let mut take = |n: usize| {
        let bytes = &blob[pos..pos + n];
        pos += n;
        bytes
    };

    let mut seed_bytes = [0u8; Block::BYTES];
    seed_bytes.copy_from_slice(take(Block::BYTES));
    let seed = Block::from_le_bytes(seed_bytes);

    let mut scw = Vec::with_capacity(v as usize);
    for _ in 0..v {
        let mut bytes = [0u8; Block::BYTES];
        bytes.copy_from_slice(take(Block::BYTES));
        scw.push(Block::from_le_bytes(bytes));
    }

    let party = match take(1)[0] {
        0 => false,
        1 => true,
        _ => return Err(Error::MalformedKey),
    };

    let tcw_bytes = bits::bits_to_bytes(v as usize);
    let tcw_l = read_tcw(take(tcw_bytes), v);
    let tcw_r = read_tcw(take(tcw_bytes), v);

    let mut cw_last = vec![0u64; pack_count];
    if range_bits % 8 != 0 {
        let packed = take(bits::bits_to_bytes(pack_count * range_bits as usize));
        for (i, w) in cw_last.iter_mut().enumerate() {
            *w = bits::read_bits(packed, i * range_bits as usize, range_bits);
        }
    } else {
        let n = range_bits as usize / 8;
        for w in cw_last.iter_mut() {
            let mut x = 0u64;
            for (i, &b) in take(n).iter().enumerate() {
                x |= (b as u64) << (8 * i);
            }
            *w = x;
        }
    }

    let cw = scw
        .into_iter()
        .zip(tcw_l)
        .zip(tcw_r)
        .map(|((scw, l), r)| CorrectionWord { scw, tcw: [l, r] })
        .collect();

    Ok(Key {
        domain_bits,
        range_bits,
        party,
        seed,
        cw,
        cw_last,
    })
}

#[cfg(test)]
mod tests {
    use crate::bgi1::Bgi1;
    use crate::bgi1::Key;
    use crate::error::Error;
    use rand::thread_rng;
    use utils::block::Block;

    fn round_trip(domain_bits: u32, range_bits: u32) {
        let scheme = Bgi1::new(domain_bits, range_bits).unwrap();
        let (key0, key1) = scheme.gen_random(1, 1, &mut thread_rng()).unwrap();
        for key in [key0, key1] {
            let blob = key.serialize();
            assert_eq!(blob.len(), scheme.key_blob_size());
            assert_eq!(Key::parse(&blob).unwrap(), key);
            assert_eq!(scheme.parse_key(&blob).unwrap(), key);
        }
    }

    #[test]
    fn test_round_trip_bit_packed_range() {
        round_trip(9, 5);
        round_trip(10, 12);
        round_trip(7, 1);
    }

    #[test]
    fn test_round_trip_byte_aligned_range() {
        round_trip(8, 8);
        round_trip(16, 16);
        round_trip(6, 64);
    }

    #[test]
    fn test_round_trip_leaf_only_key() {
        round_trip(2, 64);
        round_trip(1, 8);
    }

    #[test]
    fn test_round_trip_preserves_evaluation() {
        let scheme = Bgi1::new(12, 9).unwrap();
        let (key0, _) = scheme.gen_random(345, 77, &mut thread_rng()).unwrap();
        let parsed = scheme.parse_key(&key0.serialize()).unwrap();
        for x in [0u64, 1, 344, 345, 346, 4095] {
            assert_eq!(scheme.eval(&parsed, x), scheme.eval(&key0, x));
        }
    }

    #[test]
    fn test_parse_rejects_bad_tag() {
        let scheme = Bgi1::new(8, 8).unwrap();
        let (key0, _) = scheme.gen_random(0, 1, &mut thread_rng()).unwrap();
        let mut blob = key0.serialize();
        blob[0] = 1;
        assert_eq!(Key::parse(&blob).unwrap_err(), Error::MalformedKey);
        assert_eq!(scheme.parse_key(&blob).unwrap_err(), Error::MalformedKey);
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        let scheme = Bgi1::new(8, 8).unwrap();
        let (key0, _) = scheme.gen_random(0, 1, &mut thread_rng()).unwrap();
        let blob = key0.serialize();
        assert_eq!(
            Key::parse(&blob[..blob.len() - 1]).unwrap_err(),
            Error::MalformedKey
        );
        let mut extended = blob.clone();
        extended.push(0);
        assert_eq!(Key::parse(&extended).unwrap_err(), Error::MalformedKey);
        assert_eq!(Key::parse(&[]).unwrap_err(), Error::MalformedKey);
    }

    #[test]
    fn test_parse_rejects_bad_party_byte() {
        let scheme = Bgi1::new(8, 8).unwrap();
        let (key0, _) = scheme.gen_random(0, 1, &mut thread_rng()).unwrap();
        let mut blob = key0.serialize();
        let party_pos = 3 + Block::BYTES * (1 + scheme.tree_depth() as usize);
        blob[party_pos] = 2;
        assert_eq!(Key::parse(&blob).unwrap_err(), Error::MalformedKey);
    }

    #[test]
    fn test_parse_rejects_invalid_header_widths() {
        assert_eq!(
            Key::parse(&[0, 0, 8]).unwrap_err(),
            Error::InvalidDomain
        );
        assert_eq!(
            Key::parse(&[0, 8, 0]).unwrap_err(),
            Error::InvalidRange
        );
        assert_eq!(
            Key::parse(&[0, 65, 8]).unwrap_err(),
            Error::UnsupportedDomainAndRange
        );
    }

    #[test]
    fn test_parse_rejects_mismatched_scheme() {
        let scheme = Bgi1::new(8, 8).unwrap();
        let (key0, _) = scheme.gen_random(0, 1, &mut thread_rng()).unwrap();
        let other = Bgi1::new(9, 8).unwrap();
        assert_eq!(
            other.parse_key(&key0.serialize()).unwrap_err(),
            Error::MalformedKey
        );
    }
}
