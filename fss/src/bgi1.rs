//! The two-party distributed point function of Boyle, Gilboa, and Ishai
//! ([ePrint 2018/707, Figure 1](https://eprint.iacr.org/2018/707)).
//!
//! The secret point `alpha` defines a path through a binary tree of
//! pseudorandom 128 bit seeds.  Both parties expand the tree from
//! independent root seeds; one public correction word per level makes their
//! expansions collide everywhere off the `alpha` path, so that their leaf
//! values cancel on every input except `alpha`, where they differ by `beta`.
//!
//! The tree is cut short by range packing: the last `n_minus_v` input bits
//! select one of `2^n_minus_v` range values packed into a single expanded
//! leaf, which divides the tree depth work per output accordingly.

use crate::codec;
use crate::error::Error;
use rand::Rng;
use utils::bits;
use utils::block::Block;
use utils::buffered_rng::BufferedRng;
use utils::fixed_key_aes::FixedKeyAes;

/// Scheme tag stored in the first byte of every key blob.
pub(crate) const KEY_HEADER: u8 = 0;

/// Number of bits one packed leaf expansion provides: the leaf seed is
/// expanded through both PRG branches into two blocks.
const CW_LAST_BITS: u32 = 2 * Block::BITS;

/// Largest width the wire format can record in its one-byte header fields.
const WIRE_MAX_BITS: u32 = 255;

/// Largest width supported by this implementation's `u64` domain and range
/// values.
const SUPPORTED_MAX_BITS: u32 = 64;

/// Per-level public correction data.
///
/// Produced once during key generation and stored identically in both
/// parties' keys; only the root seeds and the final packed values differ per
/// party.  `scw` always has its MSB cleared: the control bit correction is
/// carried separately in `tcw`, one bit per branch direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct CorrectionWord {
    pub(crate) scw: Block,
    pub(crate) tcw: [bool; 2],
}

/// One party's DPF key.
///
/// Only meaningful together with the sibling key produced by the same `gen`
/// call.  Immutable after generation; each party holds an independent copy
/// of the shared correction data.
#[derive(Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Key {
    pub(crate) domain_bits: u32,
    pub(crate) range_bits: u32,
    pub(crate) party: bool,
    pub(crate) seed: Block,
    pub(crate) cw: Vec<CorrectionWord>,
    pub(crate) cw_last: Vec<u64>,
}

impl Key {
    /// Number of domain bits the key was generated for.
    pub fn domain_bits(&self) -> u32 {
        self.domain_bits
    }

    /// Number of range bits the key was generated for.
    pub fn range_bits(&self) -> u32 {
        self.range_bits
    }

    /// The party ID, 0 or 1, corresponding to this key.
    pub fn party(&self) -> usize {
        self.party as usize
    }

    /// Serialize the key into the wire format.
    pub fn serialize(&self) -> Vec<u8> {
        codec::serialize_key(self)
    }

    /// Parse a key blob, taking the scheme parameters from its header.
    ///
    /// Fails with [`Error::MalformedKey`] on any header or length violation,
    /// or with a parameter error if the recorded widths are invalid.
    pub fn parse(blob: &[u8]) -> Result<Self, Error> {
        if blob.len() < 3 {
            return Err(Error::MalformedKey);
        }
        if blob[0] != KEY_HEADER {
            return Err(Error::MalformedKey);
        }
        let domain_bits = blob[1] as u32;
        let range_bits = blob[2] as u32;
        validate_params(domain_bits, range_bits)?;
        let (n_minus_v, v) = derive_packing(domain_bits, range_bits);
        codec::parse_key(domain_bits, range_bits, n_minus_v, v, blob)
    }
}

/// Reusable scratch state for resumed tree descents during full-domain
/// evaluation: the `(seed, control bit)` pair computed at every tree level
/// of the most recent path.
///
/// Owned by the evaluator, never stored in a key.  Cached levels are only
/// valid for inputs sharing the corresponding path prefix; [`Bgi1::eval_all`]
/// tracks the deepest level that may be reused when stepping through the
/// domain.
#[derive(Clone, Debug)]
pub struct PackEvalCache {
    pub(crate) levels: Vec<(Block, bool)>,
}

/// A runtime-parameterized instance of the BGI1 scheme.
///
/// All operations validate their parameters eagerly and run to completion
/// once validation has passed.  Evaluation takes branches depending only on
/// the public input and the evaluating party's own key, so keys can be
/// evaluated independently and in parallel without leaking the secret point
/// through timing.
#[derive(Clone, Debug)]
pub struct Bgi1 {
    domain_bits: u32,
    range_bits: u32,
    /// Number of low input bits resolved inside a packed leaf.
    n_minus_v: u32,
    /// Depth of the GGM tree, `domain_bits - n_minus_v`.
    v: u32,
    /// `2^n_minus_v`, the number of range values per packed leaf.
    pack_count: usize,
    pack_mask: u64,
    range_mask: u64,
    prg: FixedKeyAes,
}

pub(crate) fn validate_params(domain_bits: u32, range_bits: u32) -> Result<(), Error> {
    if domain_bits < 1 || domain_bits > WIRE_MAX_BITS {
        return Err(Error::InvalidDomain);
    }
    if range_bits < 1 || range_bits > WIRE_MAX_BITS {
        return Err(Error::InvalidRange);
    }
    if domain_bits > SUPPORTED_MAX_BITS || range_bits > SUPPORTED_MAX_BITS {
        return Err(Error::UnsupportedDomainAndRange);
    }
    Ok(())
}

/// Split `domain_bits` into the packed leaf width `n_minus_v` and the tree
/// depth `v`.  `2^n_minus_v` is the number of range values that fit into one
/// leaf expansion, rounded down to a power of two and clamped to the domain.
pub(crate) fn derive_packing(domain_bits: u32, range_bits: u32) -> (u32, u32) {
    let n_minus_v = domain_bits.min((CW_LAST_BITS / range_bits).ilog2());
    (n_minus_v, domain_bits - n_minus_v)
}

fn fits(x: u64, bits: u32) -> bool {
    bits >= 64 || x >> bits == 0
}

impl Bgi1 {
    /// Create a scheme instance for the given parameter widths.
    pub fn new(domain_bits: u32, range_bits: u32) -> Result<Self, Error> {
        validate_params(domain_bits, range_bits)?;
        let (n_minus_v, v) = derive_packing(domain_bits, range_bits);
        Ok(Self {
            domain_bits,
            range_bits,
            n_minus_v,
            v,
            pack_count: 1 << n_minus_v,
            pack_mask: bits::low_mask(n_minus_v),
            range_mask: bits::low_mask(range_bits),
            prg: FixedKeyAes::with_fixed_key(),
        })
    }

    /// Number of domain bits.
    pub fn domain_bits(&self) -> u32 {
        self.domain_bits
    }

    /// Number of range bits.
    pub fn range_bits(&self) -> u32 {
        self.range_bits
    }

    /// Depth of the GGM tree.
    pub fn tree_depth(&self) -> u32 {
        self.v
    }

    /// Number of range values emitted per packed leaf.
    pub fn pack_count(&self) -> usize {
        self.pack_count
    }

    pub(crate) fn range_mask(&self) -> u64 {
        self.range_mask
    }

    /// Number of random bytes `gen` consumes: one root seed block per party.
    pub fn rand_buf_size(&self) -> usize {
        2 * Block::BYTES
    }

    /// Size of a serialized key in bytes.
    pub fn key_blob_size(&self) -> usize {
        codec::key_blob_size(self.range_bits, self.v, self.pack_count)
    }

    /// Serialize a key generated by this scheme instance.
    pub fn serialize_key(&self, key: &Key) -> Result<Vec<u8>, Error> {
        self.check_key(key)?;
        Ok(codec::serialize_key(key))
    }

    /// Parse a key blob, verifying that its header matches this scheme
    /// instance's parameters.
    pub fn parse_key(&self, blob: &[u8]) -> Result<Key, Error> {
        if blob.len() < 3 || blob[0] != KEY_HEADER {
            return Err(Error::MalformedKey);
        }
        if blob[1] as u32 != self.domain_bits || blob[2] as u32 != self.range_bits {
            return Err(Error::MalformedKey);
        }
        codec::parse_key(self.domain_bits, self.range_bits, self.n_minus_v, self.v, blob)
    }

    fn prg_l(&self, s: Block) -> Block {
        self.prg.hash_cr(s.with_msb(false))
    }

    fn prg_r(&self, s: Block) -> Block {
        self.prg.hash_cr(s.with_msb(false).flip_msb())
    }

    /// Expand a leaf seed through both PRG branches into the packed range
    /// value bytes.
    fn expand_leaf(&self, s: Block) -> [u8; 2 * Block::BYTES] {
        let mut bytes = [0u8; 2 * Block::BYTES];
        bytes[..Block::BYTES].copy_from_slice(&self.prg_l(s).to_le_bytes());
        bytes[Block::BYTES..].copy_from_slice(&self.prg_r(s).to_le_bytes());
        bytes
    }

    /// Extract the `index`'th `range_bits`-wide value from a leaf expansion.
    fn convert(&self, leaf: &[u8; 2 * Block::BYTES], index: usize) -> u64 {
        debug_assert!(index < self.pack_count);
        if self.range_bits % 8 != 0 {
            bits::read_bits(leaf, index * self.range_bits as usize, self.range_bits)
        } else {
            let n = self.range_bits as usize / 8;
            let mut x = 0u64;
            for (i, &b) in leaf[index * n..(index + 1) * n].iter().enumerate() {
                x |= (b as u64) << (8 * i);
            }
            x
        }
    }

    fn check_key(&self, key: &Key) -> Result<(), Error> {
        if key.domain_bits != self.domain_bits || key.range_bits != self.range_bits {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    /// Generate a key pair for the point function `f(alpha) = beta`.
    ///
    /// `rand_buf` must hold exactly [`Self::rand_buf_size`] bytes; it is
    /// consumed in a fixed order (party 0's root seed, then party 1's), so
    /// byte-identical buffers yield byte-identical keys.
    pub fn gen(&self, alpha: u64, beta: u64, rand_buf: &[u8]) -> Result<(Key, Key), Error> {
        if !fits(alpha, self.domain_bits) {
            return Err(Error::DomainOverflow);
        }
        if !fits(beta, self.range_bits) {
            return Err(Error::RangeOverflow);
        }
        if rand_buf.len() != self.rand_buf_size() {
            return Err(Error::InvalidArgument);
        }
        let mut rng = BufferedRng::new(rand_buf);
        let root = [
            rng.next_block().with_msb(false),
            rng.next_block().with_msb(false),
        ];

        let mut seed = root;
        let mut t = [false, true];
        let mut cw = Vec::with_capacity(self.v as usize);
        for i in 0..self.v {
            let children0 = [self.prg_l(seed[0]), self.prg_r(seed[0])];
            let children1 = [self.prg_l(seed[1]), self.prg_r(seed[1])];
            let t0 = [children0[0].msb(), children0[1].msb()];
            let t1 = [children1[0].msb(), children1[1].msb()];
            let s0 = [children0[0].with_msb(false), children0[1].with_msb(false)];
            let s1 = [children1[0].with_msb(false), children1[1].with_msb(false)];

            let alpha_i = bits::get_bit(alpha, self.domain_bits - 1 - i);
            let keep = alpha_i as usize;
            let lose = keep ^ 1;
            let scw = s0[lose] ^ s1[lose];
            let tcw = [t0[0] ^ t1[0] ^ alpha_i ^ true, t0[1] ^ t1[1] ^ alpha_i];
            cw.push(CorrectionWord { scw, tcw });

            // Note that although t[0] and t[1] are opposites in the first
            // iteration, they are not necessarily opposites later on.
            seed[0] = if t[0] { s0[keep] ^ scw } else { s0[keep] };
            seed[1] = if t[1] { s1[keep] ^ scw } else { s1[keep] };
            t[0] = t0[keep] ^ (t[0] & tcw[keep]);
            t[1] = t1[keep] ^ (t[1] & tcw[keep]);
        }

        // The remaining low bits of alpha select the slot inside the packed
        // leaf that must reconstruct to beta.
        let alpha_slot = (alpha & self.pack_mask) as usize;
        let leaf0 = self.expand_leaf(seed[0]);
        let leaf1 = self.expand_leaf(seed[1]);
        let mut cw_last = vec![0u64; self.pack_count];
        for (i, w) in cw_last.iter_mut().enumerate() {
            let target = if i == alpha_slot { beta } else { 0 };
            let mut value = target
                .wrapping_sub(self.convert(&leaf0, i))
                .wrapping_add(self.convert(&leaf1, i));
            if t[1] {
                value = value.wrapping_neg();
            }
            *w = value & self.range_mask;
        }

        let key0 = Key {
            domain_bits: self.domain_bits,
            range_bits: self.range_bits,
            party: false,
            seed: root[0],
            cw: cw.clone(),
            cw_last: cw_last.clone(),
        };
        let key1 = Key {
            domain_bits: self.domain_bits,
            range_bits: self.range_bits,
            party: true,
            seed: root[1],
            cw,
            cw_last,
        };
        Ok((key0, key1))
    }

    /// Generate a key pair with randomness drawn from `rng`.
    pub fn gen_random<R: Rng>(&self, alpha: u64, beta: u64, rng: &mut R) -> Result<(Key, Key), Error> {
        let mut rand_buf = vec![0u8; self.rand_buf_size()];
        rng.fill_bytes(&mut rand_buf);
        self.gen(alpha, beta, &rand_buf)
    }

    /// Evaluate a key at a single input, producing this party's additive
    /// share of `f(x)` modulo `2^range_bits`.
    pub fn eval(&self, key: &Key, x: u64) -> Result<u64, Error> {
        self.check_key(key)?;
        if !fits(x, self.domain_bits) {
            return Err(Error::DomainOverflow);
        }
        Ok(self.eval_inner(key, x))
    }

    fn eval_inner(&self, key: &Key, x: u64) -> u64 {
        let mut s = key.seed;
        let mut t = key.party;
        for i in 0..self.v {
            let x_i = bits::get_bit(x, self.domain_bits - 1 - i);
            (s, t) = self.step(&key.cw[i as usize], s, t, x_i);
        }
        self.finish(key, s, t, (x & self.pack_mask) as usize)
    }

    /// One tree level of the descent: expand towards the `x_i` child and
    /// apply the level's correction when the control bit is set.
    fn step(&self, cw: &CorrectionWord, s: Block, t: bool, x_i: bool) -> (Block, bool) {
        let mut child = if x_i { self.prg_r(s) } else { self.prg_l(s) };
        if t {
            child ^= cw.scw.with_msb(cw.tcw[x_i as usize]);
        }
        (child.with_msb(false), child.msb())
    }

    /// Leaf step shared by point and packed evaluation.
    fn finish(&self, key: &Key, s: Block, t: bool, slot: usize) -> u64 {
        let leaf = self.expand_leaf(s);
        let mut y = self.convert(&leaf, slot);
        if t {
            y = y.wrapping_add(key.cw_last[slot]);
        }
        if key.party {
            y = y.wrapping_neg();
        }
        y & self.range_mask
    }

    /// Create a scratch cache for [`Self::pack_eval`].
    pub fn make_pack_eval_cache(&self) -> PackEvalCache {
        PackEvalCache {
            levels: vec![(Block::default(), false); self.v as usize],
        }
    }

    /// Evaluate all `pack_count` outputs of the packed leaf containing `x`.
    ///
    /// The descent resumes from `start_level`, reusing the cache entries
    /// below it; those entries must stem from a previous `pack_eval` with
    /// this key on an input that agrees with `x` on the corresponding path
    /// prefix.  Pass `start_level = 0` for a fresh input (this ignores the
    /// cache contents entirely).  `out` must hold exactly `pack_count`
    /// elements; the output covers the aligned input range
    /// `x & !pack_mask ..= x | pack_mask` and equals single-point
    /// evaluation on each of those inputs.
    pub fn pack_eval(
        &self,
        key: &Key,
        x: u64,
        cache: &mut PackEvalCache,
        start_level: u32,
        out: &mut [u64],
    ) -> Result<(), Error> {
        self.check_key(key)?;
        if !fits(x, self.domain_bits) {
            return Err(Error::DomainOverflow);
        }
        if cache.levels.len() != self.v as usize || start_level > self.v {
            return Err(Error::InvalidArgument);
        }
        if out.len() != self.pack_count {
            return Err(Error::InvalidArgument);
        }
        let mut i = 0;
        self.pack_eval_inner(key, x, cache, start_level, &mut |y| {
            out[i] = y;
            i += 1;
        });
        Ok(())
    }

    fn pack_eval_inner(
        &self,
        key: &Key,
        x: u64,
        cache: &mut PackEvalCache,
        b: u32,
        emit: &mut impl FnMut(u64),
    ) {
        let (mut s, mut t) = if b == 0 {
            (key.seed, key.party)
        } else {
            cache.levels[b as usize - 1]
        };
        for i in b..self.v {
            let x_i = bits::get_bit(x, self.domain_bits - 1 - i);
            (s, t) = self.step(&key.cw[i as usize], s, t, x_i);
            cache.levels[i as usize] = (s, t);
        }
        let leaf = self.expand_leaf(s);
        for i in 0..self.pack_count {
            let mut y = self.convert(&leaf, i);
            if t {
                y = y.wrapping_add(key.cw_last[i]);
            }
            if key.party {
                y = y.wrapping_neg();
            }
            emit(y & self.range_mask);
        }
    }

    /// Evaluate a key on the inclusive input range `[x_first, x_last]`,
    /// calling `emit` once per input in ascending order.
    ///
    /// Inputs aligned to a packed leaf are evaluated in one descent per
    /// leaf, and the descent resumes at the deepest tree level whose path
    /// prefix is shared with the previous leaf.
    pub(crate) fn eval_range(
        &self,
        key: &Key,
        x_first: u64,
        x_last: u64,
        emit: &mut impl FnMut(u64),
    ) {
        debug_assert!(x_first <= x_last);
        let mut cache = self.make_pack_eval_cache();
        let mut b = 0u32;
        let mut x = x_first;
        loop {
            if x & self.pack_mask == 0 && x_last - x >= self.pack_mask {
                self.pack_eval_inner(key, x, &mut cache, b, emit);
                let x_prev = x;
                x |= self.pack_mask;
                if x == x_last {
                    break;
                }
                x = x.wrapping_add(1);
                b = self.v - 1 - ((x_prev ^ x) >> self.n_minus_v).ilog2();
            } else {
                emit(self.eval_inner(key, x));
                if x == x_last {
                    break;
                }
                x = x.wrapping_add(1);
                b = 0;
            }
        }
    }

    /// Evaluate a key on the whole domain, writing `eval(key, x)` to
    /// `out[x]` for every `x`.  `out` must hold exactly `2^domain_bits`
    /// elements.
    pub fn eval_all(&self, key: &Key, out: &mut [u64]) -> Result<(), Error> {
        self.eval_all_under_prefix(key, 0, 0, out)
    }

    /// Evaluate a key on all inputs whose top `prefix_bits` bits equal
    /// `prefix`, in ascending order of the remaining low bits.  `out` must
    /// hold exactly `2^(domain_bits - prefix_bits)` elements.
    pub fn eval_all_under_prefix(
        &self,
        key: &Key,
        prefix: u64,
        prefix_bits: u32,
        out: &mut [u64],
    ) -> Result<(), Error> {
        self.check_key(key)?;
        if prefix_bits > self.domain_bits {
            return Err(Error::DomainOverflow);
        }
        if !fits(prefix, prefix_bits) {
            return Err(Error::DomainOverflow);
        }
        let suffix_bits = self.domain_bits - prefix_bits;
        let count = 1u128 << suffix_bits;
        if count > usize::MAX as u128 {
            return Err(Error::DomainOverflow);
        }
        if out.len() as u128 != count {
            return Err(Error::InvalidArgument);
        }
        let x_first = if prefix_bits == 0 {
            0
        } else {
            prefix << suffix_bits
        };
        let x_last = x_first | bits::low_mask::<u64>(suffix_bits);
        let mut i = 0;
        self.eval_range(key, x_first, x_last, &mut |y| {
            out[i] = y;
            i += 1;
        });
        Ok(())
    }
}
