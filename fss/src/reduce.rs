//! Multithreaded full-domain evaluation with batched reductions.
//!
//! Both entry points evaluate a batch of keys over the entire input domain
//! and reduce the shares on the fly, splitting the domain into one
//! contiguous range per worker thread.  Workers are spawned fresh per call
//! and all joined before returning, so the functions are self-contained and
//! deterministic: the same inputs produce the same outputs for every thread
//! count.

use crate::bgi1::{Bgi1, Key};
use crate::error::Error;
use std::thread;

/// Per-worker domain ranges as `(first input, length)` pairs.
///
/// At most `thread_count` ranges, contiguous and ascending, together
/// covering the domain exactly; lengths differ by at most one.
fn partition(domain_size: usize, thread_count: usize) -> Vec<(u64, usize)> {
    let num_threads = thread_count.min(domain_size);
    let step = domain_size / num_threads - 1;
    let slop = domain_size % num_threads;
    let mut ranges = Vec::with_capacity(num_threads);
    let mut x_first = 0u64;
    for i in 0..num_threads {
        let len = step + (i < slop) as usize + 1;
        ranges.push((x_first, len));
        x_first += len as u64;
    }
    ranges
}

fn validate(scheme: &Bgi1, keys: &[Key], thread_count: usize) -> Result<usize, Error> {
    if keys.is_empty() || thread_count == 0 {
        return Err(Error::InvalidArgument);
    }
    for key in keys {
        if key.domain_bits() != scheme.domain_bits() || key.range_bits() != scheme.range_bits()
        {
            return Err(Error::InvalidArgument);
        }
    }
    let count = 1u128 << scheme.domain_bits();
    if count > usize::MAX as u128 {
        return Err(Error::DomainOverflow);
    }
    Ok(count as usize)
}

/// Evaluate every key over the whole domain and accumulate the pointwise
/// sum of the shares into `out`, modulo `2^range_bits`.
///
/// The shares are added onto `out`'s existing contents, so results can be
/// aggregated across calls; zero `out` first for a plain sum.  `out` must
/// hold exactly `2^domain_bits` elements.  Evaluation uses up to
/// `thread_count` worker threads, each owning a contiguous slice of `out`.
pub fn eval_all_sum(
    scheme: &Bgi1,
    keys: &[Key],
    thread_count: usize,
    out: &mut [u64],
) -> Result<(), Error> {
    let domain_size = validate(scheme, keys, thread_count)?;
    if out.len() != domain_size {
        return Err(Error::InvalidArgument);
    }
    let ranges = partition(domain_size, thread_count);
    let mask = scheme.range_mask();
    let failed = thread::scope(|s| {
        let mut handles = Vec::with_capacity(ranges.len());
        let mut rest: &mut [u64] = out;
        for &(x_first, len) in &ranges {
            let (chunk, tail) = rest.split_at_mut(len);
            rest = tail;
            handles.push(s.spawn(move || {
                let x_last = x_first + (len as u64 - 1);
                for key in keys {
                    let mut i = 0;
                    scheme.eval_range(key, x_first, x_last, &mut |y| {
                        chunk[i] = chunk[i].wrapping_add(y);
                        i += 1;
                    });
                }
                for y in chunk.iter_mut() {
                    *y &= mask;
                }
            }));
        }
        handles
            .into_iter()
            .map(|h| h.join().is_err())
            .collect::<Vec<_>>()
    });
    if failed.into_iter().any(|f| f) {
        return Err(Error::UnknownError);
    }
    Ok(())
}

/// Evaluate every key over the whole domain and return, per key, the dot
/// product of its shares with `weights`, modulo `2^range_bits`.
///
/// `weights` must hold exactly `2^domain_bits` elements.  Workers
/// accumulate wrapping partial sums over their ranges; the partials are
/// combined sequentially in range order and masked at the end, so the
/// result does not depend on `thread_count`.
pub fn eval_all_dot(
    scheme: &Bgi1,
    keys: &[Key],
    weights: &[u64],
    thread_count: usize,
) -> Result<Vec<u64>, Error> {
    let domain_size = validate(scheme, keys, thread_count)?;
    if weights.len() != domain_size {
        return Err(Error::InvalidArgument);
    }
    let ranges = partition(domain_size, thread_count);
    let results = thread::scope(|s| {
        let handles: Vec<_> = ranges
            .iter()
            .map(|&(x_first, len)| {
                let weights = &weights[x_first as usize..x_first as usize + len];
                s.spawn(move || {
                    let x_last = x_first + (len as u64 - 1);
                    keys.iter()
                        .map(|key| {
                            let mut acc = 0u64;
                            let mut i = 0;
                            scheme.eval_range(key, x_first, x_last, &mut |y| {
                                acc = acc.wrapping_add(y.wrapping_mul(weights[i]));
                                i += 1;
                            });
                            acc
                        })
                        .collect::<Vec<u64>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join())
            .collect::<Vec<_>>()
    });
    let mut out = vec![0u64; keys.len()];
    for result in results {
        let partial = result.map_err(|_| Error::UnknownError)?;
        for (o, &x) in out.iter_mut().zip(&partial) {
            *o = o.wrapping_add(x);
        }
    }
    for o in out.iter_mut() {
        *o &= scheme.range_mask();
    }
    Ok(out)
}
