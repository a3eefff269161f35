use std::hint::black_box;
use std::time::{Duration, Instant};

/// Process-wide run parameters, fixed for one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Timed invocations per measurement (N >= 1).
    pub repetitions: u64,
    /// Hash edge length passed to every algorithm.
    pub hash_size: u32,
    /// Forwarded to `whash`.
    pub remove_max_haar_ll: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            repetitions: 20,
            hash_size: 8,
            remove_max_haar_ll: false,
        }
    }
}

/// Run `f` `iters` times back to back and return the total wall time.
///
/// Only the loop is timed. The first error aborts the loop and is returned
/// as-is; no partial timing is reported.
pub fn timed_call<T, E>(
    iters: u64,
    mut f: impl FnMut() -> Result<T, E>,
) -> Result<Duration, E> {
    let start = Instant::now();
    for _ in 0..iters {
        black_box(f()?);
    }
    Ok(start.elapsed())
}

/// Amortize a total over `iters` calls, rounded to the nearest nanosecond.
pub fn ns_per_call(total: Duration, iters: u64) -> u64 {
    let denom = u128::from(iters.max(1));
    let per_call = (total.as_nanos() + denom / 2) / denom;
    u64::try_from(per_call).unwrap_or(u64::MAX)
}
