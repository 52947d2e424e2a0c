//! Search for the smallest deterministic value of one parameter.

/// Bounds of one parameter's search.
///
/// `lo` is the last value seen non-deterministic (or the lower bound), `hi`
/// the smallest value known deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeLimitRange {
    pub lo: u64,
    pub hi: u64,
    /// The very first candidate was already deterministic.
    pub pre_determined: bool,
}

/// Find the smallest value in `[probe_lo, probe_hi]`, within `probe_min`,
/// for which `is_deterministic` holds.
///
/// `probe_hi` must already be known deterministic. Candidates start at
/// `probe_lo` (or `probe_min` when `probe_lo` is zero) and double until
/// one is deterministic; the range is then halved until it is no wider
/// than `probe_min`.
pub fn find_limit<E>(
    probe_lo: u64,
    probe_hi: u64,
    probe_min: u64,
    mut is_deterministic: impl FnMut(u64) -> Result<bool, E>,
) -> Result<ProbeLimitRange, E> {
    let seed = if probe_lo == 0 { probe_min } else { probe_lo };
    if seed >= probe_hi {
        return Ok(ProbeLimitRange {
            lo: probe_lo,
            hi: probe_hi,
            pre_determined: false,
        });
    }
    if is_deterministic(seed)? {
        return Ok(ProbeLimitRange {
            lo: probe_lo,
            hi: seed,
            pre_determined: true,
        });
    }

    let mut range = ProbeLimitRange {
        lo: seed,
        hi: probe_hi,
        pre_determined: false,
    };
    let mut candidate = seed.saturating_mul(2);
    while candidate < probe_hi {
        if is_deterministic(candidate)? {
            range.hi = candidate;
            break;
        }
        range.lo = candidate;
        candidate = candidate.saturating_mul(2);
    }

    while range.hi - range.lo > probe_min {
        let mid = range.lo + (range.hi - range.lo) / 2;
        if is_deterministic(mid)? {
            range.hi = mid;
        } else {
            range.lo = mid;
        }
    }
    Ok(range)
}
