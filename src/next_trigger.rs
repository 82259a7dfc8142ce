//! Forward search for the next instant at which any registered schedule matches (§4.6).

use crate::calendar::breakdown;
use crate::instant::{Instant, MAX_NANOS};
use crate::matcher::{self, Calendar};
use crate::registry::Registry;

/// Seconds in the bounded search horizon: 366 days, to always clear a leap year (§4.6).
pub const HORIZON_SECS: i64 = 366 * 86_400;

/// Finds the smallest [`Instant`] strictly greater than `after` at which some non-tombstoned
/// schedule in `reg` matches, searching at most [`HORIZON_SECS`] seconds forward.
///
/// Returns `None` if the horizon is exhausted or `after.secs` is already near [`i64::MAX`]
/// (the outer scan stops the instant `after.secs + sec_off` would overflow).
#[must_use]
pub fn next_trigger(reg: &Registry, after: Instant) -> Option<Instant> {
    if reg.is_closed() || reg.destroy_pending() {
        return None;
    }
    for sec_off in 0..HORIZON_SECS {
        let candidate_secs = after.secs.checked_add(sec_off)?;
        let cal = breakdown(candidate_secs, 0, reg.offset())?;

        let lo_ns = if sec_off > 0 {
            Some(0)
        } else if after.nanos < MAX_NANOS {
            Some(after.nanos + 1)
        } else {
            None
        };
        let Some(lo_ns) = lo_ns else {
            continue;
        };

        let best_ns = smallest_matching_nanosecond(reg, &cal, lo_ns);
        if let Some(ns) = best_ns {
            return Some(Instant::new_unchecked(candidate_secs, ns));
        }
    }
    None
}

/// Across every live schedule whose non-nanosecond fields match `cal`, the smallest nanosecond
/// in `[lo_ns, MAX_NANOS]` its nanosecond field accepts — the per-second inner search of §4.6.
fn smallest_matching_nanosecond(reg: &Registry, cal: &Calendar, lo_ns: u32) -> Option<u32> {
    let mut best: Option<u32> = None;
    reg.for_each_live(|_handle, fields| {
        if !matcher::matches_except_nanosecond(fields, cal) {
            return;
        }
        if let Some(ns) = fields[matcher::NANOSECOND].next_match(lo_ns, MAX_NANOS) {
            best = Some(match best {
                Some(current) => current.min(ns),
                None => ns,
            });
        }
    });
    best
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn every_second_schedule_advances_by_one_second() {
        let reg = Registry::new();
        reg.add("0 * * * * * *", |_| {}).unwrap();
        let after = Instant::new_unchecked(1_739_788_200, 0);
        let next = next_trigger(&reg, after).unwrap();
        assert_eq!(next, Instant::new_unchecked(1_739_788_201, 0));
    }

    #[test]
    fn weekday_business_hours_schedule() {
        let reg = Registry::new();
        reg.add("0 0 30 9 * * 1-5", |_| {}).unwrap();
        let after = Instant::new_unchecked(1_739_788_200, 0);
        let next = next_trigger(&reg, after).unwrap();
        assert_eq!(next, Instant::new_unchecked(1_739_871_000, 0));
    }

    #[test]
    fn sub_second_schedule_finds_the_midpoint_then_the_next_second() {
        let reg = Registry::new();
        reg.add("0,500000000 * * * * * *", |_| {}).unwrap();
        let after = Instant::new_unchecked(1_739_788_200, 0);
        let next = next_trigger(&reg, after).unwrap();
        assert_eq!(next, Instant::new_unchecked(1_739_788_200, 500_000_000));

        let next2 = next_trigger(&reg, next).unwrap();
        assert_eq!(next2, Instant::new_unchecked(1_739_788_201, 0));
    }

    #[test]
    fn strictness_holds_across_a_run_of_candidates() {
        let reg = Registry::new();
        reg.add("*/10 * * * * * *", |_| {}).unwrap();
        let mut after = Instant::new_unchecked(0, 0);
        for _ in 0..50 {
            let next = next_trigger(&reg, after).unwrap();
            assert!(next > after);
            after = next;
        }
    }

    #[test]
    fn empty_registry_exhausts_the_horizon() {
        let reg = Registry::new();
        assert_eq!(next_trigger(&reg, Instant::new_unchecked(0, 0)), None);
    }
}
