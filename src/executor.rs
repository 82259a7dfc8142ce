//! Walking the registry and firing matching callbacks, with reentrancy discipline (§4.5).

use crate::calendar::breakdown;
use crate::instant::Instant;
use crate::next_trigger::next_trigger;
use crate::registry::{Error, Registry, VisitOutcome};

/// Fires every matching, non-tombstoned schedule exactly once for this `now` (§4.5).
///
/// A silent no-op if `now` carries an out-of-range nanosecond component, if the Registry is
/// closed or has a destroy pending, or if UTC decomposition of `now` fails — Execute never
/// returns an error, by design (§7): it is meant to be called from timing loops where raising
/// would be more harmful than skipping a tick.
pub fn execute(reg: &Registry, now: Instant) {
    if !now.is_valid() || reg.is_closed() || reg.destroy_pending() {
        return;
    }
    let Some(cal) = breakdown(now.secs, now.nanos, reg.offset()) else {
        return;
    };

    reg.enter();

    // Iterate by index, re-reading `slot_count()` each step so schedules appended mid-iteration
    // (from a reentrant `Add` inside a callback) are visited if they land past the cursor —
    // the index-snapshot discipline described in §4.5 / §9 Design Notes.
    let mut index = 0;
    while index < reg.slot_count() {
        if reg.destroy_pending() {
            break;
        }
        match reg.visit(index, &cal, now, true) {
            Some(VisitOutcome::Fire(Some(mut callback))) => {
                let Some(handle) = reg.handle_at(index) else {
                    index += 1;
                    continue;
                };
                callback(now);
                reg.return_callback(handle, callback);
            }
            // `Fire(None)` means a schedule's callback is already checked out by an enclosing
            // `execute` frame on this same call stack (a reentrant `execute` call whose `now`
            // still makes this schedule due to fire again). Dedup state still advances — the
            // callback just doesn't run on this nested pass, since it's busy one frame up.
            Some(VisitOutcome::Fire(None) | VisitOutcome::NoMatch | VisitOutcome::AlreadyFired)
            | None => {}
        }
        index += 1;
    }

    reg.leave();
}

/// Fires every schedule that matches some instant in `(after, until]`, by repeatedly asking
/// [`next_trigger`] for the next match and replaying it (§4.5 ExecuteBetween, §8 property 7).
///
/// Returns `Ok(())` unless the Registry rejects calls outright; an empty or inverted range
/// (`until <= after`) is a success that fires nothing.
///
/// # Errors
/// [`Error::Closed`] if the Registry is closed.
pub fn execute_between(reg: &Registry, after: Instant, until: Instant) -> Result<(), Error> {
    if reg.is_closed() || reg.destroy_pending() {
        return Err(Error::Closed);
    }
    if until <= after {
        return Ok(());
    }

    reg.enter();
    let mut cursor = after;
    loop {
        if reg.destroy_pending() {
            break;
        }
        match next_trigger(reg, cursor) {
            Some(next) if next <= until => {
                execute(reg, next);
                cursor = next;
            }
            _ => break,
        }
    }
    reg.leave();
    Ok(())
}

/// Reads the host UTC clock and invokes [`execute`] with it (§6 TickConvenience).
///
/// Returns silently if the host clock cannot be read or overflows a valid [`Instant`] — a
/// policy choice documented in DESIGN.md's Open Questions, matching §9's note that propagating
/// this particular failure is not a correctness requirement.
#[cfg(feature = "std")]
pub fn tick(reg: &Registry) {
    let now = chrono::Utc::now();
    let secs = now.timestamp();
    let nanos = now.timestamp_subsec_nanos();
    if let Some(instant) = Instant::new(secs, nanos) {
        execute(reg, instant);
    }
}
