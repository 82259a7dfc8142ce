//! A cron-style scheduler core with nanosecond-precision matching.
//!
//! Given a set of registered schedule expressions, each bound to a callback, this crate
//! decides — for any caller-supplied [`Instant`] — which schedules fire, and can compute the
//! next instant at or after a reference time at which any registered schedule would match.
//!
//! Three pieces, leaves first:
//! - [`field`] / [`parser`]: a 7-field textual grammar (`nanosecond second minute hour
//!   day-of-month month day-of-week`) parsed into [`field::Field`]s.
//! - [`matcher`]: tests a broken-down instant against a schedule's fields, applying the
//!   vixie-cron day-of-month/day-of-week disjunction rule.
//! - [`registry::Registry`] + [`executor`] + [`next_trigger`]: owns schedules, fires callbacks
//!   exactly once per distinct matching instant, and searches forward for the next match.
//!
//! Wall-clock acquisition, timer/sleep loops, logging, and timezone-database lookups are the
//! caller's responsibility; this crate accepts instants and a fixed UTC offset explicitly.
//!
//! ```
//! use vixie_sched::{Instant, Registry};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let reg = Registry::new();
//! let fired = Rc::new(Cell::new(0u32));
//! let counter = fired.clone();
//! reg.add("0 * * * * * *", move |_now| counter.set(counter.get() + 1)).unwrap();
//!
//! let now = Instant::new_unchecked(1_739_788_200, 0);
//! reg.execute(now);
//! reg.execute(now); // same instant: still exactly one firing (§8 Determinism)
//! assert_eq!(fired.get(), 1);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod calendar;
pub mod field;
pub mod matcher;
pub mod next_trigger;
pub mod parser;

mod executor;
mod instant;
mod registry;

pub use field::{Atom, Field};
pub use instant::{Instant, MAX_NANOS};
pub use matcher::Calendar;
pub use parser::{ParseError, FIELD_BOUNDS, FIELD_COUNT, MAX_EXPRESSION_LEN};
pub use registry::{Callback, Error, Registry, ScheduleHandle};

impl Registry {
    /// Fires every matching, non-tombstoned schedule exactly once for `now` (§4.5).
    pub fn execute(&self, now: Instant) {
        executor::execute(self, now);
    }

    /// Fires every schedule matching some instant in `(after, until]` (§4.5 ExecuteBetween).
    ///
    /// # Errors
    /// [`Error::Closed`] if the Registry has been destroyed.
    pub fn execute_between(&self, after: Instant, until: Instant) -> Result<(), Error> {
        executor::execute_between(self, after, until)
    }

    /// Finds the smallest instant strictly after `after` at which any schedule matches
    /// (§4.6), or `None` if the 366-day search horizon is exhausted.
    #[must_use]
    pub fn next_trigger(&self, after: Instant) -> Option<Instant> {
        next_trigger::next_trigger(self, after)
    }

    /// Reads the host UTC clock and invokes [`Registry::execute`] with it (§6 TickConvenience).
    #[cfg(feature = "std")]
    pub fn tick(&self) {
        executor::tick(self);
    }
}
