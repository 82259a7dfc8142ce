//! The owning container of schedules: stable handles, deferred removal, and the
//! reentrancy bookkeeping the [`crate::executor`] relies on (§3 Registry, §4.4, §5).

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::field::Field;
use crate::instant::Instant;
use crate::matcher;
use crate::parser::{self, ParseError};

/// A callback fired when its owning [`Schedule`] matches an instant. Collapses the C-style
/// `(user_data_opaque, trigger_instant_ptr)` pair from §6 into ordinary closure capture — the
/// idiomatic Rust way to carry "opaque user data" (see DESIGN.md).
pub type Callback = Box<dyn FnMut(Instant)>;

/// Operation-level failures from §7, beyond the grammar violations in [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A grammar violation while parsing schedule text.
    Parse(ParseError),
    /// An instant carried an out-of-range nanosecond component, or UTC decomposition failed.
    InvalidInstant,
    /// An offset outside `[-1440, 1440]` minutes.
    InvalidOffset,
    /// `Remove` was called with a handle that is not a member of this Registry.
    NotMember,
    /// The Registry has been destroyed (or has a destroy pending) and rejects the operation.
    Closed,
    /// `NextTrigger` found no match within its search horizon.
    HorizonExhausted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "schedule parse failure: {e}"),
            Self::InvalidInstant => write!(f, "invalid instant"),
            Self::InvalidOffset => write!(f, "utc offset must be within [-1440, 1440] minutes"),
            Self::NotMember => write!(f, "handle does not belong to this registry"),
            Self::Closed => write!(f, "registry has been destroyed"),
            Self::HorizonExhausted => write!(f, "no schedule matches within the search horizon"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

/// A stable reference to a [`Schedule`] owned by a [`Registry`]. Dereferences to the same
/// schedule until that schedule is destroyed; a generation counter detects stale handles
/// reused by later `Add` calls on the same slot (§3 Lifecycle, §9 Design Notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleHandle {
    index: usize,
    generation: u64,
}

/// One parsed, registered schedule: the seven [`Field`]s, its callback, and dedup/removal state.
pub(crate) struct Schedule {
    fields: [Field; 7],
    callback: RefCell<Option<Callback>>,
    last_fired: Cell<Option<Instant>>,
    tombstoned: Cell<bool>,
}

impl Schedule {
    fn matches(&self, cal: &matcher::Calendar) -> bool {
        matcher::matches(&self.fields, cal)
    }

    fn matches_except_nanosecond(&self, cal: &matcher::Calendar) -> bool {
        matcher::matches_except_nanosecond(&self.fields, cal)
    }
}

enum Slot {
    Occupied {
        generation: u64,
        schedule: Schedule,
    },
    Vacant {
        generation: u64,
        next_free: Option<usize>,
    },
}

struct Arena {
    slots: Vec<Slot>,
    free_head: Option<usize>,
    len: usize,
}

impl Arena {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    fn insert(&mut self, schedule: Schedule) -> ScheduleHandle {
        if let Some(index) = self.free_head {
            let generation = match self.slots.get(index) {
                Some(Slot::Vacant {
                    generation,
                    next_free,
                }) => {
                    self.free_head = *next_free;
                    *generation
                }
                // The free list only ever points at vacant slots; this arm is unreachable.
                _ => 0,
            };
            if let Some(slot) = self.slots.get_mut(index) {
                *slot = Slot::Occupied {
                    generation,
                    schedule,
                };
            }
            self.len += 1;
            return ScheduleHandle { index, generation };
        }
        let index = self.slots.len();
        self.slots.push(Slot::Occupied {
            generation: 0,
            schedule,
        });
        self.len += 1;
        ScheduleHandle {
            index,
            generation: 0,
        }
    }

    fn get(&self, handle: ScheduleHandle) -> Option<&Schedule> {
        match self.slots.get(handle.index) {
            Some(Slot::Occupied {
                generation,
                schedule,
            }) if *generation == handle.generation => Some(schedule),
            _ => None,
        }
    }

    /// Marks a schedule tombstoned or, if never visited, removes it immediately regardless of
    /// `execution_depth` (tombstoning only matters for schedules iteration may still see).
    fn tombstone(&mut self, handle: ScheduleHandle) -> bool {
        match self.slots.get(handle.index) {
            Some(Slot::Occupied {
                generation,
                schedule,
            }) if *generation == handle.generation => {
                schedule.tombstoned.set(true);
                true
            }
            _ => false,
        }
    }

    fn remove_now(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            let generation = match slot {
                Slot::Occupied { generation, .. } => *generation,
                Slot::Vacant { .. } => return,
            };
            *slot = Slot::Vacant {
                generation: generation.wrapping_add(1),
                next_free: self.free_head,
            };
            self.free_head = Some(index);
            self.len -= 1;
        }
    }

    /// Physically removes every tombstoned schedule; run once `execution_depth` hits zero.
    fn sweep(&mut self) {
        let indices: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Occupied { schedule, .. } if schedule.tombstoned.get() => Some(i),
                _ => None,
            })
            .collect();
        for index in indices {
            self.remove_now(index);
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
    }
}

/// The owning container of [`Schedule`]s plus the global state named in §3: the UTC offset,
/// execution depth (reentrancy nesting), and the deferred-destroy flag.
///
/// All operations take `&self`: interior mutability (`RefCell`/`Cell`) is what lets a callback
/// reentrantly call `Add`/`Remove`/`Destroy`/`Execute` against the very `Registry` reference it
/// was invoked through, per §5's reentrancy contract.
pub struct Registry {
    arena: RefCell<Arena>,
    execution_depth: Cell<u32>,
    destroy_pending: Cell<bool>,
    closed: Cell<bool>,
    utc_offset_minutes: Cell<i32>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty Registry: `execution_depth = 0`, `destroy_pending = false`,
    /// `utc_offset_minutes = 0` (§4.4 Create).
    #[must_use]
    pub fn new() -> Self {
        Self {
            arena: RefCell::new(Arena::new()),
            execution_depth: Cell::new(0),
            destroy_pending: Cell::new(false),
            closed: Cell::new(false),
            utc_offset_minutes: Cell::new(0),
        }
    }

    fn rejects_calls(&self) -> bool {
        self.closed.get() || self.destroy_pending.get()
    }

    /// Parses `text` and, on success, registers it with `callback` (§4.4 Add).
    ///
    /// # Errors
    /// [`Error::Closed`] if the Registry is destroyed or has a destroy pending;
    /// [`Error::Parse`] if `text` fails to parse. No partial Schedule is left behind either way.
    pub fn add<F>(&self, text: &str, callback: F) -> Result<ScheduleHandle, Error>
    where
        F: FnMut(Instant) + 'static,
    {
        if self.rejects_calls() {
            return Err(Error::Closed);
        }
        let fields = parser::parse_expression(text)?;
        let schedule = Schedule {
            fields,
            callback: RefCell::new(Some(Box::new(callback))),
            last_fired: Cell::new(None),
            tombstoned: Cell::new(false),
        };
        Ok(self.arena.borrow_mut().insert(schedule))
    }

    /// Removes `handle` from the Registry (§4.4 Remove).
    ///
    /// If `execution_depth > 0` the schedule is tombstoned and physically swept once the
    /// outermost [`crate::executor`] call unwinds; otherwise it is removed immediately.
    ///
    /// # Errors
    /// [`Error::Closed`] if the Registry rejects calls; [`Error::NotMember`] if `handle` is
    /// not presently a member.
    pub fn remove(&self, handle: ScheduleHandle) -> Result<(), Error> {
        if self.rejects_calls() {
            return Err(Error::Closed);
        }
        let mut arena = self.arena.borrow_mut();
        if arena.get(handle).is_none() {
            return Err(Error::NotMember);
        }
        if self.execution_depth.get() > 0 {
            arena.tombstone(handle);
        } else {
            arena.remove_now(handle.index);
        }
        Ok(())
    }

    /// Requests teardown (§4.4 Destroy). If `execution_depth > 0`, teardown is deferred until
    /// the outermost Executor invocation unwinds; otherwise every Schedule is released now.
    pub fn destroy(&self) {
        if self.closed.get() {
            return;
        }
        if self.execution_depth.get() > 0 {
            self.destroy_pending.set(true);
        } else {
            self.arena.borrow_mut().clear();
            self.closed.set(true);
        }
    }

    /// Sets the fixed UTC offset (in minutes) applied when breaking down instants for matching
    /// (§4.4 SetOffset). Schedules are not reparsed.
    ///
    /// # Errors
    /// [`Error::InvalidOffset`] if `minutes` is outside `[-1440, 1440]`;
    /// [`Error::Closed`] if the Registry rejects calls.
    pub fn set_offset(&self, minutes: i32) -> Result<(), Error> {
        if self.rejects_calls() {
            return Err(Error::Closed);
        }
        if minutes.abs() > 1440 {
            return Err(Error::InvalidOffset);
        }
        self.utc_offset_minutes.set(minutes);
        Ok(())
    }

    /// Returns the current UTC offset in minutes (0 if never configured).
    #[must_use]
    pub fn offset(&self) -> i32 {
        self.utc_offset_minutes.get()
    }

    /// Number of non-tombstoned schedules presently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.borrow().len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub(crate) fn enter(&self) {
        self.execution_depth.set(self.execution_depth.get() + 1);
    }

    /// Decrements `execution_depth`; at zero, sweeps tombstones and, if a destroy is pending,
    /// tears the Registry down (§4.5 step 7).
    pub(crate) fn leave(&self) {
        let depth = self.execution_depth.get().saturating_sub(1);
        self.execution_depth.set(depth);
        if depth == 0 {
            self.arena.borrow_mut().sweep();
            if self.destroy_pending.get() {
                self.arena.borrow_mut().clear();
                self.destroy_pending.set(false);
                self.closed.set(true);
            }
        }
    }

    pub(crate) fn destroy_pending(&self) -> bool {
        self.destroy_pending.get()
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.arena.borrow().slots.len()
    }

    /// Reads the live, non-tombstoned schedule at `index`, if any, and its match decision
    /// against `cal` plus the dedup decision against `now`. Does not fire the callback.
    pub(crate) fn visit(
        &self,
        index: usize,
        cal: &matcher::Calendar,
        now: Instant,
        full_match: bool,
    ) -> Option<VisitOutcome> {
        let arena = self.arena.borrow();
        let slot = arena.slots.get(index)?;
        let Slot::Occupied { schedule, .. } = slot else {
            return None;
        };
        if schedule.tombstoned.get() {
            return None;
        }
        let is_match = if full_match {
            schedule.matches(cal)
        } else {
            schedule.matches_except_nanosecond(cal)
        };
        if !is_match {
            return Some(VisitOutcome::NoMatch);
        }
        let should_fire = match schedule.last_fired.get() {
            None => true,
            Some(prev) => now > prev,
        };
        if should_fire {
            schedule.last_fired.set(Some(now));
            let taken = schedule.callback.borrow_mut().take();
            Some(VisitOutcome::Fire(taken))
        } else {
            Some(VisitOutcome::AlreadyFired)
        }
    }

    /// Returns the callback taken out by [`Registry::visit`] to its slot, if the slot is still
    /// the same generation (it always is, since physical removal is deferred during iteration).
    pub(crate) fn return_callback(&self, handle: ScheduleHandle, callback: Callback) {
        let arena = self.arena.borrow();
        if let Some(schedule) = arena.get(handle) {
            schedule.callback.borrow_mut().replace(callback);
        }
    }

    pub(crate) fn handle_at(&self, index: usize) -> Option<ScheduleHandle> {
        let arena = self.arena.borrow();
        match arena.slots.get(index) {
            Some(Slot::Occupied { generation, .. }) => Some(ScheduleHandle {
                index,
                generation: *generation,
            }),
            _ => None,
        }
    }

    /// Runs `f` with the live schedules' fields and handles, for use by `NextTrigger` — which
    /// never fires a callback, so it can hold one shared borrow for the whole scan.
    pub(crate) fn for_each_live<Fun: FnMut(ScheduleHandle, &[Field; 7])>(&self, mut f: Fun) {
        let arena = self.arena.borrow();
        for (index, slot) in arena.slots.iter().enumerate() {
            if let Slot::Occupied {
                generation,
                schedule,
            } = slot
            {
                if !schedule.tombstoned.get() {
                    f(
                        ScheduleHandle {
                            index,
                            generation: *generation,
                        },
                        &schedule.fields,
                    );
                }
            }
        }
    }
}

pub(crate) enum VisitOutcome {
    NoMatch,
    AlreadyFired,
    Fire(Option<Callback>),
}
