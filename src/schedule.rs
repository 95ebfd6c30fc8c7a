//! Scheduled values
//!
//! Timer-style behaviour driven by explicit instants: a value is scheduled to
//! become due after a delay, a newer schedule replaces (cancels) the pending
//! one, and callers poll with the current time.
//!
//! A UI event loop drives these from its tick, as the browsing session does
//! for debounced search and [`crate::notifications::Toasts`] for the toast slot.

use jiff::{SignedDuration, Timestamp};

/// Identifies one scheduling of a [`Deadline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleHandle(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    value: T,
    due: Timestamp,
    handle: ScheduleHandle,
}

/// A single pending value that becomes due at a deadline.
#[derive(Debug, Clone)]
pub struct Deadline<T> {
    pending: Option<Scheduled<T>>,
    next_handle: u64,
}

impl<T> Default for Deadline<T> {
    fn default() -> Self {
        Self {
            pending: None,
            next_handle: 0,
        }
    }
}

impl<T> Deadline<T> {
    /// Schedule `value` to become due `delay` after `now`, cancelling any pending value.
    pub fn schedule(&mut self, value: T, now: Timestamp, delay: SignedDuration) -> ScheduleHandle {
        let handle = ScheduleHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);

        let due = now.checked_add(delay).unwrap_or(Timestamp::MAX);

        self.pending = Some(Scheduled { value, due, handle });

        handle
    }

    /// Cancel whatever is pending.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|scheduled| scheduled.value)
    }

    /// Cancel the pending value only if it is still the one scheduled as `handle`.
    pub fn cancel_handle(&mut self, handle: ScheduleHandle) -> Option<T> {
        if self.pending.as_ref()?.handle == handle {
            return self.cancel();
        }

        None
    }

    /// Take the pending value if it is due at `now`.
    pub fn poll(&mut self, now: Timestamp) -> Option<T> {
        if self.pending.as_ref()?.due <= now {
            return self.cancel();
        }

        None
    }

    /// Whether a value is pending.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Borrow the pending value.
    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|scheduled| &scheduled.value)
    }

    /// Instant at which the pending value becomes due.
    pub fn due(&self) -> Option<Timestamp> {
        self.pending.as_ref().map(|scheduled| scheduled.due)
    }
}

/// An input whose value is applied only after a quiet period without changes.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    applied: T,
    pending: Deadline<T>,
    quiet: SignedDuration,
}

impl<T> Debounced<T> {
    /// Start with `initial` applied.
    pub fn new(initial: T, quiet: SignedDuration) -> Self {
        Self {
            applied: initial,
            pending: Deadline::default(),
            quiet,
        }
    }

    /// Record a new input at `now`, replacing any input not yet applied.
    pub fn input(&mut self, value: T, now: Timestamp) {
        self.pending.schedule(value, now, self.quiet);
    }

    /// Apply the pending input if its quiet period has elapsed. Returns `true` if applied.
    pub fn poll(&mut self, now: Timestamp) -> bool {
        match self.pending.poll(now) {
            Some(value) => {
                self.applied = value;
                true
            }
            None => false,
        }
    }

    /// Apply any pending input immediately. Returns `true` if applied.
    pub fn flush(&mut self) -> bool {
        match self.pending.cancel() {
            Some(value) => {
                self.applied = value;
                true
            }
            None => false,
        }
    }

    /// Replace the applied value and drop pending input.
    pub fn reset(&mut self, value: T) {
        self.pending.cancel();
        self.applied = value;
    }

    /// The currently applied value.
    pub fn applied(&self) -> &T {
        &self.applied
    }

    /// The latest input, pending or applied.
    pub fn latest(&self) -> &T {
        self.pending.peek().unwrap_or(&self.applied)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn at(secs: i64) -> Result<Timestamp, jiff::Error> {
        Timestamp::from_second(1_790_000_000 + secs)
    }

    #[test]
    fn value_becomes_due_after_delay() -> TestResult {
        let mut deadline = Deadline::default();

        deadline.schedule("clear", at(0)?, SignedDuration::from_secs(3));

        assert_eq!(deadline.poll(at(2)?), None);
        assert_eq!(deadline.poll(at(3)?), Some("clear"));
        assert!(!deadline.is_pending());

        Ok(())
    }

    #[test]
    fn newer_schedule_replaces_pending() -> TestResult {
        let mut deadline = Deadline::default();

        let first = deadline.schedule(1, at(0)?, SignedDuration::from_secs(3));
        deadline.schedule(2, at(2)?, SignedDuration::from_secs(3));

        assert_eq!(deadline.cancel_handle(first), None, "stale handle is ignored");
        assert_eq!(deadline.poll(at(3)?), None);
        assert_eq!(deadline.poll(at(5)?), Some(2));

        Ok(())
    }

    #[test]
    fn cancel_handle_cancels_current() -> TestResult {
        let mut deadline = Deadline::default();

        let handle = deadline.schedule(1, at(0)?, SignedDuration::from_secs(3));

        assert_eq!(deadline.cancel_handle(handle), Some(1));
        assert_eq!(deadline.poll(at(10)?), None);

        Ok(())
    }

    #[test]
    fn debounced_applies_only_last_input() -> TestResult {
        let quiet = SignedDuration::from_millis(300);
        let mut search = Debounced::new(String::new(), quiet);

        search.input("b".to_string(), at(0)?);
        search.input("bo".to_string(), at(0)?.checked_add(SignedDuration::from_millis(100))?);

        assert!(!search.poll(at(0)?.checked_add(SignedDuration::from_millis(350))?));
        assert_eq!(search.applied(), "");
        assert_eq!(search.latest(), "bo");

        assert!(search.poll(at(1)?));
        assert_eq!(search.applied(), "bo");

        Ok(())
    }

    #[test]
    fn debounced_flush_applies_immediately() -> TestResult {
        let mut search = Debounced::new(String::new(), SignedDuration::from_millis(300));

        search.input("jute".to_string(), at(0)?);

        assert!(search.flush());
        assert_eq!(search.applied(), "jute");
        assert!(!search.flush());

        Ok(())
    }
}
