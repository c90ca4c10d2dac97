//! Single-value slot where the most recently started operation wins.

use tracing::debug;

/// Proof that an operation was started against a [`Slot`]. Consumed on publish.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct Ticket(u64);

#[derive(Debug)]
pub struct Slot<T> {
    issued: u64,
    value: Option<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            issued: 0,
            value: None,
        }
    }
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an operation. Any ticket handed out earlier becomes stale.
    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Whether `ticket` belongs to the newest operation and nothing was written since.
    pub const fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Store the result of the operation behind `ticket`, unless a newer one has
    /// started (or the slot was written directly) since. Returns whether it was stored.
    pub fn publish(&mut self, ticket: Ticket, value: T) -> bool {
        if !self.is_current(&ticket) {
            debug!(ticket = ticket.0, current = self.issued, "Dropping superseded result");
            return false;
        }
        self.value = Some(value);
        true
    }

    /// Store `value` right away, superseding anything in flight.
    pub fn replace(&mut self, value: T) -> Option<T> {
        self.issued += 1;
        self.value.replace(value)
    }

    /// Empty the slot, superseding anything in flight.
    pub fn clear(&mut self) -> Option<T> {
        self.issued += 1;
        self.value.take()
    }

    pub const fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }
}
