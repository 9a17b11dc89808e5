//! Listener sets keyed by opaque handles
//!
//! Registration hands back a [`ListenerId`]; removal goes through that id
//! instead of comparing closures. Listeners run in registration order.

use std::fmt;

use uuid::Uuid;

/// Handle returned when a listener is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered set of boxed callbacks, e.g. `Listeners<dyn FnMut(&str) + Send>`
pub struct Listeners<F: ?Sized> {
    entries: Vec<(ListenerId, Box<F>)>,
}

impl<F: ?Sized> Default for Listeners<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Listeners<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<F: ?Sized> Listeners<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Box<F>) -> ListenerId {
        let id = ListenerId::new();
        self.entries.push((id, listener));
        id
    }

    /// Returns false if the id was never registered or is already gone.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut F> + '_ {
        self.entries.iter_mut().map(|(_, listener)| listener.as_mut())
    }

    /// Move every listener of `other` to the end of this set.
    pub fn append(&mut self, mut other: Self) {
        self.entries.append(&mut other.entries);
    }
}
