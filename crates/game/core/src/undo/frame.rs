//! One revertible unit of an undo transaction.

use std::rc::Rc;

use super::{Capturable, Snapshot};

struct Entry {
    object: Rc<dyn Capturable>,
    snapshot: Snapshot,
}

/// Ordered mapping from registered objects to the snapshot they held before
/// their first mutation inside the frame.
///
/// Objects are keyed by identity (`Rc::ptr_eq`), and insertion order is kept
/// so restore passes run deterministically.
#[derive(Default)]
pub struct Frame {
    entries: Vec<Entry>,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if `object` already has a snapshot in this frame.
    pub fn contains(&self, object: &Rc<dyn Capturable>) -> bool {
        self.entries
            .iter()
            .any(|entry| Rc::ptr_eq(&entry.object, object))
    }

    /// Stores a snapshot unless the object is already present (first write wins).
    ///
    /// Returns whether the snapshot was stored.
    pub(crate) fn insert(&mut self, object: Rc<dyn Capturable>, snapshot: Snapshot) -> bool {
        if self.contains(&object) {
            return false;
        }
        self.entries.push(Entry { object, snapshot });
        true
    }

    /// Labels of the registered objects, in registration order.
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.object.label()).collect()
    }

    /// Builds the frame holding every object's current state.
    pub(crate) fn capture_current(&self) -> Frame {
        Frame {
            entries: self
                .entries
                .iter()
                .map(|entry| Entry {
                    object: Rc::clone(&entry.object),
                    snapshot: entry.object.capture(),
                })
                .collect(),
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Rc<dyn Capturable>, &Snapshot)> {
        self.entries
            .iter()
            .map(|entry| (&entry.object, &entry.snapshot))
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("objects", &self.labels())
            .finish()
    }
}
