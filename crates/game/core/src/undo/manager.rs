//! Undo/redo manager owning the frame stacks.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, error, trace};

use super::{Capturable, Finalize, Frame, UndoError};
use crate::notify::{Notification, NotificationBus, names};

const SOURCE: &str = "undo_manager";

type Hook = Box<dyn Fn()>;

#[derive(Default)]
struct Stacks {
    /// Never empty: the last frame is the open one.
    undo: Vec<Frame>,
    redo: Vec<Frame>,
}

impl Stacks {
    fn fresh() -> Self {
        Self {
            undo: vec![Frame::default()],
            redo: Vec::new(),
        }
    }

    fn top(&self) -> Option<&Frame> {
        self.undo.last()
    }

    fn ensure_open_frame(&mut self) {
        if self.undo.is_empty() {
            self.undo.push(Frame::default());
        }
    }
}

/// Transactional undo/redo over [`Capturable`] objects.
///
/// The manager is a plain service object: construct it with the session's
/// [`NotificationBus`] and share it (`Rc<UndoManager>`) with the components
/// that mutate undoable state. All operations take `&self`.
pub struct UndoManager {
    bus: NotificationBus,
    active: Cell<bool>,
    stacks: RefCell<Stacks>,
    before_rollback: RefCell<Vec<Hook>>,
    after_rollback: RefCell<Vec<Hook>>,
}

impl UndoManager {
    pub fn new(bus: NotificationBus) -> Self {
        Self {
            bus,
            active: Cell::new(true),
            stacks: RefCell::new(Stacks::fresh()),
            before_rollback: RefCell::new(Vec::new()),
            after_rollback: RefCell::new(Vec::new()),
        }
    }

    /// The bus this manager announces on.
    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    /// Registers a hook run before every rollback (e.g. to close transient overlays).
    pub fn on_before_rollback(&self, hook: impl Fn() + 'static) {
        self.before_rollback.borrow_mut().push(Box::new(hook));
    }

    /// Registers a hook run after every rollback.
    pub fn on_after_rollback(&self, hook: impl Fn() + 'static) {
        self.after_rollback.borrow_mut().push(Box::new(hook));
    }

    /// Captures `object` into the open frame before it is mutated.
    ///
    /// No-op while inactive or when the object already has a snapshot in the
    /// open frame. A successful registration invalidates the redo history.
    pub fn register<T: Capturable + 'static>(&self, object: &Rc<T>) {
        if !self.active.get() {
            return;
        }

        let object: Rc<dyn Capturable> = Rc::clone(object) as Rc<dyn Capturable>;
        let already_kept = self
            .stacks
            .borrow()
            .top()
            .is_some_and(|frame| frame.contains(&object));
        if already_kept {
            return;
        }

        let label = object.label();
        let snapshot = object.capture();
        {
            let mut stacks = self.stacks.borrow_mut();
            stacks.ensure_open_frame();
            if let Some(frame) = stacks.undo.last_mut() {
                frame.insert(object, snapshot);
            }
            stacks.redo.clear();
        }

        trace!(target: "game_core::undo", object = %label, "kept snapshot");
        self.announce(names::KEPT, Some(label));
    }

    /// Starts a new frame if the open one already holds snapshots.
    pub fn open(&self) {
        let opened = {
            let mut stacks = self.stacks.borrow_mut();
            match stacks.top().map(Frame::is_empty) {
                Some(false) => {
                    stacks.undo.push(Frame::default());
                    true
                }
                Some(true) => false,
                None => {
                    stacks.undo.push(Frame::default());
                    false
                }
            }
        };

        if opened {
            self.announce(names::OPENED, None);
        }
    }

    /// Rolls back the most recent non-empty frame and makes it redoable.
    ///
    /// Returns `Ok(false)` when there was nothing to undo.
    pub fn undo(&self) -> Result<bool, UndoError> {
        let Some(frame) = self.pop_undo_frame() else {
            return Ok(false);
        };

        debug!(target: "game_core::undo", objects = frame.len(), "undo");
        let inverse = self.rollback(&frame)?;

        {
            let mut stacks = self.stacks.borrow_mut();
            stacks.redo.push(inverse);
            stacks.undo.push(Frame::default());
        }
        self.announce(names::UNDO, None);
        Ok(true)
    }

    /// Reapplies the most recently undone frame.
    ///
    /// Returns `Ok(false)` when there was nothing to redo.
    pub fn redo(&self) -> Result<bool, UndoError> {
        let Some(frame) = self.stacks.borrow_mut().redo.pop() else {
            return Ok(false);
        };

        debug!(target: "game_core::undo", objects = frame.len(), "redo");
        let inverse = self.rollback(&frame)?;

        {
            let mut stacks = self.stacks.borrow_mut();
            // The open frame left by undo is empty; the inverse takes its place
            // so that the next undo reverts this redo.
            if stacks.top().is_some_and(Frame::is_empty) {
                stacks.undo.pop();
            }
            stacks.undo.push(inverse);
            stacks.undo.push(Frame::default());
        }
        self.announce(names::REDO, None);
        Ok(true)
    }

    /// Rolls back the most recent non-empty frame without making it redoable.
    ///
    /// Used to revert an operation that was abandoned before commit.
    pub fn cancel(&self) -> Result<bool, UndoError> {
        let Some(frame) = self.pop_undo_frame() else {
            return Ok(false);
        };

        debug!(target: "game_core::undo", objects = frame.len(), "cancel");
        self.rollback(&frame)?;
        self.stacks.borrow_mut().undo.push(Frame::default());
        Ok(true)
    }

    /// Drops all history. Called once local changes have been committed.
    pub fn clear(&self) {
        *self.stacks.borrow_mut() = Stacks::fresh();
        debug!(target: "game_core::undo", "history cleared");
        self.announce(names::CLEARED, None);
    }

    /// Re-enables registration.
    pub fn activate(&self) {
        self.active.set(true);
        self.announce(names::ACTIVATED, None);
    }

    /// Disables registration until [`UndoManager::activate`] is called.
    pub fn deactivate(&self) {
        self.active.set(false);
        self.announce(names::DEACTIVATED, None);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Returns true if some frame holds snapshots to roll back.
    pub fn undoable(&self) -> bool {
        self.stacks
            .borrow()
            .undo
            .iter()
            .any(|frame| !frame.is_empty())
    }

    pub fn redoable(&self) -> bool {
        !self.stacks.borrow().redo.is_empty()
    }

    /// Labels of the objects captured in the open frame.
    pub fn open_frame_labels(&self) -> Vec<String> {
        self.stacks
            .borrow()
            .top()
            .map(Frame::labels)
            .unwrap_or_default()
    }

    /// Pops frames until a non-empty one is found.
    ///
    /// Leaves an open frame in place when nothing was found.
    fn pop_undo_frame(&self) -> Option<Frame> {
        let mut stacks = self.stacks.borrow_mut();
        let mut found = None;
        while let Some(frame) = stacks.undo.pop() {
            if !frame.is_empty() {
                found = Some(frame);
                break;
            }
        }
        if found.is_none() {
            stacks.ensure_open_frame();
        }
        found
    }

    /// Restores every object of `frame` and returns the frame that reverts it.
    ///
    /// On a failed restore the manager stays deactivated; the frame is lost.
    fn rollback(&self, frame: &Frame) -> Result<Frame, UndoError> {
        self.active.set(false);

        for hook in self.before_rollback.borrow().iter() {
            hook();
        }

        let inverse = frame.capture_current();

        for (object, _) in frame.iter() {
            object.prepare_restore();
        }

        let mut finalizers: Vec<Finalize> = Vec::new();
        for (object, snapshot) in frame.iter() {
            match object.restore(snapshot) {
                Ok(Some(finalize)) => finalizers.push(finalize),
                Ok(None) => {}
                Err(err) => {
                    error!(
                        target: "game_core::undo",
                        object = %object.label(),
                        error = %err,
                        "restore failed, undo manager left inactive"
                    );
                    return Err(err);
                }
            }
        }

        for finalize in finalizers {
            finalize();
        }

        for hook in self.after_rollback.borrow().iter() {
            hook();
        }

        self.active.set(true);
        Ok(inverse)
    }

    fn announce(&self, name: &'static str, payload: Option<String>) {
        let mut notification = Notification::new(SOURCE, name);
        if let Some(payload) = payload {
            notification = notification.with_payload(payload.into());
        }
        self.bus.publish(notification);
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(NotificationBus::default())
    }
}
