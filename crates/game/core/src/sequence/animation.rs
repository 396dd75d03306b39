use std::fmt;

use crate::sequence::ElementTag;
use crate::state::Tick;

type Callback = Box<dyn FnOnce(Tick)>;

/// Presentation of one applied element on the tick clock.
///
/// The animation is finished once the clock reaches `start + duration`.
/// Completion callbacks run exactly once, in registration order, from the
/// [`Animation::advance`] call that first observes completion.
pub struct Animation {
    tag: ElementTag,
    start: Tick,
    duration: Tick,
    finished: bool,
    callbacks: Vec<Callback>,
}

impl Animation {
    pub fn new(tag: ElementTag, start: Tick, duration: Tick) -> Self {
        Self {
            tag,
            start,
            duration,
            finished: false,
            callbacks: Vec::new(),
        }
    }

    pub fn tag(&self) -> ElementTag {
        self.tag
    }

    pub fn start(&self) -> Tick {
        self.start
    }

    pub fn end(&self) -> Tick {
        self.start.saturating_add(self.duration)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Registers a callback receiving the tick at which the animation ended.
    ///
    /// Registering on a finished animation runs the callback immediately.
    pub fn on_complete(&mut self, callback: impl FnOnce(Tick) + 'static) {
        if self.finished {
            callback(self.end());
        } else {
            self.callbacks.push(Box::new(callback));
        }
    }

    /// Moves the animation to `now` and returns whether it has finished.
    pub fn advance(&mut self, now: Tick) -> bool {
        if !self.finished && now >= self.end() {
            self.finished = true;
            let end = self.end();
            for callback in self.callbacks.drain(..) {
                callback(end);
            }
        }
        self.finished
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("tag", &self.tag)
            .field("start", &self.start)
            .field("duration", &self.duration)
            .field("finished", &self.finished)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn callback_waits_for_the_full_duration() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut animation = Animation::new(ElementTag::Move, 0, 200);
        let sink = Rc::clone(&fired);
        animation.on_complete(move |tick| sink.borrow_mut().push(tick));

        assert!(!animation.advance(0));
        assert!(!animation.advance(199));
        assert!(fired.borrow().is_empty());

        assert!(animation.advance(200));
        assert!(animation.advance(500));
        assert_eq!(*fired.borrow(), vec![200]);
    }

    #[test]
    fn late_registration_runs_immediately() {
        let mut animation = Animation::new(ElementTag::Turn, 40, 0);
        assert!(animation.advance(40));
        let fired = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&fired);
        animation.on_complete(move |tick| *sink.borrow_mut() = Some(tick));
        assert_eq!(*fired.borrow(), Some(40));
    }
}
