use std::cell::Cell;
use std::rc::Rc;

use foundation::time::Time;

/// Source of "now" for deferred work.
pub trait Clock {
    fn now(&self) -> Time;
}

/// Hand-advanced clock for tests and deterministic replay.
///
/// Clones share the same time, so a test can keep one handle while the
/// surface owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Time>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, ms: u32) {
        self.now.set(self.now.get().after_ms(ms));
    }

    pub fn set(&self, t: Time) {
        self.now.set(t);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Time {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, ManualClock};
    use foundation::time::Time;

    #[test]
    fn clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance_ms(150);
        assert_eq!(b.now(), Time(150.0));
    }
}
