/// Ordered outbox of events produced while handling one command or input.
///
/// Producers push during the operation; the transport drains afterwards, so
/// no callback ever runs while layer state is half-updated.
#[derive(Debug)]
pub struct EventBus<T> {
    events: Vec<T>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<T> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: T) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[T] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<T> {
        std::mem::take(&mut self.events)
    }
}
