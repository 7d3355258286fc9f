use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use crate::elements::{ElementEvent, ElementId};
use masterror::AppError;

/// Event addressed to the element mounted under `id`.
#[derive(Debug, Clone)]
pub enum BusEvent {
    Element { id: ElementId, event: ElementEvent },
}

#[derive(Debug)]
struct EventBusInner {
    queue: Mutex<VecDeque<BusEvent>>,
    capacity: usize,
}

impl EventBusInner {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.get())),
            capacity: capacity.get(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    QueueFull { capacity: usize },
    Poisoned,
}

impl std::fmt::Display for EventBusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QueueFull { capacity } => {
                write!(f, "Event queue is full (capacity: {})", capacity)
            }
            Self::Poisoned => write!(f, "Event queue state is poisoned"),
        }
    }
}

impl std::error::Error for EventBusError {}

impl From<EventBusError> for AppError {
    fn from(err: EventBusError) -> Self {
        AppError::internal(err.to_string())
    }
}

/// Bounded FIFO queue carrying events from background tasks to the UI loop.
#[derive(Debug, Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

impl EventBus {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(EventBusInner::new(capacity)),
        }
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    inner: Arc<EventBusInner>,
}

impl EventSender {
    pub fn try_send(&self, event: BusEvent) -> Result<(), EventBusError> {
        let mut queue = self
            .inner
            .queue
            .lock()
            .map_err(|_| EventBusError::Poisoned)?;

        if queue.len() >= self.inner.capacity {
            return Err(EventBusError::QueueFull {
                capacity: self.inner.capacity,
            });
        }

        queue.push_back(event);
        Ok(())
    }
}

#[derive(Debug)]
pub struct EventReceiver {
    inner: Arc<EventBusInner>,
}

impl EventReceiver {
    pub fn try_recv(&mut self) -> Result<Option<BusEvent>, EventBusError> {
        let mut queue = self
            .inner
            .queue
            .lock()
            .map_err(|_| EventBusError::Poisoned)?;

        Ok(queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;
    use crate::elements::clock;

    fn bus(capacity: usize) -> EventBus {
        EventBus::new(NonZeroUsize::new(capacity).expect("non-zero"))
    }

    fn tick(id: &str) -> BusEvent {
        BusEvent::Element {
            id: ElementId::from(id),
            event: ElementEvent::Clock(clock::Message::Tick(Local::now())),
        }
    }

    #[test]
    fn delivers_events_in_fifo_order() {
        let bus = bus(4);
        let sender = bus.sender();
        let mut receiver = bus.receiver();

        sender.try_send(tick("first")).expect("queued");
        sender.try_send(tick("second")).expect("queued");

        let ids: Vec<_> = std::iter::from_fn(|| receiver.try_recv().expect("receive"))
            .map(|BusEvent::Element { id, .. }| id.to_string())
            .collect();

        assert_eq!(ids, ["first", "second"]);
    }

    #[test]
    fn rejects_events_beyond_capacity() {
        let bus = bus(1);
        let sender = bus.sender();

        sender.try_send(tick("a")).expect("queued");

        assert_eq!(
            sender.try_send(tick("b")),
            Err(EventBusError::QueueFull { capacity: 1 })
        );
    }

    #[test]
    fn repeated_events_are_all_delivered() {
        let bus = bus(8);
        let sender = bus.sender();
        let mut receiver = bus.receiver();

        sender.try_send(tick("a")).expect("queued");
        sender.try_send(tick("a")).expect("queued");
        sender.try_send(tick("b")).expect("queued");

        let mut count = 0;
        while receiver.try_recv().expect("receive").is_some() {
            count += 1;
        }

        assert_eq!(count, 3);
    }

    #[test]
    fn receiving_frees_capacity() {
        let bus = bus(1);
        let sender = bus.sender();
        let mut receiver = bus.receiver();

        sender.try_send(tick("a")).expect("queued");
        assert!(receiver.try_recv().expect("receive").is_some());

        sender.try_send(tick("b")).expect("room again");
    }
}
