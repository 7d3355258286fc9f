use std::{fmt, sync::Arc};

use tokio::runtime::Handle;
use xtag_proto::ports::typeset::TypesetPort;

use crate::{
    elements::{ElementEvent, ElementId},
    event_bus::{BusEvent, EventBusError, EventSender},
};

/// Shared utilities handed to elements when they attach to a page.
///
/// The context owns an [`EventSender`] used to push [`BusEvent`] values into the UI
/// queue, a [`Handle`] tied to the runtime powering background tasks and the
/// typesetting engine math elements hand their sources to. Tasks spawned through the
/// handle must tolerate being aborted at any await point; event publication is
/// synchronous, so an aborted task never leaves a half-published event behind.
#[derive(Debug, Clone)]
pub struct ElementContext {
    event_sender: EventSender,
    runtime_handle: Handle,
    typesetter: Arc<dyn TypesetPort>,
}

impl ElementContext {
    /// Create a new context bound to the provided event sender, runtime handle and
    /// typesetting engine.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::{num::NonZeroUsize, sync::Arc};
    /// # use xtag_core::{adapters::UnicodeTypesetter, event_bus::EventBus, ElementContext};
    /// # let runtime = tokio::runtime::Runtime::new().expect("runtime");
    /// let bus = EventBus::new(NonZeroUsize::new(4).expect("capacity"));
    /// let context = ElementContext::new(
    ///     bus.sender(),
    ///     runtime.handle().clone(),
    ///     Arc::new(UnicodeTypesetter),
    /// );
    /// # drop(context);
    /// ```
    pub fn new(
        event_sender: EventSender,
        runtime_handle: Handle,
        typesetter: Arc<dyn TypesetPort>,
    ) -> Self {
        Self {
            event_sender,
            runtime_handle,
            typesetter,
        }
    }

    /// Access the runtime handle used for spawning background tasks.
    pub fn runtime_handle(&self) -> &Handle {
        &self.runtime_handle
    }

    /// The typesetting engine math elements submit their sources to.
    pub fn typesetter(&self) -> &Arc<dyn TypesetPort> {
        &self.typesetter
    }

    /// Same bus and runtime, different typesetting engine.
    pub fn with_typesetter(&self, typesetter: Arc<dyn TypesetPort>) -> Self {
        Self {
            typesetter,
            ..self.clone()
        }
    }

    /// Build an event sender bound to one element instance.
    ///
    /// The returned sender stamps every payload with `id`, so whoever ends up
    /// invoking it (a timer task, a worker thread) reaches the same element without
    /// any ambient context.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::{num::NonZeroUsize, sync::Arc};
    /// # use chrono::Local;
    /// # use xtag_core::{adapters::UnicodeTypesetter, event_bus::EventBus, ElementContext};
    /// # use xtag_core::elements::{clock, ElementEvent, ElementId};
    /// # let runtime = tokio::runtime::Runtime::new().expect("runtime");
    /// let bus = EventBus::new(NonZeroUsize::new(4).expect("capacity"));
    /// let context = ElementContext::new(
    ///     bus.sender(),
    ///     runtime.handle().clone(),
    ///     Arc::new(UnicodeTypesetter),
    /// );
    /// let sender = context.element_sender(ElementId::from("main"), ElementEvent::Clock);
    /// sender
    ///     .try_send(clock::Message::Tick(Local::now()))
    ///     .expect("queued");
    /// ```
    pub fn element_sender<T, F>(&self, id: ElementId, convert: F) -> ElementEventSender<T>
    where
        T: Send + 'static,
        F: Fn(T) -> ElementEvent + Send + Sync + 'static,
    {
        ElementEventSender {
            id,
            event_sender: self.event_sender.clone(),
            convert: Arc::new(convert),
        }
    }
}

/// Strongly-typed sender publishing events on behalf of a single element.
#[derive(Clone)]
pub struct ElementEventSender<T> {
    id: ElementId,
    event_sender: EventSender,
    convert: Arc<dyn Fn(T) -> ElementEvent + Send + Sync>,
}

impl<T> ElementEventSender<T>
where
    T: Send + 'static,
{
    /// The element every payload is addressed to.
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Convert the payload into an [`ElementEvent`] and enqueue it on the bus.
    ///
    /// # Postconditions
    ///
    /// - Returns [`Ok`] if the event is successfully queued, otherwise propagates
    ///   [`EventBusError`] from the underlying [`EventSender`].
    pub fn try_send(&self, payload: T) -> Result<(), EventBusError> {
        self.event_sender.try_send(BusEvent::Element {
            id: self.id.clone(),
            event: (self.convert)(payload),
        })
    }
}

impl<T> fmt::Debug for ElementEventSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementEventSender")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
