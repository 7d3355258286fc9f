use std::{
    num::NonZeroUsize,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::runtime::Handle;
use xtag_proto::ports::typeset::{
    TypesetError, TypesetOutput, TypesetPort, TypesetRequest,
};

use crate::{
    ElementContext,
    adapters::UnicodeTypesetter,
    event_bus::{BusEvent, EventBus, EventReceiver},
};

/// Typesetting port that records requests and answers with a canned result.
///
/// By default the source is echoed back unchanged.
#[derive(Debug, Default)]
pub struct MockTypesetPort {
    failure: Option<TypesetError>,
    requests: Mutex<Vec<TypesetRequest>>,
    calls: AtomicUsize,
}

impl MockTypesetPort {
    pub fn failing(error: TypesetError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TypesetRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl TypesetPort for MockTypesetPort {
    fn typeset(&self, request: &TypesetRequest) -> Result<TypesetOutput, TypesetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(TypesetOutput {
                rendered: request.source.clone(),
                mode: request.mode,
            }),
        }
    }
}

pub fn test_bus(capacity: usize) -> EventBus {
    EventBus::new(NonZeroUsize::new(capacity).expect("non-zero capacity"))
}

/// Context backed by the built-in Unicode typesetter.
pub fn test_context(bus: &EventBus, handle: Handle) -> ElementContext {
    test_context_with(bus, handle, Arc::new(UnicodeTypesetter))
}

pub fn test_context_with(
    bus: &EventBus,
    handle: Handle,
    typesetter: Arc<dyn TypesetPort>,
) -> ElementContext {
    ElementContext::new(bus.sender(), handle, typesetter)
}

/// Pops every queued event.
pub fn drain(receiver: &mut EventReceiver) -> Vec<BusEvent> {
    std::iter::from_fn(|| receiver.try_recv().expect("event bus readable")).collect()
}

/// Lets spawned tasks on the current-thread runtime run until they block.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
