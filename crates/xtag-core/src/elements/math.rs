//! Math element: hands its TeX source to the typesetting engine once, when it is
//! attached, and shows whatever the engine returns.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use log::{debug, error, warn};
use tokio::task::{JoinHandle, spawn_blocking};
use xtag_proto::{
    config::ElementDef,
    ports::typeset::{MathMode, TypesetError, TypesetOutput, TypesetRequest},
};

use super::{ElementEvent, ElementId};
use crate::ElementContext;

/// Process-wide so a widget re-created under the same id never reuses the
/// ticket of the one it replaced.
static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub enum Message {
    /// Engine answer for the request identified by `ticket`.
    Typeset {
        ticket: u64,
        result: Result<TypesetOutput, TypesetError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathState {
    /// Waiting for the engine.
    Pending,
    Rendered(TypesetOutput),
    Failed(TypesetError),
}

#[derive(Debug)]
pub struct MathWidget {
    id: ElementId,
    script: TypesetRequest,
    state: MathState,
    request: Option<Request>,
}

#[derive(Debug)]
struct Request {
    ticket: u64,
    task: JoinHandle<()>,
}

impl MathWidget {
    /// Moves the element's text content into the typesetting script. The
    /// `mode` attribute selects display mode when it reads `display`.
    pub fn new(id: ElementId, def: &ElementDef) -> Self {
        Self {
            id,
            script: TypesetRequest {
                source: def.content.clone(),
                mode: MathMode::from_attribute(def.attribute("mode")),
            },
            state: MathState::Pending,
            request: None,
        }
    }

    pub fn create(id: ElementId, def: &ElementDef, ctx: &ElementContext) -> Self {
        let mut math = Self::new(id, def);
        math.attach(ctx);
        math
    }

    /// Submits the script to the context's typesetter as a one-shot request. The
    /// result comes back as a [`Message::Typeset`] addressed to this element.
    pub fn attach(&mut self, ctx: &ElementContext) {
        self.abort_request();
        self.state = MathState::Pending;

        let sender = ctx.element_sender(self.id.clone(), ElementEvent::Math);
        let typesetter = Arc::clone(ctx.typesetter());
        let script = self.script.clone();
        let ticket = NEXT_TICKET.fetch_add(1, Ordering::Relaxed);

        debug!("Submitting {} ({} mode) for typesetting", self.id, script.mode);

        let task = ctx.runtime_handle().spawn(async move {
            let result = match spawn_blocking(move || typesetter.typeset(&script)).await {
                Ok(result) => result,
                Err(err) => Err(TypesetError::unavailable(format!(
                    "typesetting worker failed: {err}"
                ))),
            };

            if let Err(err) = sender.try_send(Message::Typeset { ticket, result }) {
                error!("Failed to publish typesetting result for {}: {err}", sender.id());
            }
        });

        self.request = Some(Request { ticket, task });
    }

    /// Cancels an in-flight request.
    pub fn detach(&mut self) {
        self.abort_request();
    }

    fn abort_request(&mut self) {
        if let Some(request) = self.request.take() {
            request.task.abort();
        }
    }

    /// Applies the engine's answer. Returns whether the visual state changed.
    ///
    /// Answers to any request other than the one in flight are dropped.
    pub fn update(&mut self, message: Message) -> bool {
        let Message::Typeset { ticket, result } = message;

        match &self.request {
            Some(request) if request.ticket == ticket => self.request = None,
            _ => {
                debug!("Ignoring stale typesetting result for {}", self.id);
                return false;
            }
        }

        match result {
            Ok(output) => {
                self.state = MathState::Rendered(output);
            }
            Err(err) => {
                warn!("Typesetting {} failed: {err}", self.id);
                self.state = MathState::Failed(err);
            }
        }

        true
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn mode(&self) -> MathMode {
        self.script.mode
    }

    pub fn source(&self) -> &str {
        &self.script.source
    }

    pub fn state(&self) -> &MathState {
        &self.state
    }
}

impl Drop for MathWidget {
    fn drop(&mut self) {
        self.abort_request();
    }
}
