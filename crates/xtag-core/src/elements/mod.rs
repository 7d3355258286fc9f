//! Custom element implementations and the types shared between them.

pub mod clock;
pub mod math;

use std::{fmt, sync::Arc};

use log::warn;
use thiserror::Error;
use xtag_proto::config::CssLengthError;

pub use clock::ClockWidget;
pub use math::MathWidget;

/// Stable identity of an element instance on the page.
///
/// Background tasks capture the id of the element that spawned them and every
/// event they publish is routed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(Arc<str>);

impl ElementId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised while creating an element.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    /// An attribute carried a value the element cannot use.
    #[error("attribute `{name}` is invalid: {source}")]
    InvalidLength {
        name: &'static str,
        #[source]
        source: CssLengthError,
    },
    /// The internal scaffold lacks one of the sub-elements the element drives.
    #[error("scaffold is missing the `{class_name}` sub-element")]
    MissingSubElement { class_name: &'static str },
}

/// Payloads published by element background tasks.
#[derive(Debug, Clone)]
pub enum ElementEvent {
    Clock(clock::Message),
    Math(math::Message),
}

/// A live instance of a registered custom element.
#[derive(Debug)]
pub enum ElementInstance {
    Clock(ClockWidget),
    Math(MathWidget),
}

impl ElementInstance {
    /// Feeds an event to the instance. Returns whether the visual state changed.
    pub fn update(&mut self, event: ElementEvent) -> bool {
        match (self, event) {
            (Self::Clock(clock), ElementEvent::Clock(message)) => clock.update(message),
            (Self::Math(math), ElementEvent::Math(message)) => math.update(message),
            (instance, event) => {
                warn!(
                    "Dropping {event:?}: not addressed to a <{}> element",
                    instance.tag()
                );
                false
            }
        }
    }

    /// Stops background work owned by the instance.
    pub fn detach(&mut self) {
        match self {
            Self::Clock(clock) => clock.detach(),
            Self::Math(math) => math.detach(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Clock(_) => xtag_proto::config::CLOCK_TAG,
            Self::Math(_) => xtag_proto::config::MATH_TAG,
        }
    }
}
