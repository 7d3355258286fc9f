pub mod adapters;
pub mod config;
pub mod element_context;
pub mod elements;
pub mod event_bus;
pub mod page;
pub mod registry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use element_context::{ElementContext, ElementEventSender};
