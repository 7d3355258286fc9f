//! Rendering of page elements. Views read element state and never mutate it.

pub mod clock;
pub mod math;
