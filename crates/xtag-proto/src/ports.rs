//! Port definitions for xtag adapters.
//!
//! This module exposes the typesetting port contract used by the math element
//! to hand its source to an external engine without linking against one.

pub mod typeset;
