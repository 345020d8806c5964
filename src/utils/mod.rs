//! Helper functions shared across layers.
//!
//! - [`code_generator`] - Short id generation

pub mod code_generator;
