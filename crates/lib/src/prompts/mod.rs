//! # Prompt Templates
//!
//! Prompt text and the pure builders that assemble it for each assistant.
//! Nothing in here performs I/O.

pub mod antitodo;
pub mod ownership;
