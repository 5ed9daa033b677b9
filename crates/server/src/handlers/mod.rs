//! # API Route Handlers
//!
//! Handlers are grouped by service. `general` holds the root and health
//! endpoints both services expose.

pub mod antitodo;
pub mod general;
pub mod ingest;
pub mod ownership;

pub use antitodo::*;
pub use general::*;
pub use ingest::*;
pub use ownership::*;

// Shared items used by multiple handler modules.
use super::{errors::AppError, state::AppState};
