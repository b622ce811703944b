//! Core error types shared across gitcache's modules.
//!
//! Every fallible operation in gitcache returns either `anyhow::Result` (for
//! call sites that only need to log-and-continue) or `Result<_, GitCacheError>`
//! (for call sites that need to match on a specific failure category). See
//! [`error`] for the full taxonomy and the propagation policy that governs
//! which errors are ever shown to the user.

pub mod error;

pub use error::{BuildPhase, ErrorContext, GitCacheError, RegistryPhase, user_friendly_error};
