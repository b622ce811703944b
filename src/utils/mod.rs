//! Cross-platform utilities shared by the rest of gitcache.
//!
//! - [`fs`] - atomic writes, JSON helpers, sha256 hashing
//! - [`platform`] - home directory, git command name, platform id

pub mod fs;
pub mod platform;
