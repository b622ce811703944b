//! gitcache — a drop-in accelerator for installing npm packages pinned to a
//! Git commit.
//!
//! A project's lockfile routinely pins dependencies straight at a Git
//! repository and ref instead of a registry tarball. npm's own install path
//! clones each of those fresh, every time, on every machine. gitcache sits in
//! front of `npm install`: it resolves every Git reference to a commit SHA,
//! materializes a content-addressed tarball for that commit through a
//! three-tier cache (local disk, a shared HTTP registry, and Git itself as
//! the fallback source of truth), and points npm's own cache at the result
//! before handing off to the real `npm install`.
//!
//! # Core modules
//!
//! - [`lockfile`] - scans `package-lock.json`/`npm-shrinkwrap.json`/`yarn.lock`
//!   for Git-sourced dependencies
//! - [`resolver`] - resolves symbolic Git references to commit SHAs
//! - [`cache`] - the content-addressed local tier and the hierarchy that
//!   composes it with the registry and Git tiers
//! - [`registry`] - the HTTP client for the shared artifact registry
//! - [`builder`] - builds deterministic tarballs straight from Git
//! - [`installer`] - the `scan → resolve → fetch-or-build → spawn` pipeline
//! - [`git`] - a thin wrapper over the system `git` binary
//! - [`config`] - environment-variable-only configuration
//! - [`core`] - shared error types
//! - [`cli`] - command-line argument parsing and dispatch
//! - [`utils`] - small cross-platform filesystem/platform helpers

pub mod builder;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod git;
pub mod installer;
pub mod lockfile;
pub mod registry;
pub mod resolver;
pub mod utils;
