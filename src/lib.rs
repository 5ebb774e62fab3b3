//! `asgen`: a batch AppStream metadata generator for software
//! distributions (spec §1 OVERVIEW).
//!
//! The root crate is a thin CLI shim over `asgen-engine`'s `Engine`.
//! Every real subsystem (stores, extraction, composer/backend
//! capability boundaries, export, cleanup) lives in its own `asgen-*`
//! crate; this crate only wires configuration, dependency injection,
//! and the command surface together.

pub mod cli;
pub mod file_package;
