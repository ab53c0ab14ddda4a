//! Shared test fixtures for the hwconfig workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixtures`] - authored sources, a schema and a raw node tree
//! - [`dir`] - [`FixtureDir`](dir::FixtureDir) for tests that need real files

pub mod dir;
pub mod fixtures;
