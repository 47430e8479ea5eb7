//! camshot library crate.
//!
//! This module exposes the internal components for integration testing.

pub mod camera;
pub mod config;
pub mod controller;
pub mod permissions;
pub mod session;
pub mod snapshot;
pub mod ui;
