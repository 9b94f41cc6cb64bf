//! Core types and trait definitions for the Mission Control live-session
//! coordinator.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::SessionStore`] and
//! [`store::LaunchCatalogue`]; the HTTP layer and clients build on
//! [`control::MissionControl`] and the pure derivation functions.

pub mod control;
pub mod countdown;
pub mod error;
pub mod feed;
pub mod log;
pub mod overlay;
pub mod resolve;
pub mod session;
pub mod store;

pub use error::{Error, ErrorKind, Result, StoreError};
