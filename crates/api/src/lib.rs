//! Stayline grid gateway library.
//!
//! Exposes the building blocks (config, state, sessions, error handling,
//! routes) so integration tests and the binary entrypoint can both use them.

pub mod config;
pub mod demo;
pub mod error;
pub mod response;
pub mod router;
pub mod routes;
pub mod session;
pub mod state;
