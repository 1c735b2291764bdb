//! HTTP client for the remote hotel calendar service.
//!
//! [`CalendarApi`] wraps the service's REST endpoints and implements
//! [`CalendarBackend`](stayline_grid::CalendarBackend) for every grid kind
//! that knows its remote paths ([`RemoteGrid`]).

pub mod api;
pub mod grids;

pub use api::{CalendarApi, ClientError};
pub use grids::RemoteGrid;
