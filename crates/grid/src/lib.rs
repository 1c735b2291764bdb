//! Stayline grid sessions: the async half of the edit engine.
//!
//! - [`EditCoordinator`]: one per grid session; owns the pending edit, the
//!   lock derivation, save/cancel and bulk apply.
//! - [`CalendarBackend`]: the remote calendar service the coordinator talks to.
//! - [`GridView`]: serializable snapshot of a session for the rendering layer.
//! - [`memory`]: in-process backend and notifier for local runs and tests.

pub mod backend;
pub mod bulk;
pub mod coordinator;
pub mod error;
pub mod memory;
pub mod view;

pub use backend::CalendarBackend;
pub use bulk::BulkOutcome;
pub use coordinator::{CellState, EditCoordinator, EditOutcome, SaveOutcome};
pub use error::{BackendError, GridError};
pub use view::{GridCell, GridView};
