//! Stayline core: calendar grid models and the local half of the edit engine.
//!
//! Everything in this crate is synchronous and free of I/O. The async
//! orchestration (save, cancel, bulk apply) lives in `stayline-grid`.
//!
//! - [`row`]: the [`CalendarRow`](row::CalendarRow) / [`FieldPatch`](row::FieldPatch)
//!   abstraction shared by both grids.
//! - [`inventory`] and [`rates`]: the two concrete grids.
//! - [`store`], [`snapshot`], [`edit`], [`updating`]: the optimistic state
//!   building blocks.

pub mod calendar;
pub mod coerce;
pub mod collection;
pub mod edit;
pub mod error;
pub mod inventory;
pub mod notice;
pub mod rates;
pub mod row;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod updating;
