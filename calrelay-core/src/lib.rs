//! Core of calrelay: an idempotent pipeline that announces and mirrors
//! calendar events exactly once per id.
//!
//! - `event`, `window`, `time` for the data model and timezone handling
//! - `dedup` for the persisted set of already-processed ids
//! - `source`, `notify`, `replica` for the collaborator boundaries
//! - `pipeline` and `report` for a single sync pass and what it did

pub mod dedup;
pub mod digest;
pub mod error;
pub mod event;
pub mod notify;
pub mod pipeline;
pub mod replica;
pub mod report;
pub mod source;
pub mod time;
pub mod window;

pub use error::{RelayError, RelayResult};
pub use event::Event;
pub use window::TimeWindow;
