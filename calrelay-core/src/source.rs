//! Event source boundary.

use async_trait::async_trait;

use crate::error::RelayResult;
use crate::event::Event;
use crate::window::TimeWindow;

/// Produces the events overlapping a time window.
///
/// Sources are at-least-once: overlapping windows may return the same id
/// again, in any order.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self, window: &TimeWindow) -> RelayResult<Vec<Event>>;
}
