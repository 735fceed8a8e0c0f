use super::DedupStore;
use crate::error::RelayResult;

/// Degraded store used when the real one cannot be opened: nothing is ever
/// seen and nothing is kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStore;

impl DedupStore for NoopStore {
    fn exists(&self, _id: &str) -> RelayResult<bool> {
        Ok(false)
    }

    fn record(&mut self, _ids: &[String]) -> RelayResult<()> {
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}
