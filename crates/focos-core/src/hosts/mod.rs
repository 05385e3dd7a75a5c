pub mod marker;
mod manager;

pub use manager::HostsBlockManager;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BlockError;

/// Anything that can install and remove the site block.
///
/// Sessions drive blocking through this trait; [`HostsBlockManager`] is the
/// production implementation.
#[async_trait]
pub trait Blocker: Send + Sync {
    async fn apply(&self, domains: &[String]) -> Result<(), BlockError>;
    async fn clear(&self) -> Result<(), BlockError>;
}

/// Outcome of a block/unblock request as reported across the UI boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BlockResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

impl From<Result<(), BlockError>> for BlockResponse {
    fn from(result: Result<(), BlockError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}


#[cfg(test)]
pub(crate) mod fake {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::Blocker;
    use crate::error::BlockError;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum BlockCall {
        Apply(Vec<String>),
        Clear,
    }

    /// Records every call; failures are switched on per operation.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingBlocker {
        calls: Mutex<Vec<BlockCall>>,
        fail_apply: AtomicBool,
        fail_clear: AtomicBool,
    }

    impl RecordingBlocker {
        pub(crate) fn calls(&self) -> Vec<BlockCall> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn fail_apply(&self, fail: bool) {
            self.fail_apply.store(fail, Ordering::SeqCst);
        }

        pub(crate) fn fail_clear(&self, fail: bool) {
            self.fail_clear.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Blocker for RecordingBlocker {
        async fn apply(&self, domains: &[String]) -> Result<(), BlockError> {
            self.calls
                .lock()
                .unwrap()
                .push(BlockCall::Apply(domains.to_vec()));
            if self.fail_apply.load(Ordering::SeqCst) {
                return Err(BlockError::ElevationDenied("user cancelled".into()));
            }
            Ok(())
        }

        async fn clear(&self) -> Result<(), BlockError> {
            self.calls.lock().unwrap().push(BlockCall::Clear);
            if self.fail_clear.load(Ordering::SeqCst) {
                return Err(BlockError::ElevationDenied("user cancelled".into()));
            }
            Ok(())
        }
    }
}
