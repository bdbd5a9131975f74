//! Chain liveness reads

use crate::error::CallResult;
use async_trait::async_trait;

/// Read-only access to chain head information.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Latest block number known to the node
    async fn block_number(&self) -> CallResult<u64>;
}
