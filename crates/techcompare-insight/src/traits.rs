use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{NarrativeRequest, NarrativeResponse};

#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn summarize(&self, request: NarrativeRequest)
    -> Result<NarrativeResponse, ProviderError>;
}
