use crate::model::{FetchError, MultiLegQuery, SearchQuery};
use crate::parser::RawOffer;

/// Source of raw flight offers.
#[async_trait::async_trait]
pub trait FlightSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawOffer>, FetchError>;
    async fn search_multi(&self, query: &MultiLegQuery) -> Result<Vec<RawOffer>, FetchError>;
}
