use crate::domain::model::RecommendationResult;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn endpoint(&self) -> &str;
    fn model(&self) -> &str;
    fn timeout(&self) -> Duration;
}

/// Turns free-text chat history into parsed data plus a display message.
/// Implementations never fail: errors come back as `(None, message)`.
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(&self, user_chat_history: &str) -> (Option<RecommendationResult>, String);
}
