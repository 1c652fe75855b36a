use super::payload::{BlockHeader, ChainReferendum, IndexerPage, IndexerQuery, Moment, Post, QuizVersion};
use referenda_lib::{Balance, ReferendumIndex};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("query failed: {}", .0.join("; "))]
    Query(Vec<String>),
    #[error("response carried no data")]
    NoData,
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Chain,
    Indexer,
    Content,
    Quiz,
    RewardConfig,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Chain => "chain",
            SourceKind::Indexer => "indexer",
            SourceKind::Content => "content platform",
            SourceKind::Quiz => "quiz service",
            SourceKind::RewardConfig => "reward config",
        };
        f.write_str(name)
    }
}

/// Live chain state. Any failure here aborts the aggregation run.
#[async_trait::async_trait]
pub trait ChainSource: Send + Sync {
    async fn head(&self) -> Result<BlockHeader, SourceError>;

    /// Timestamp stored in the given block, in milliseconds.
    async fn timestamp_at(&self, block: &BlockHeader) -> Result<Moment, SourceError>;

    async fn total_issuance(&self) -> Result<Balance, SourceError>;

    /// Active referenda with their derived tallies, in chain iteration order.
    async fn active_referenda(&self) -> Result<Vec<ChainReferendum>, SourceError>;
}

#[async_trait::async_trait]
pub trait IndexerSource: Send + Sync {
    async fn referenda(&self, query: &IndexerQuery) -> Result<IndexerPage, SourceError>;
}

#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn posts(&self, indices: &[ReferendumIndex]) -> Result<Vec<Post>, SourceError>;

    async fn post(&self, index: ReferendumIndex) -> Result<Option<Post>, SourceError> {
        let posts = self.posts(&[index]).await?;
        Ok(posts.into_iter().find(|post| post.referendum_index() == index))
    }
}

#[async_trait::async_trait]
pub trait QuizSource: Send + Sync {
    /// Every published version of the quiz attached to a referendum.
    async fn quizzes(&self, index: ReferendumIndex) -> Result<Vec<QuizVersion>, SourceError>;
}
