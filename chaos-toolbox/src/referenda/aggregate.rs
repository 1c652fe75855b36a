use super::merge::{merge_active, merge_past, SecondaryData};
use super::payload::{ChainSnapshot, IndexerQuery, Post, QuizVersion, ReferendumStats};
use super::settings::AggregatorSettings;
use super::sources::{ChainSource, ContentSource, IndexerSource, QuizSource, SourceError, SourceKind};
use super::{Error, ReferendumRecord};
use chrono::{TimeZone, Utc};
use referenda_lib::{AdaptiveQuorumBiasing, PassingThreshold, ReferendumIndex};
use std::collections::HashMap;

pub struct Aggregator {
    chain: Box<dyn ChainSource>,
    indexer: Box<dyn IndexerSource>,
    content: Box<dyn ContentSource>,
    quizzes: Box<dyn QuizSource>,
    threshold: Box<dyn PassingThreshold>,
    settings: AggregatorSettings,
}

fn or_degraded<T: Default>(kind: SourceKind, result: Result<T, SourceError>) -> T {
    result.unwrap_or_else(|error| {
        tracing::warn!(source = %kind, %error, "source unavailable, continuing without it");
        T::default()
    })
}

impl Aggregator {
    pub fn new(
        chain: Box<dyn ChainSource>,
        indexer: Box<dyn IndexerSource>,
        content: Box<dyn ContentSource>,
        quizzes: Box<dyn QuizSource>,
    ) -> Self {
        Self {
            chain,
            indexer,
            content,
            quizzes,
            threshold: Box::new(AdaptiveQuorumBiasing),
            settings: AggregatorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AggregatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_threshold_policy(mut self, threshold: Box<dyn PassingThreshold>) -> Self {
        self.threshold = threshold;
        self
    }

    /// Active referenda, reconciled across all sources and sorted by index.
    ///
    /// Only a chain failure fails the run. When `user` is given every record
    /// carries that account's participation.
    #[tracing::instrument(skip(self))]
    pub async fn aggregate_active_referenda(
        &self,
        user: Option<&str>,
    ) -> Result<Vec<ReferendumRecord>, Error> {
        let chain = self.fetch_chain().await?;
        tracing::debug!(
            head = chain.head.number,
            referenda = chain.referenda.len(),
            "chain state fetched"
        );

        let indices = chain
            .referenda
            .iter()
            .map(|referendum| referendum.index)
            .collect::<Vec<_>>();
        let secondary = self.fetch_secondary(&indices).await;

        let records = merge_active(
            &chain,
            &secondary,
            &self.settings,
            self.threshold.as_ref(),
            user,
        )?;
        tracing::info!(records = records.len(), "active referenda aggregated");
        Ok(records)
    }

    /// The most recently ended referenda known to the indexer, sorted by index.
    #[tracing::instrument(skip(self))]
    pub async fn aggregate_past_referenda(&self) -> Result<Vec<ReferendumRecord>, Error> {
        let query = IndexerQuery::past(self.settings.past_limit);
        let page = match self.indexer.referenda(&query).await {
            Ok(page) => page,
            Err(error) => {
                tracing::warn!(source = %SourceKind::Indexer, %error, "no past referenda available");
                return Ok(Vec::new());
            }
        };

        let posts = or_degraded(SourceKind::Content, self.fetch_posts(&page.indices()).await);
        let records = merge_past(page, &posts, &self.settings)?;
        tracing::info!(records = records.len(), "past referenda aggregated");
        Ok(records)
    }

    async fn fetch_chain(&self) -> Result<ChainSnapshot, Error> {
        let unavailable = |error: SourceError| Error::SourceUnavailable {
            kind: SourceKind::Chain,
            error,
        };

        let head = self.chain.head().await.map_err(unavailable)?;
        let moment = self.chain.timestamp_at(&head).await.map_err(unavailable)?;
        let timestamp = i64::try_from(moment)
            .ok()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .ok_or(Error::InvalidTimestamp(moment))?;
        let total_issuance = self.chain.total_issuance().await.map_err(unavailable)?;
        let referenda = self.chain.active_referenda().await.map_err(unavailable)?;

        Ok(ChainSnapshot {
            head,
            timestamp,
            total_issuance,
            referenda,
        })
    }

    async fn fetch_secondary(&self, indices: &[ReferendumIndex]) -> SecondaryData {
        let (indexer, posts, quizzes) = futures::join!(
            self.fetch_indexer_stats(),
            self.fetch_posts(indices),
            self.fetch_quizzes(indices),
        );
        let secondary = SecondaryData {
            indexer: or_degraded(SourceKind::Indexer, indexer),
            posts: or_degraded(SourceKind::Content, posts),
            quizzes,
        };
        tracing::debug!(
            indexer = secondary.indexer.len(),
            posts = secondary.posts.len(),
            quizzes = secondary.quizzes.len(),
            "secondary sources fetched"
        );
        secondary
    }

    async fn fetch_indexer_stats(&self) -> Result<Vec<ReferendumStats>, SourceError> {
        let page = self.indexer.referenda(&IndexerQuery::active()).await?;
        Ok(page.listed_stats())
    }

    async fn fetch_posts(&self, indices: &[ReferendumIndex]) -> Result<Vec<Post>, SourceError> {
        if indices.is_empty() {
            return Ok(Vec::new());
        }
        self.content.posts(indices).await
    }

    async fn fetch_quizzes(
        &self,
        indices: &[ReferendumIndex],
    ) -> HashMap<ReferendumIndex, Vec<QuizVersion>> {
        let fetches = indices.iter().map(|&index| async move {
            match self.quizzes.quizzes(index).await {
                Ok(versions) => Some((index, versions)),
                Err(error) => {
                    tracing::warn!(source = %SourceKind::Quiz, index, %error, "quiz unavailable");
                    None
                }
            }
        });
        futures::future::join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}
