//! Reconciliation of referendum state coming from the chain, the indexer, the
//! content platform and the quiz service into one record per referendum.

mod aggregate;
mod merge;
pub mod payload;
pub mod settings;
pub mod sources;

pub use aggregate::Aggregator;
pub use merge::{estimate_end_date, fold_quizzes, merge_active, merge_past, SecondaryData};
pub use settings::AggregatorSettings;

use chrono::{DateTime, Utc};
use payload::{Moment, QuizSubmission, QuizVersion, ReferendumStats};
use referenda_lib::units;
use referenda_lib::vote::{self, find_account_vote};
use referenda_lib::{
    normalize_vote, AccountId, NormalizedVote, RawVote, ReferendumIndex, Tally, ThresholdKind,
    UnknownConvictionTag, UnknownThresholdKind,
};
use serde::Serialize;
use sources::{SourceError, SourceKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} unavailable")]
    SourceUnavailable {
        kind: SourceKind,
        #[source]
        error: SourceError,
    },
    #[error("block timestamp {0} is out of range")]
    InvalidTimestamp(Moment),
    #[error(transparent)]
    UnknownConvictionTag(#[from] UnknownConvictionTag),
    #[error(transparent)]
    UnknownThresholdKind(#[from] UnknownThresholdKind),
    #[error(transparent)]
    Units(#[from] units::Error),
}

impl From<vote::Error> for Error {
    fn from(error: vote::Error) -> Self {
        match error {
            vote::Error::Conviction(tag) => Error::UnknownConvictionTag(tag),
            vote::Error::Units(units) => Error::Units(units),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Ended,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProposedBy {
    pub id: Option<AccountId>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserParticipation {
    pub vote: Option<NormalizedVote>,
    pub submitted_quiz: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferendumRecord {
    pub id: ReferendumIndex,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Status,
    #[serde(flatten)]
    pub tally: Tally,
    pub end_date: Option<DateTime<Utc>>,
    pub proposed_by: ProposedBy,
    pub threshold_kind: Option<ThresholdKind>,
    /// Outcome of the configured passing threshold for the current tally.
    pub threshold: Option<bool>,
    /// As reported by the chain.
    pub is_passing: Option<bool>,
    /// Every cast, in chain iteration order.
    pub votes: Vec<RawVote>,
    pub quiz: Option<QuizVersion>,
    /// Submissions of every quiz version, oldest version first.
    pub submissions: Vec<QuizSubmission>,
    pub indexer: Option<ReferendumStats>,
    pub user: Option<UserParticipation>,
}

/// The most recent vote of `user` on referendum `id`, normalized. `None` when
/// the referendum is unknown or the user did not vote.
pub fn find_user_vote(
    records: &[ReferendumRecord],
    id: ReferendumIndex,
    user: &str,
) -> Result<Option<NormalizedVote>, Error> {
    let raw = records
        .iter()
        .find(|record| record.id == id)
        .and_then(|record| find_account_vote(&record.votes, user));
    Ok(normalize_vote(raw)?)
}
