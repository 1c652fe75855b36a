//! Payloads as handed over by the collaborators, before reconciliation.

use super::sources::SourceError;
use crate::utils::serde::deserialize_number_or_string;
use chrono::{DateTime, Utc};
use graphql_client::{QueryBody, Response};
use referenda_lib::units::{self, Balance};
use referenda_lib::{AccountId, RawVote, ReferendumIndex, TallyStats, WeightedTally};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type BlockNumber = u64;
/// Milliseconds since the unix epoch, as stored by the chain.
pub type Moment = u64;

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub hash: String,
    pub number: BlockNumber,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainReferendum {
    #[serde(deserialize_with = "deserialize_number_or_string")]
    pub index: ReferendumIndex,
    #[serde(default)]
    pub image: Option<ProposalImage>,
    pub status: ReferendumStatus,
    #[serde(default)]
    pub is_passing: Option<bool>,
    #[serde(deserialize_with = "units::deser::balance")]
    pub voted_aye: Balance,
    #[serde(deserialize_with = "units::deser::balance")]
    pub voted_nay: Balance,
    #[serde(deserialize_with = "units::deser::balance")]
    pub voted_total: Balance,
    #[serde(default)]
    pub vote_count_aye: u64,
    #[serde(default)]
    pub vote_count_nay: u64,
    /// In chain iteration order.
    #[serde(default)]
    pub votes: Vec<RawVote>,
}

impl ChainReferendum {
    pub fn tally_stats(&self) -> TallyStats {
        TallyStats {
            voted_aye: self.voted_aye,
            voted_nay: self.voted_nay,
            voted_total: self.voted_total,
            vote_count_aye: self.vote_count_aye,
            vote_count_nay: self.vote_count_nay,
        }
    }

    /// `section.method` of the proposed call, when its preimage is known.
    pub fn call_name(&self) -> Option<String> {
        self.image
            .as_ref()
            .and_then(|image| image.proposal.as_ref())
            .map(|call| format!("{}.{}", call.section, call.method))
    }

    pub fn proposer(&self) -> Option<&AccountId> {
        self.image.as_ref().and_then(|image| image.proposer.as_ref())
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProposalImage {
    #[serde(default)]
    pub proposer: Option<AccountId>,
    #[serde(default)]
    pub proposal: Option<ProposalCall>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProposalCall {
    pub section: String,
    pub method: String,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReferendumStatus {
    pub end: BlockNumber,
    pub threshold: String,
    #[serde(default)]
    pub delay: Option<BlockNumber>,
    #[serde(default)]
    pub tally: Option<WeightedTally>,
}

/// Everything the chain stage produces for one aggregation run.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainSnapshot {
    pub head: BlockHeader,
    pub timestamp: DateTime<Utc>,
    pub total_issuance: Balance,
    pub referenda: Vec<ChainReferendum>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferendumStats {
    #[serde(deserialize_with = "deserialize_number_or_string")]
    pub index: ReferendumIndex,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub proposer: Option<AccountId>,
    #[serde(default)]
    pub count_aye: u64,
    #[serde(default)]
    pub count_nay: u64,
    #[serde(deserialize_with = "units::deser::balance")]
    pub voted_aye: Balance,
    #[serde(deserialize_with = "units::deser::balance")]
    pub voted_nay: Balance,
    #[serde(default, deserialize_with = "units::deser::option_balance")]
    pub voted_total: Option<Balance>,
}

impl ReferendumStats {
    pub fn tally_stats(&self) -> TallyStats {
        TallyStats {
            voted_aye: self.voted_aye,
            voted_nay: self.voted_nay,
            voted_total: self
                .voted_total
                .unwrap_or_else(|| self.voted_aye.saturating_add(self.voted_nay)),
            vote_count_aye: self.count_aye,
            vote_count_nay: self.count_nay,
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct IndexedReferendum {
    #[serde(deserialize_with = "deserialize_number_or_string")]
    pub index: ReferendumIndex,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndexerPage {
    #[serde(default)]
    pub referendums: Vec<IndexedReferendum>,
    #[serde(default)]
    pub referenda_stats: Vec<ReferendumStats>,
}

impl IndexerPage {
    pub fn indices(&self) -> Vec<ReferendumIndex> {
        self.referendums.iter().map(|r| r.index).collect()
    }

    /// Stats entries are only trusted for referenda listed on the page.
    pub fn listed_stats(self) -> Vec<ReferendumStats> {
        let listed = self.indices().into_iter().collect::<HashSet<_>>();
        self.referenda_stats
            .into_iter()
            .filter(|stats| listed.contains(&stats.index))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerQuery {
    pub ended: bool,
    pub limit: Option<u32>,
}

impl IndexerQuery {
    pub fn active() -> Self {
        Self {
            ended: false,
            limit: None,
        }
    }

    pub fn past(limit: u32) -> Self {
        Self {
            ended: true,
            limit: Some(limit),
        }
    }

    pub fn to_query_body(&self) -> QueryBody<ReferendumsVariables> {
        QueryBody {
            variables: ReferendumsVariables {
                filter: ReferendumFilter {
                    ended_at_is_null: !self.ended,
                },
                order_by: "index_DESC",
                limit: self.limit,
            },
            query: REFERENDUMS_QUERY,
            operation_name: "Referendums",
        }
    }
}

pub const REFERENDUMS_QUERY: &str = r#"query Referendums($where: ReferendumWhereInput, $orderBy: [ReferendumOrderByInput!], $limit: Int) {
  referendums(where: $where, orderBy: $orderBy, limit: $limit) {
    index
  }
  referendaStats(where: $where, orderBy: $orderBy, limit: $limit) {
    index
    endedAt
    proposer
    countAye
    countNay
    votedAye
    votedNay
    votedTotal
  }
}"#;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ReferendumsVariables {
    #[serde(rename = "where")]
    pub filter: ReferendumFilter,
    #[serde(rename = "orderBy")]
    pub order_by: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ReferendumFilter {
    #[serde(rename = "endedAt_isNull")]
    pub ended_at_is_null: bool,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Post {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub onchain_link: OnchainLink,
}

impl Post {
    pub fn referendum_index(&self) -> ReferendumIndex {
        self.onchain_link.onchain_referendum_id
    }

    /// Blank titles are treated as missing.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OnchainLink {
    #[serde(deserialize_with = "deserialize_number_or_string")]
    pub onchain_referendum_id: ReferendumIndex,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct PostsData {
    #[serde(default)]
    pub posts: Vec<Post>,
}

pub const REFERENDUM_POSTS_QUERY: &str = r#"query ReferendumPostAndComments($ids: [Int!]) {
  posts(where: {onchain_link: {onchain_referendum_id: {_in: $ids}}}) {
    ...referendumPost
  }
}
fragment referendumPost on posts {
  content
  created_at
  title
  onchain_link {
    onchain_referendum_id
  }
}"#;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PostsVariables {
    pub ids: Vec<ReferendumIndex>,
}

pub fn posts_query(indices: &[ReferendumIndex]) -> QueryBody<PostsVariables> {
    QueryBody {
        variables: PostsVariables {
            ids: indices.to_vec(),
        },
        query: REFERENDUM_POSTS_QUERY,
        operation_name: "ReferendumPostAndComments",
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizVersion {
    #[serde(deserialize_with = "deserialize_number_or_string")]
    pub version: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub submissions: Vec<QuizSubmission>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,
    #[serde(default)]
    pub answer_options: Vec<String>,
    #[serde(default)]
    pub correct_answer_index: Option<u32>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub wallet: AccountId,
    #[serde(default)]
    pub answers: Vec<u32>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Unwraps a GraphQL response envelope, turning reported errors and missing
/// data into a [`SourceError`].
pub fn unwrap_response<T>(response: Response<T>) -> Result<T, SourceError> {
    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        return Err(SourceError::Query(
            errors.into_iter().map(|error| error.message).collect(),
        ));
    }
    response.data.ok_or(SourceError::NoData)
}
