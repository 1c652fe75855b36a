use super::payload::{
    BlockNumber, ChainReferendum, ChainSnapshot, IndexerPage, Post, QuizSubmission, QuizVersion,
    ReferendumStats,
};
use super::{Error, ProposedBy, ReferendumRecord, Status, UserParticipation};
use crate::referenda::settings::AggregatorSettings;
use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use referenda_lib::vote::{find_account_vote, latest_per_account};
use referenda_lib::{
    normalize_vote, NormalizedVote, PassingThreshold, ReferendumIndex, Tally, ThresholdKind,
    WeightedTally,
};
use std::collections::HashMap;

/// Whatever the secondary sources delivered. Every part may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecondaryData {
    pub indexer: Vec<ReferendumStats>,
    pub posts: Vec<Post>,
    pub quizzes: HashMap<ReferendumIndex, Vec<QuizVersion>>,
}

pub fn estimate_end_date(
    now: DateTime<Utc>,
    head: BlockNumber,
    end: BlockNumber,
    block_duration_ms: u64,
) -> Option<DateTime<Utc>> {
    let remaining = i64::try_from(end)
        .ok()?
        .checked_sub(i64::try_from(head).ok()?)?;
    let millis = remaining.checked_mul(i64::try_from(block_duration_ms).ok()?)?;
    now.checked_add_signed(Duration::milliseconds(millis))
}

/// Highest version is the current quiz. Submissions of all versions are kept,
/// in version order.
pub fn fold_quizzes(versions: &[QuizVersion]) -> (Option<QuizVersion>, Vec<QuizSubmission>) {
    let ordered = versions
        .iter()
        .sorted_by_key(|quiz| quiz.version)
        .collect::<Vec<_>>();
    let submissions = ordered
        .iter()
        .flat_map(|quiz| quiz.submissions.iter().cloned())
        .collect();
    (ordered.last().map(|quiz| (*quiz).clone()), submissions)
}

// first entry per referendum wins
fn first_by_index<T>(
    items: &[T],
    index_of: impl Fn(&T) -> ReferendumIndex,
) -> HashMap<ReferendumIndex, &T> {
    let mut by_index = HashMap::new();
    for item in items {
        by_index.entry(index_of(item)).or_insert(item);
    }
    by_index
}

fn weighted_tally(referendum: &ChainReferendum) -> Result<WeightedTally, Error> {
    if let Some(tally) = referendum.status.tally {
        return Ok(tally);
    }
    let votes = latest_per_account(&referendum.votes)
        .into_iter()
        .map(NormalizedVote::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WeightedTally::from_votes(&votes)?)
}

fn proposed_by(id: Option<String>, settings: &AggregatorSettings) -> ProposedBy {
    let link = id.as_deref().and_then(|id| settings.account_link(id));
    ProposedBy { id, link }
}

pub fn merge_active(
    chain: &ChainSnapshot,
    secondary: &SecondaryData,
    settings: &AggregatorSettings,
    threshold: &dyn PassingThreshold,
    user: Option<&str>,
) -> Result<Vec<ReferendumRecord>, Error> {
    let posts = first_by_index(&secondary.posts, Post::referendum_index);
    let stats = first_by_index(&secondary.indexer, |stats| stats.index);

    chain
        .referenda
        .iter()
        .sorted_by_key(|referendum| referendum.index)
        .dedup_by(|a, b| a.index == b.index)
        .map(|referendum| -> Result<ReferendumRecord, Error> {
            let index = referendum.index;
            let post = posts.get(&index);
            let indexer = stats.get(&index).map(|stats| (*stats).clone());

            let threshold_kind = referendum.status.threshold.parse::<ThresholdKind>()?;
            let passing = threshold.is_passing(
                threshold_kind,
                &weighted_tally(referendum)?,
                chain.total_issuance,
            );

            let (quiz, submissions) = secondary
                .quizzes
                .get(&index)
                .map(|versions| fold_quizzes(versions))
                .unwrap_or_default();

            let user = user
                .map(|account| -> Result<_, Error> {
                    Ok(UserParticipation {
                        vote: normalize_vote(find_account_vote(&referendum.votes, account))?,
                        submitted_quiz: submissions.iter().any(|s| s.wallet == account),
                    })
                })
                .transpose()?;

            let proposer = referendum
                .proposer()
                .cloned()
                .or_else(|| indexer.as_ref().and_then(|stats| stats.proposer.clone()));

            Ok(ReferendumRecord {
                id: index,
                title: post
                    .and_then(|post| post.title())
                    .map(str::to_string)
                    .or_else(|| referendum.call_name()),
                description: post.and_then(|post| post.content.clone()),
                status: Status::Active,
                tally: Tally::from_stats(&referendum.tally_stats())?,
                end_date: estimate_end_date(
                    chain.timestamp,
                    chain.head.number,
                    referendum.status.end,
                    settings.block_duration_ms,
                ),
                proposed_by: proposed_by(proposer, settings),
                threshold_kind: Some(threshold_kind),
                threshold: Some(passing),
                is_passing: referendum.is_passing,
                votes: referendum.votes.clone(),
                quiz,
                submissions,
                indexer,
                user,
            })
        })
        .collect()
}

pub fn merge_past(
    page: IndexerPage,
    posts: &[Post],
    settings: &AggregatorSettings,
) -> Result<Vec<ReferendumRecord>, Error> {
    let posts = first_by_index(posts, Post::referendum_index);

    page.listed_stats()
        .into_iter()
        .sorted_by_key(|stats| stats.index)
        .dedup_by(|a, b| a.index == b.index)
        .map(|stats| -> Result<ReferendumRecord, Error> {
            let post = posts.get(&stats.index);
            Ok(ReferendumRecord {
                id: stats.index,
                title: post.and_then(|post| post.title()).map(str::to_string),
                description: post.and_then(|post| post.content.clone()),
                status: Status::Ended,
                tally: Tally::from_stats(&stats.tally_stats())?,
                end_date: stats.ended_at,
                proposed_by: proposed_by(stats.proposer.clone(), settings),
                threshold_kind: None,
                threshold: None,
                is_passing: None,
                votes: Vec::new(),
                quiz: None,
                submissions: Vec::new(),
                indexer: Some(stats),
                user: None,
            })
        })
        .collect()
}
