use crate::conviction::{Conviction, UnknownConvictionTag};
use crate::units::{self, to_display_units, Balance};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub type AccountId = String;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Conviction(#[from] UnknownConvictionTag),
    #[error(transparent)]
    Units(#[from] units::Error),
}

/// A vote entry as exposed by the chain for a single account.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawVote {
    pub account_id: AccountId,
    #[serde(deserialize_with = "units::deser::balance")]
    pub balance: Balance,
    #[serde(default)]
    pub is_delegating: bool,
    pub vote: RawVoteDirection,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawVoteDirection {
    pub is_aye: bool,
    /// Kept as the raw chain tag so that protocol mismatches surface while
    /// normalizing instead of while decoding the whole referendum.
    pub conviction: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Aye,
    Nay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedVote {
    pub account_id: AccountId,
    pub side: Side,
    pub amount: Decimal,
    pub conviction: Conviction,
}

impl NormalizedVote {
    pub fn voting_power(&self) -> Decimal {
        self.amount * self.conviction.multiplier()
    }
}

impl TryFrom<&RawVote> for NormalizedVote {
    type Error = Error;

    fn try_from(raw: &RawVote) -> Result<Self, Self::Error> {
        Ok(Self {
            account_id: raw.account_id.clone(),
            side: if raw.vote.is_aye { Side::Aye } else { Side::Nay },
            amount: to_display_units(raw.balance)?,
            conviction: raw.vote.conviction.parse()?,
        })
    }
}

/// "Did not vote" stays `None`, it is never turned into an empty vote.
pub fn normalize_vote(raw: Option<&RawVote>) -> Result<Option<NormalizedVote>, Error> {
    raw.map(NormalizedVote::try_from).transpose()
}

/// Collapses repeated casts so that only the most recent entry of each
/// account is kept. Entries keep the relative order of their last occurrence.
pub fn latest_per_account(votes: &[RawVote]) -> Vec<&RawVote> {
    let last_seen = votes
        .iter()
        .enumerate()
        .map(|(position, vote)| (vote.account_id.as_str(), position))
        .collect::<HashMap<_, _>>();
    votes
        .iter()
        .enumerate()
        .filter(|(position, vote)| last_seen.get(vote.account_id.as_str()) == Some(position))
        .map(|(_, vote)| vote)
        .collect()
}

pub fn find_account_vote<'a>(votes: &'a [RawVote], account: &str) -> Option<&'a RawVote> {
    votes.iter().rev().find(|vote| vote.account_id == account)
}
