use crate::units::Balance;
use crate::vote::{NormalizedVote, Side};
use crate::{conviction::Conviction, units};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown threshold kind {0:?}")]
pub struct UnknownThresholdKind(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdKind {
    SuperMajorityApprove,
    SuperMajorityAgainst,
    SimpleMajority,
}

impl FromStr for ThresholdKind {
    type Err = UnknownThresholdKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SuperMajorityApprove" => Ok(ThresholdKind::SuperMajorityApprove),
            "SuperMajorityAgainst" => Ok(ThresholdKind::SuperMajorityAgainst),
            "SimpleMajority" => Ok(ThresholdKind::SimpleMajority),
            other => Err(UnknownThresholdKind(other.to_string())),
        }
    }
}

impl fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Conviction weighted totals. `turnout` is the unweighted capital that took
/// part in the vote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WeightedTally {
    #[serde(deserialize_with = "units::deser::balance")]
    pub ayes: Balance,
    #[serde(deserialize_with = "units::deser::balance")]
    pub nays: Balance,
    #[serde(deserialize_with = "units::deser::balance")]
    pub turnout: Balance,
}

impl WeightedTally {
    pub fn from_votes(votes: &[NormalizedVote]) -> Result<Self, units::Error> {
        votes.iter().try_fold(WeightedTally::default(), |mut tally, vote| {
            let capital = units::to_raw_units(vote.amount)?;
            let weighted = Conviction::votes(vote.conviction, capital);
            match vote.side {
                Side::Aye => tally.ayes = tally.ayes.saturating_add(weighted),
                Side::Nay => tally.nays = tally.nays.saturating_add(weighted),
            }
            tally.turnout = tally.turnout.saturating_add(capital);
            Ok(tally)
        })
    }
}

/// Decides whether a referendum is currently passing under its declared
/// threshold kind. `electorate` is the total issuance.
pub trait PassingThreshold: Send + Sync {
    fn is_passing(&self, kind: ThresholdKind, tally: &WeightedTally, electorate: Balance) -> bool;
}

/// Reports every referendum as passing regardless of its tally.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPassing;

impl PassingThreshold for AlwaysPassing {
    fn is_passing(&self, _kind: ThresholdKind, _tally: &WeightedTally, _electorate: Balance) -> bool {
        true
    }
}

/// Adaptive quorum biasing as defined by the democracy pallet: the lower the
/// turnout, the larger the majority required for the biased side.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveQuorumBiasing;

impl PassingThreshold for AdaptiveQuorumBiasing {
    fn is_passing(&self, kind: ThresholdKind, tally: &WeightedTally, electorate: Balance) -> bool {
        let sqrt_voters = integer_sqrt(tally.turnout);
        let sqrt_electorate = integer_sqrt(electorate);
        if sqrt_voters == 0 {
            return false;
        }
        match kind {
            ThresholdKind::SuperMajorityApprove => {
                compare_rationals(tally.nays, sqrt_voters, tally.ayes, sqrt_electorate)
            }
            ThresholdKind::SuperMajorityAgainst => {
                compare_rationals(tally.nays, sqrt_electorate, tally.ayes, sqrt_voters)
            }
            ThresholdKind::SimpleMajority => tally.ayes > tally.nays,
        }
    }
}

fn integer_sqrt(n: Balance) -> Balance {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = n / 2 + n % 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// `n1 / d1 < n2 / d2` without overflowing, by comparing the continued
/// fraction expansions of both sides.
fn compare_rationals(mut n1: Balance, mut d1: Balance, mut n2: Balance, mut d2: Balance) -> bool {
    if d1 == 0 {
        return false;
    }
    if d2 == 0 {
        return n2 > 0;
    }
    loop {
        let q1 = n1 / d1;
        let q2 = n2 / d2;
        if q1 < q2 {
            return true;
        }
        if q2 < q1 {
            return false;
        }
        let r1 = n1 % d1;
        let r2 = n2 % d2;
        if r2 == 0 {
            return false;
        }
        if r1 == 0 {
            return true;
        }
        n1 = d2;
        n2 = d1;
        d1 = r2;
        d2 = r1;
    }
}
