use crate::units::{self, to_display_units, Balance};
use crate::vote::{NormalizedVote, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rounded (half up) integer percentage of `part` over `whole`.
///
/// There is no meaningful split of an empty vote, so `None` is returned when
/// `whole` is zero rather than a misleading 0%. Amounts too large to scale
/// also give `None`.
pub fn percentage(part: Balance, whole: Balance) -> Option<u32> {
    if whole == 0 {
        return None;
    }
    let integral = (part / whole).checked_mul(100)?;
    let fractional = (part % whole)
        .checked_mul(200)?
        .checked_add(whole)?
        / whole.checked_mul(2)?;
    u32::try_from(integral.checked_add(fractional)?).ok()
}

/// Pre-aggregated vote totals, in raw units, as reported by the chain or the
/// indexer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[cfg_attr(any(test, feature = "proptest"), derive(test_strategy::Arbitrary))]
pub struct TallyStats {
    #[cfg_attr(any(test, feature = "proptest"), strategy(0u128..1_000_000_000_000_000_000_000))]
    pub voted_aye: Balance,
    #[cfg_attr(any(test, feature = "proptest"), strategy(0u128..1_000_000_000_000_000_000_000))]
    pub voted_nay: Balance,
    /// Grand total as reported by the source, possibly including abstentions.
    #[cfg_attr(any(test, feature = "proptest"), strategy(0u128..1_000_000_000_000_000_000_000))]
    pub voted_total: Balance,
    pub vote_count_aye: u64,
    pub vote_count_nay: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideTally {
    pub vote_count: u64,
    pub percentage: Option<u32>,
    pub vote_volume: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub vote_volume: Decimal,
    pub aye: SideTally,
    pub nay: SideTally,
}

impl Tally {
    pub fn from_stats(stats: &TallyStats) -> Result<Self, units::Error> {
        // abstentions are part of the reported total but never of the split
        let voted = stats
            .voted_aye
            .checked_add(stats.voted_nay)
            .ok_or(units::Error::Overflow)?;
        Ok(Self {
            vote_volume: to_display_units(stats.voted_total)?,
            aye: SideTally {
                vote_count: stats.vote_count_aye,
                percentage: percentage(stats.voted_aye, voted),
                vote_volume: to_display_units(stats.voted_aye)?,
            },
            nay: SideTally {
                vote_count: stats.vote_count_nay,
                percentage: percentage(stats.voted_nay, voted),
                vote_volume: to_display_units(stats.voted_nay)?,
            },
        })
    }

    /// Callers are expected to collapse repeated casts of the same account
    /// beforehand.
    pub fn from_votes(votes: &[NormalizedVote]) -> Result<Self, units::Error> {
        Self::from_stats(&TallyStats::from_votes(votes)?)
    }
}

impl TallyStats {
    pub fn from_votes(votes: &[NormalizedVote]) -> Result<Self, units::Error> {
        votes.iter().try_fold(TallyStats::default(), |mut stats, vote| {
            let capital = units::to_raw_units(vote.amount)?;
            let (volume, count) = match vote.side {
                Side::Aye => (&mut stats.voted_aye, &mut stats.vote_count_aye),
                Side::Nay => (&mut stats.voted_nay, &mut stats.vote_count_nay),
            };
            *volume = volume.checked_add(capital).ok_or(units::Error::Overflow)?;
            *count += 1;
            stats.voted_total = stats
                .voted_total
                .checked_add(capital)
                .ok_or(units::Error::Overflow)?;
            Ok(stats)
        })
    }
}
