use crate::units::Balance;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ENACTMENT_PERIOD_DAYS: u32 = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown conviction tag {0:?}")]
pub struct UnknownConvictionTag(pub String);

/// Voting-power multiplier chosen by a voter in exchange for locking the
/// voted balance for a number of enactment periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(any(test, feature = "proptest"), derive(test_strategy::Arbitrary))]
pub enum Conviction {
    None,
    Locked1x,
    Locked2x,
    Locked3x,
    Locked4x,
    Locked5x,
    Locked6x,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvictionEntry {
    pub tag: Conviction,
    pub multiplier: Decimal,
    pub lock_periods: u32,
    pub lock_period_days: u32,
    pub label: &'static str,
}

impl Conviction {
    pub const ALL: [Conviction; 7] = [
        Conviction::None,
        Conviction::Locked1x,
        Conviction::Locked2x,
        Conviction::Locked3x,
        Conviction::Locked4x,
        Conviction::Locked5x,
        Conviction::Locked6x,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Conviction::None => "None",
            Conviction::Locked1x => "Locked1x",
            Conviction::Locked2x => "Locked2x",
            Conviction::Locked3x => "Locked3x",
            Conviction::Locked4x => "Locked4x",
            Conviction::Locked5x => "Locked5x",
            Conviction::Locked6x => "Locked6x",
        }
    }

    pub fn multiplier(self) -> Decimal {
        match self {
            Conviction::None => dec!(0.1),
            Conviction::Locked1x => dec!(1),
            Conviction::Locked2x => dec!(2),
            Conviction::Locked3x => dec!(3),
            Conviction::Locked4x => dec!(4),
            Conviction::Locked5x => dec!(5),
            Conviction::Locked6x => dec!(6),
        }
    }

    /// Number of enactment periods the balance stays locked after the vote.
    pub fn lock_periods(self) -> u32 {
        match self {
            Conviction::None => 0,
            Conviction::Locked1x => 1,
            Conviction::Locked2x => 2,
            Conviction::Locked3x => 4,
            Conviction::Locked4x => 8,
            Conviction::Locked5x => 16,
            Conviction::Locked6x => 32,
        }
    }

    pub fn lock_period_days(self) -> u32 {
        self.lock_periods() * ENACTMENT_PERIOD_DAYS
    }

    pub fn label(self) -> &'static str {
        match self {
            Conviction::None => "0.1x - no lockup",
            Conviction::Locked1x => "1x - locked for 1 enactment period (8 days)",
            Conviction::Locked2x => "2x - locked for 2 enactment periods (16 days)",
            Conviction::Locked3x => "3x - locked for 4 enactment periods (32 days)",
            Conviction::Locked4x => "4x - locked for 8 enactment periods (64 days)",
            Conviction::Locked5x => "5x - locked for 16 enactment periods (128 days)",
            Conviction::Locked6x => "6x - locked for 32 enactment periods (256 days)",
        }
    }

    pub fn entry(self) -> ConvictionEntry {
        ConvictionEntry {
            tag: self,
            multiplier: self.multiplier(),
            lock_periods: self.lock_periods(),
            lock_period_days: self.lock_period_days(),
            label: self.label(),
        }
    }

    /// Conviction-weighted votes for the given capital, in raw units.
    /// Unlocked votes count for a tenth of their capital.
    pub fn votes(self, capital: Balance) -> Balance {
        match self {
            Conviction::None => capital / 10,
            locked => capital.saturating_mul(locked.lock_multiplier()),
        }
    }

    fn lock_multiplier(self) -> Balance {
        match self {
            Conviction::None => 0,
            Conviction::Locked1x => 1,
            Conviction::Locked2x => 2,
            Conviction::Locked3x => 3,
            Conviction::Locked4x => 4,
            Conviction::Locked5x => 5,
            Conviction::Locked6x => 6,
        }
    }
}

pub fn multiplier_for(tag: &str) -> Result<Decimal, UnknownConvictionTag> {
    tag.parse::<Conviction>().map(Conviction::multiplier)
}

impl FromStr for Conviction {
    type Err = UnknownConvictionTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Conviction::ALL
            .into_iter()
            .find(|conviction| conviction.tag() == s)
            .ok_or_else(|| UnknownConvictionTag(s.to_string()))
    }
}

impl fmt::Display for Conviction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for Conviction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for Conviction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag: String = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{assert_de_tokens_error, assert_tokens, Token};
    use test_strategy::proptest;

    #[test]
    fn multipliers_match_the_fixed_table() {
        let multipliers = Conviction::ALL
            .iter()
            .map(|c| c.multiplier())
            .collect::<Vec<_>>();
        assert_eq!(
            multipliers,
            vec![dec!(0.1), dec!(1), dec!(2), dec!(3), dec!(4), dec!(5), dec!(6)]
        );
    }

    #[test]
    fn multipliers_are_monotonic() {
        for pair in Conviction::ALL.windows(2) {
            assert!(pair[0].multiplier() <= pair[1].multiplier());
            assert!(pair[0].lock_periods() <= pair[1].lock_periods());
        }
    }

    #[test]
    fn multiplier_for_known_tags() {
        assert_eq!(multiplier_for("None").unwrap(), dec!(0.1));
        assert_eq!(multiplier_for("Locked6x").unwrap(), dec!(6));
    }

    #[test]
    fn unknown_tags_are_surfaced() {
        for tag in ["", "none", "Locked7x", "Locked0.1x", " Locked1x"] {
            assert_eq!(
                multiplier_for(tag),
                Err(UnknownConvictionTag(tag.to_string()))
            );
        }
    }

    #[test]
    fn lock_days_follow_enactment_periods() {
        assert_eq!(Conviction::None.lock_period_days(), 0);
        assert_eq!(Conviction::Locked3x.lock_period_days(), 32);
        assert_eq!(Conviction::Locked6x.lock_period_days(), 256);
        assert_eq!(
            Conviction::Locked2x.entry().label,
            "2x - locked for 2 enactment periods (16 days)"
        );
    }

    #[test]
    fn weighted_votes() {
        assert_eq!(Conviction::None.votes(1_000), 100);
        assert_eq!(Conviction::Locked1x.votes(1_000), 1_000);
        assert_eq!(Conviction::Locked6x.votes(1_000), 6_000);
    }

    #[test]
    fn serde_uses_the_chain_tag() {
        assert_tokens(&Conviction::Locked4x, &[Token::Str("Locked4x")]);
        assert_de_tokens_error::<Conviction>(
            &[Token::Str("Locked9x")],
            "unknown conviction tag \"Locked9x\"",
        );
    }

    #[proptest]
    fn tag_round_trips(conviction: Conviction) {
        assert_eq!(conviction.to_string().parse::<Conviction>().unwrap(), conviction);
        assert_eq!(
            multiplier_for(conviction.tag()).unwrap(),
            conviction.multiplier()
        );
    }
}
