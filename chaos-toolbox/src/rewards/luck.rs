use super::bonus::BonusFlags;
use super::Error;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PERCENT_DECIMALS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
}

impl Rarity {
    pub const ALL: [Rarity; 3] = [Rarity::Common, Rarity::Rare, Rarity::Epic];
    /// Tier that absorbs whatever probability the better tiers leave over.
    pub const FLOOR: Rarity = Rarity::Common;
}

/// Percent chance per tier. Always sums to exactly 100.
pub type LuckDistribution = BTreeMap<Rarity, Decimal>;

/// How the stake ratio is mapped before scaling the non floor tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScalingCurve {
    #[default]
    Linear,
    Power { exponent: Decimal },
}

impl ScalingCurve {
    fn apply(&self, ratio: Decimal) -> Decimal {
        match self {
            ScalingCurve::Linear => ratio,
            // tiny ratios underflow the decimal range, their power is zero
            ScalingCurve::Power { exponent } => ratio
                .checked_powd(*exponent)
                .unwrap_or(Decimal::ZERO)
                .clamp(Decimal::ZERO, Decimal::ONE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardConfig {
    /// Stake at which the non floor tiers reach their base weight.
    pub max_value: Decimal,
    pub weights: BTreeMap<Rarity, Decimal>,
    #[serde(default)]
    pub curve: ScalingCurve,
    #[serde(default)]
    pub baby_bonus: Option<Decimal>,
    #[serde(default)]
    pub toddler_bonus: Option<Decimal>,
    #[serde(default)]
    pub adolescent_bonus: Option<Decimal>,
    #[serde(default)]
    pub adult_bonus: Option<Decimal>,
}

impl RewardConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: RewardConfig =
            serde_json::from_str(json).map_err(|e| Error::InvalidTierConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |reason: String| Err(Error::InvalidTierConfig(reason));

        if self.max_value <= Decimal::ZERO {
            return invalid(format!("max value must be positive, got {}", self.max_value));
        }
        for rarity in Rarity::ALL {
            match self.weights.get(&rarity) {
                None => return invalid(format!("missing weight for {:?}", rarity)),
                Some(weight) if weight.is_sign_negative() && !weight.is_zero() => {
                    return invalid(format!("negative weight {} for {:?}", weight, rarity))
                }
                Some(_) => {}
            }
        }
        if self.total_weight().is_zero() {
            return invalid("tier weights sum to zero".to_string());
        }
        if let ScalingCurve::Power { exponent } = self.curve {
            if exponent <= Decimal::ZERO {
                return invalid(format!("curve exponent must be positive, got {}", exponent));
            }
        }
        let bonuses = [
            self.baby_bonus,
            self.toddler_bonus,
            self.adolescent_bonus,
            self.adult_bonus,
        ];
        if let Some(bonus) = bonuses.into_iter().flatten().find(|b| *b <= Decimal::ZERO) {
            return invalid(format!("bonus multiplier must be positive, got {}", bonus));
        }
        Ok(())
    }

    fn weight(&self, rarity: Rarity) -> Decimal {
        self.weights.get(&rarity).copied().unwrap_or_default()
    }

    fn total_weight(&self) -> Decimal {
        self.weights.values().copied().sum()
    }
}

/// Multiplier granted by the equipped bonus item, 1 when nothing is equipped
/// or the config grants nothing for it.
pub fn luck_multiplier(bonus: &BonusFlags, config: &RewardConfig) -> Decimal {
    bonus
        .equipped()
        .and_then(|dragon| dragon.multiplier(config))
        .unwrap_or(Decimal::ONE)
}

/// Chances per tier for a given stake.
///
/// The non floor tiers grow from nothing at zero stake to their base weight at
/// `max_value` (scaled by the bonus multiplier), the floor tier keeps the rest.
pub fn compute_luck_distribution(
    stake: Decimal,
    bonus: &BonusFlags,
    config: &RewardConfig,
) -> Result<LuckDistribution, Error> {
    config.validate()?;

    let ratio = if stake <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        // overflowing means the stake is far above the ceiling
        stake
            .checked_div(config.max_value)
            .unwrap_or(Decimal::ONE)
            .min(Decimal::ONE)
    };
    let scale = config.curve.apply(ratio);
    let multiplier = luck_multiplier(bonus, config);
    let total = config.total_weight();

    let boosted = Rarity::ALL
        .into_iter()
        .filter(|rarity| *rarity != Rarity::FLOOR)
        .map(|rarity| (rarity, config.weight(rarity) * scale * multiplier))
        .collect::<Vec<_>>();
    let boosted_total = boosted.iter().map(|(_, weight)| *weight).sum::<Decimal>();
    let denominator = total.max(boosted_total);

    let mut distribution = boosted
        .into_iter()
        .map(|(rarity, weight)| {
            let percent = (weight / denominator * dec!(100))
                .round_dp_with_strategy(PERCENT_DECIMALS, RoundingStrategy::ToZero);
            (rarity, percent)
        })
        .collect::<LuckDistribution>();
    let allotted = distribution.values().copied().sum::<Decimal>();
    distribution.insert(Rarity::FLOOR, dec!(100) - allotted);
    Ok(distribution)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rewards::bonus::Dragon;
    use crate::utils::assert_are_close;
    use test_strategy::proptest;

    pub(crate) fn config() -> RewardConfig {
        RewardConfig::from_json(
            r#"{
                "maxValue": 50,
                "weights": { "common": 70, "rare": 25, "epic": 5 },
                "babyBonus": 1.05,
                "toddlerBonus": 1.1,
                "adolescentBonus": 1.2,
                "adultBonus": 1.3
            }"#,
        )
        .unwrap()
    }

    fn luck(stake: Decimal, dragon: Option<Dragon>) -> LuckDistribution {
        compute_luck_distribution(stake, &BonusFlags::from(dragon), &config()).unwrap()
    }

    #[test]
    fn zero_stake_is_all_floor() {
        let distribution = luck(Decimal::ZERO, None);
        assert_eq!(distribution[&Rarity::Common], dec!(100));
        assert_eq!(distribution[&Rarity::Rare], Decimal::ZERO);
        assert_eq!(distribution[&Rarity::Epic], Decimal::ZERO);
    }

    #[test]
    fn max_stake_gets_base_weights() {
        let distribution = luck(dec!(50), None);
        assert_eq!(distribution[&Rarity::Common], dec!(70));
        assert_eq!(distribution[&Rarity::Rare], dec!(25));
        assert_eq!(distribution[&Rarity::Epic], dec!(5));
        assert_eq!(luck(dec!(5000), None), distribution);
    }

    #[test]
    fn half_stake_scales_linearly() {
        let distribution = luck(dec!(25), None);
        assert_eq!(distribution[&Rarity::Common], dec!(85));
        assert_eq!(distribution[&Rarity::Rare], dec!(12.5));
        assert_eq!(distribution[&Rarity::Epic], dec!(2.5));
    }

    #[test]
    fn equipped_dragon_boosts_rare_tiers() {
        let distribution = luck(dec!(50), Some(Dragon::Adult));
        assert_eq!(distribution[&Rarity::Common], dec!(61));
        assert_eq!(distribution[&Rarity::Rare], dec!(32.5));
        assert_eq!(distribution[&Rarity::Epic], dec!(6.5));
        assert_eq!(luck_multiplier(&BonusFlags::from(Some(Dragon::Baby)), &config()), dec!(1.05));
        assert_eq!(luck_multiplier(&BonusFlags::default(), &config()), Decimal::ONE);
    }

    #[test]
    fn boost_never_makes_floor_negative() {
        let mut config = config();
        config.weights.insert(Rarity::Common, dec!(1));
        let distribution =
            compute_luck_distribution(dec!(50), &BonusFlags::from(Some(Dragon::Adult)), &config).unwrap();
        assert_eq!(distribution.values().copied().sum::<Decimal>(), dec!(100));
        assert!(distribution[&Rarity::Common] >= Decimal::ZERO);
        assert_are_close(distribution[&Rarity::Rare], dec!(83.3333));
    }

    #[test]
    fn power_curve() {
        let mut config = config();
        config.curve = ScalingCurve::Power { exponent: dec!(2) };
        let distribution =
            compute_luck_distribution(dec!(25), &BonusFlags::default(), &config).unwrap();
        assert_eq!(distribution[&Rarity::Rare], dec!(6.25));
        assert_eq!(distribution[&Rarity::Epic], dec!(1.25));
        assert_eq!(distribution[&Rarity::Common], dec!(92.5));
    }

    #[test]
    fn one_planck_with_fractional_exponent() {
        let mut config = config();
        config.curve = ScalingCurve::Power { exponent: dec!(2.5) };
        let distribution =
            compute_luck_distribution(dec!(0.000000000001), &BonusFlags::default(), &config).unwrap();
        assert_eq!(distribution[&Rarity::Common], dec!(100));
        assert_eq!(distribution[&Rarity::Rare], Decimal::ZERO);
        assert_eq!(distribution[&Rarity::Epic], Decimal::ZERO);
    }

    #[test]
    fn huge_stake_over_tiny_ceiling_clamps() {
        let mut config = config();
        config.max_value = dec!(0.0000001);
        let distribution = compute_luck_distribution(
            dec!(10000000000000000000000),
            &BonusFlags::default(),
            &config,
        )
        .unwrap();
        assert_eq!(distribution[&Rarity::Common], dec!(70));
        assert_eq!(distribution[&Rarity::Rare], dec!(25));
        assert_eq!(distribution[&Rarity::Epic], dec!(5));
    }

    #[test]
    fn negative_stake_is_all_floor() {
        let distribution = luck(dec!(-3), None);
        assert_eq!(distribution[&Rarity::Common], dec!(100));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let reject = |json: &str| {
            assert!(matches!(
                RewardConfig::from_json(json),
                Err(Error::InvalidTierConfig(_))
            ))
        };
        reject(r#"{ "weights": { "common": 70, "rare": 25, "epic": 5 } }"#);
        reject(r#"{ "maxValue": 0, "weights": { "common": 70, "rare": 25, "epic": 5 } }"#);
        reject(r#"{ "maxValue": 50, "weights": { "common": 70, "rare": 25 } }"#);
        reject(r#"{ "maxValue": 50, "weights": { "common": 70, "rare": -1, "epic": 5 } }"#);
        reject(r#"{ "maxValue": 50, "weights": { "common": 0, "rare": 0, "epic": 0 } }"#);
        reject(r#"{ "maxValue": 50, "weights": { "common": 1, "rare": 1, "epic": 1 }, "adultBonus": 0 }"#);
        reject(r#"{ "maxValue": 50, "weights": { "common": 1, "rare": 1, "epic": 1 },
                   "curve": { "kind": "power", "exponent": -2 } }"#);
    }

    #[proptest]
    fn always_sums_to_one_hundred(
        #[strategy(1u32..1_000_000)] max_value: u32,
        #[strategy(0u32..5)] fraction: u32,
        dragon: Option<Dragon>,
        power_curve: bool,
    ) {
        let mut config = config();
        config.max_value = Decimal::from(max_value);
        if power_curve {
            config.curve = ScalingCurve::Power { exponent: dec!(2.5) };
        }
        let stake = match fraction {
            0 => Decimal::ZERO,
            1 => config.max_value / dec!(2),
            2 => config.max_value,
            3 => config.max_value * dec!(10),
            _ => dec!(0.000000000001),
        };
        let distribution = compute_luck_distribution(stake, &BonusFlags::from(dragon), &config).unwrap();
        assert_eq!(distribution.values().copied().sum::<Decimal>(), dec!(100));
        assert!(distribution.values().all(|p| *p >= Decimal::ZERO));
    }
}
