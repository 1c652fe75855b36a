use super::luck::{compute_luck_distribution, LuckDistribution, RewardConfig};
use super::Error;
use referenda_lib::units::{self, to_display_units, Balance};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("unknown dragon {0:?}")]
pub struct UnknownDragon(pub String);

/// Bonus items a voter can equip. Only one can be equipped at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "lowercase")]
pub enum Dragon {
    Baby,
    Toddler,
    Adolescent,
    Adult,
}

impl Dragon {
    pub const ALL: [Dragon; 4] = [Dragon::Baby, Dragon::Toddler, Dragon::Adolescent, Dragon::Adult];

    pub fn multiplier(&self, config: &RewardConfig) -> Option<Decimal> {
        match self {
            Dragon::Baby => config.baby_bonus,
            Dragon::Toddler => config.toddler_bonus,
            Dragon::Adolescent => config.adolescent_bonus,
            Dragon::Adult => config.adult_bonus,
        }
    }
}

impl FromStr for Dragon {
    type Err = UnknownDragon;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baby" | "babyequipped" => Ok(Dragon::Baby),
            "toddler" | "toddlerequipped" => Ok(Dragon::Toddler),
            "adolescent" | "adolescentequipped" => Ok(Dragon::Adolescent),
            "adult" | "adultequipped" => Ok(Dragon::Adult),
            _ => Err(UnknownDragon(s.to_string())),
        }
    }
}

impl fmt::Display for Dragon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dragon::Baby => "baby",
            Dragon::Toddler => "toddler",
            Dragon::Adolescent => "adolescent",
            Dragon::Adult => "adult",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BonusFlags {
    equipped: Option<Dragon>,
}

impl From<Option<Dragon>> for BonusFlags {
    fn from(equipped: Option<Dragon>) -> Self {
        Self { equipped }
    }
}

impl BonusFlags {
    /// Parses the `dragonEquipped` value recorded at send-out time. Anything
    /// unrecognised means nothing was equipped.
    pub fn from_equipped(value: Option<&str>) -> Self {
        value.and_then(|value| value.parse().ok()).into()
    }

    pub fn equipped(&self) -> Option<Dragon> {
        self.equipped
    }

    pub fn is_equipped(&self, dragon: Dragon) -> bool {
        self.equipped == Some(dragon)
    }

    /// Equipping a dragon unequips any other.
    pub fn equip(&mut self, dragon: Dragon) {
        self.equipped = Some(dragon);
    }

    pub fn unequip(&mut self) {
        self.equipped = None;
    }

    /// Checkbox semantics: checking equips `dragon` alone, unchecking leaves
    /// nothing equipped.
    pub fn set(&mut self, dragon: Dragon, checked: bool) {
        self.equipped = checked.then_some(dragon);
    }
}

/// What was considered for a voter when rewards were sent out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDistribution {
    #[serde(deserialize_with = "units::deser::balance")]
    pub amount_considered: Balance,
    #[serde(default)]
    pub dragon_equipped: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStakeInput {
    pub staked_amount: Decimal,
    pub bonus: BonusFlags,
}

impl UserStakeInput {
    pub fn from_distribution(distribution: &UserDistribution) -> Result<Self, Error> {
        Ok(Self {
            staked_amount: to_display_units(distribution.amount_considered)?,
            bonus: BonusFlags::from_equipped(distribution.dragon_equipped.as_deref()),
        })
    }

    pub fn luck(&self, config: &RewardConfig) -> Result<LuckDistribution, Error> {
        compute_luck_distribution(self.staked_amount, &self.bonus, config)
    }
}
