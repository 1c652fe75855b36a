//! Reward tier chances derived from a voter's considered stake and the bonus
//! item they had equipped.

pub mod bonus;
pub mod lottery;
pub mod luck;

pub use bonus::{BonusFlags, Dragon, UnknownDragon, UserDistribution, UserStakeInput};
pub use lottery::{draw_rarity, Seed};
pub use luck::{
    compute_luck_distribution, luck_multiplier, LuckDistribution, Rarity, RewardConfig,
    ScalingCurve,
};

use crate::referenda::sources::{SourceError, SourceKind};
use referenda_lib::{units, ReferendumIndex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid reward config: {0}")]
    InvalidTierConfig(String),
    #[error("{kind} unavailable")]
    SourceUnavailable {
        kind: SourceKind,
        #[source]
        error: SourceError,
    },
    #[error("cannot draw a reward tier: {0}")]
    Draw(String),
    #[error(transparent)]
    Units(#[from] units::Error),
}

/// Reward configuration published for each referendum.
#[async_trait::async_trait]
pub trait RewardConfigSource: Send + Sync {
    async fn reward_config(&self, index: ReferendumIndex) -> Result<RewardConfig, SourceError>;
}

pub async fn luck_for_referendum(
    source: &dyn RewardConfigSource,
    index: ReferendumIndex,
    input: &UserStakeInput,
) -> Result<LuckDistribution, Error> {
    let config = source
        .reward_config(index)
        .await
        .map_err(|error| Error::SourceUnavailable {
            kind: SourceKind::RewardConfig,
            error,
        })?;
    input.luck(&config)
}
