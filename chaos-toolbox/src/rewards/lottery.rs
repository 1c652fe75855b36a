use super::luck::{LuckDistribution, Rarity, PERCENT_DECIMALS};
use super::Error;
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::{ChaCha8Rng, ChaChaRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub type Seed = <ChaChaRng as SeedableRng>::Seed;

/// Draws one tier according to its chance. The same distribution and seed
/// always draw the same tier.
pub fn draw_rarity(distribution: &LuckDistribution, seed: Seed) -> Result<Rarity, Error> {
    // chances are whole numbers once expressed in units of the last kept decimal
    let unit = Decimal::from(10u64.pow(PERCENT_DECIMALS));
    let (tiers, weights): (Vec<Rarity>, Vec<u64>) = distribution
        .iter()
        .map(|(rarity, percent)| {
            (percent * unit)
                .trunc()
                .to_u64()
                .map(|weight| (*rarity, weight))
                .ok_or_else(|| Error::Draw(format!("invalid chance {} for {:?}", percent, rarity)))
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .unzip();

    let index = WeightedIndex::new(&weights).map_err(|e| Error::Draw(e.to_string()))?;
    let mut rng = ChaCha8Rng::from_seed(seed);
    Ok(tiers[index.sample(&mut rng)])
}
