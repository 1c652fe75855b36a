pub mod conviction;
pub mod tally;
pub mod threshold;
pub mod units;
pub mod vote;

pub use conviction::{multiplier_for, Conviction, ConvictionEntry, UnknownConvictionTag};
pub use tally::{percentage, SideTally, Tally, TallyStats};
pub use threshold::{
    AdaptiveQuorumBiasing, AlwaysPassing, PassingThreshold, ThresholdKind, UnknownThresholdKind,
    WeightedTally,
};
pub use units::{Balance, PLANCKS_PER_UNIT};
pub use vote::{normalize_vote, AccountId, NormalizedVote, RawVote, Side};

pub type ReferendumIndex = u32;
