use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Amounts as reported by the chain, in its smallest denomination.
pub type Balance = u128;

pub const DISPLAY_DECIMALS: u32 = 12;
pub const PLANCKS_PER_UNIT: Balance = 1_000_000_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("amount {0} is negative")]
    NegativeAmount(Decimal),
    #[error("Value overflowed its maximum value")]
    Overflow,
}

pub fn to_display_units(raw: Balance) -> Result<Decimal, Error> {
    let raw = i128::try_from(raw).map_err(|_| Error::Overflow)?;
    Decimal::try_from_i128_with_scale(raw, DISPLAY_DECIMALS)
        .map(|value| value.normalize())
        .map_err(|_| Error::Overflow)
}

/// Anything below one planck is truncated.
pub fn to_raw_units(value: Decimal) -> Result<Balance, Error> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::NegativeAmount(value));
    }
    let mut raw = value
        .checked_mul(Decimal::from(PLANCKS_PER_UNIT as u64))
        .ok_or(Error::Overflow)?
        .trunc();
    raw.rescale(0);
    Balance::try_from(raw.mantissa()).map_err(|_| Error::Overflow)
}

pub fn format_display(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

pub mod deser {
    use super::Balance;
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;

    struct BalanceVisitor;

    impl<'de> Visitor<'de> for BalanceVisitor {
        type Value = Balance;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non negative integer, a decimal string or a 0x prefixed hex string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.into())
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Balance::try_from(v).map_err(|_| E::custom(format!("negative balance {}", v)))
        }

        // Large balances are usually encoded as strings, either in decimal or
        // in the hex form the chain codec produces
        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let parsed = match v.strip_prefix("0x") {
                Some(hex) => Balance::from_str_radix(hex, 16),
                None => v.parse::<Balance>(),
            };
            parsed.map_err(|e| E::custom(format!("invalid balance {:?}: {}", v, e)))
        }
    }

    pub fn balance<'de, D>(deserializer: D) -> Result<Balance, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BalanceVisitor)
    }

    pub fn option_balance<'de, D>(deserializer: D) -> Result<Option<Balance>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct Wrapped(#[serde(deserialize_with = "balance")] Balance);

        let wrapped: Option<Wrapped> = serde::Deserialize::deserialize(deserializer)?;
        Ok(wrapped.map(|Wrapped(balance)| balance))
    }
}
