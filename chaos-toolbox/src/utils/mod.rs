pub mod serde;

#[cfg(test)]
pub fn assert_are_close(a: rust_decimal::Decimal, b: rust_decimal::Decimal) {
    const DECIMAL_PRECISION: u32 = 10;
    assert_eq!(a.round_dp(DECIMAL_PRECISION), b.round_dp(DECIMAL_PRECISION));
}
