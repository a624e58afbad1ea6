use crate::types::{Amount, Bps, BPS_U64};
use crate::{LedgerError, Result};

pub fn add_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b)
        .ok_or_else(|| LedgerError::Overflow("u64 overflow in add".into()))
}

pub fn sub_u64(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b)
        .ok_or_else(|| LedgerError::Overflow("u64 underflow in sub".into()))
}

pub fn add_amount(a: Amount, b: Amount) -> Result<Amount> {
    add_u64(a.get(), b.get()).map(Amount::new)
}

pub fn sub_amount(a: Amount, b: Amount) -> Result<Amount> {
    sub_u64(a.get(), b.get()).map(Amount::new)
}

/// `floor(a * b / denom)` with the product widened to u128.
pub fn mul_div_floor_u64(a: u64, b: u64, denom: u64) -> Result<u64> {
    if denom == 0 {
        return Err(LedgerError::InvalidAmount("division by zero".into()));
    }
    let num = (a as u128)
        .checked_mul(b as u128)
        .ok_or_else(|| LedgerError::Overflow("u128 overflow in mul".into()))?;
    let out = num / (denom as u128);
    u64::try_from(out).map_err(|_| LedgerError::Overflow("u64 overflow in div".into()))
}

pub fn floor_bps(amount: Amount, bps: Bps) -> Result<Amount> {
    mul_div_floor_u64(amount.get(), bps.as_u64(), BPS_U64).map(Amount::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_overflow_is_error() {
        assert!(add_u64(u64::MAX, 1).is_err());
        assert_eq!(add_u64(2, 3).unwrap(), 5);
    }

    #[test]
    fn sub_underflow_is_error() {
        assert!(sub_u64(1, 2).is_err());
        assert_eq!(sub_u64(3, 3).unwrap(), 0);
    }

    #[test]
    fn mul_div_rejects_zero_denominator() {
        assert!(mul_div_floor_u64(1, 1, 0).is_err());
    }

    proptest! {
        #[test]
        fn floor_bps_never_exceeds_amount(amt in 0u64..u64::MAX / 2, bps in 0u16..=10_000u16) {
            let out = floor_bps(Amount::new(amt), Bps::new(bps).unwrap()).unwrap();
            prop_assert!(out.get() <= amt);
        }

        #[test]
        fn mul_div_is_monotone_in_a(
            a1 in 0u64..1_000_000_000u64,
            a2 in 0u64..1_000_000_000u64,
            b in 0u64..1_000_000u64,
            denom in 1u64..1_000_000u64,
        ) {
            let (lo, hi) = if a1 <= a2 { (a1, a2) } else { (a2, a1) };
            let r_lo = mul_div_floor_u64(lo, b, denom).unwrap();
            let r_hi = mul_div_floor_u64(hi, b, denom).unwrap();
            prop_assert!(r_lo <= r_hi);
        }
    }
}
