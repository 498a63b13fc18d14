//! # Tariff Resolver
//!
//! Turns a rate plan and a membership into the effective hourly rate.
//!
//! ```text
//! Tariff { base_rate: $100.00 }  ──┐
//!                                  ├──► resolve_rate() ──► $90.00 / h
//! Membership { premium, 10% }  ────┘
//! ```
//!
//! `effective = base × (1 − discount / 100)`, rounded once to cents.

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, RoundingMode};
use crate::types::{Membership, MembershipTier, Tariff};

/// Resolves the effective hourly rate with round-half-up.
///
/// ## Example
/// ```rust
/// use rcreyes_core::tariff::resolve_rate;
/// use rcreyes_core::{Membership, MembershipTier, Tariff};
///
/// let tariff = Tariff::new("general", "Pista general", 10000);
/// let rate = resolve_rate(&tariff, &Membership::from_tier(MembershipTier::Premium)).unwrap();
/// assert_eq!(rate.cents(), 9000);
/// ```
pub fn resolve_rate(tariff: &Tariff, membership: &Membership) -> CoreResult<Money> {
    resolve_rate_with(tariff, membership, RoundingMode::HalfUp)
}

/// Resolves the effective hourly rate with an explicit rounding mode.
///
/// ## Errors
/// `InvalidTariff` when the base rate is negative or the discount is not
/// one of the tier discounts (0, 5, 10, 15).
pub fn resolve_rate_with(
    tariff: &Tariff,
    membership: &Membership,
    rounding: RoundingMode,
) -> CoreResult<Money> {
    validate_tariff(tariff)?;
    validate_discount(membership.discount_percent)?;

    Ok(tariff
        .base_rate()
        .apply_percent_discount(membership.discount_percent, rounding))
}

/// Checks that a tariff can be billed against.
pub fn validate_tariff(tariff: &Tariff) -> CoreResult<()> {
    if tariff.base_rate_cents < 0 {
        return Err(CoreError::InvalidTariff {
            reason: format!(
                "base rate of tariff {} is negative ({})",
                tariff.id,
                tariff.base_rate()
            ),
        });
    }
    Ok(())
}

/// Checks that a discount belongs to the membership tier table.
pub fn validate_discount(percent: u8) -> CoreResult<()> {
    if MembershipTier::ALL
        .iter()
        .any(|tier| tier.discount_percent() == percent)
    {
        return Ok(());
    }

    Err(CoreError::InvalidTariff {
        reason: format!(
            "membership discount {}% is not one of {:?}",
            percent,
            MembershipTier::ALL.map(|t| t.discount_percent())
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tariff(cents: i64) -> Tariff {
        Tariff::new("general", "Pista general", cents)
    }

    #[test]
    fn test_rate_per_tier() {
        let t = tariff(10000);
        let rates: Vec<i64> = MembershipTier::ALL
            .iter()
            .map(|tier| resolve_rate(&t, &Membership::from_tier(*tier)).unwrap().cents())
            .collect();
        assert_eq!(rates, vec![10000, 9500, 9000, 8500]);
    }

    #[test]
    fn test_rate_rounds_half_up() {
        // $0.30 × 95% = 28.5 cents
        let rate = resolve_rate(&tariff(30), &Membership::from_tier(MembershipTier::Basic)).unwrap();
        assert_eq!(rate.cents(), 29);

        let rate = resolve_rate_with(
            &tariff(30),
            &Membership::from_tier(MembershipTier::Basic),
            RoundingMode::HalfEven,
        )
        .unwrap();
        assert_eq!(rate.cents(), 28);
    }

    #[test]
    fn test_resolve_is_pure() {
        let t = tariff(8750);
        let m = Membership::from_tier(MembershipTier::Vip);
        let first = resolve_rate(&t, &m).unwrap();
        for _ in 0..10 {
            assert_eq!(resolve_rate(&t, &m).unwrap(), first);
        }
    }

    #[test]
    fn test_free_tariff_allowed() {
        assert!(resolve_rate(&tariff(0), &Membership::none()).unwrap().is_zero());
    }

    #[test]
    fn test_negative_base_rate_rejected() {
        let err = resolve_rate(&tariff(-100), &Membership::none()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTariff { .. }));
    }

    #[test]
    fn test_unknown_discount_rejected() {
        let membership = Membership {
            id: Some("m-1".to_string()),
            tier: MembershipTier::Premium,
            discount_percent: 12,
        };
        let err = resolve_rate(&tariff(10000), &membership).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTariff { .. }));
        assert!(err.to_string().contains("12%"));
    }
}
