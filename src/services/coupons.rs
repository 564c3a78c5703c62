use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::{
    error::{AppError, AppResult},
    models::{Coupon, CouponQuote, CouponType, NewCoupon, PricedLine},
};

/// Reasons a coupon cannot be applied to a cart
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CouponRejection {
    #[error("coupon is not active")]
    Inactive,
    #[error("coupon is not valid yet")]
    NotYetActive,
    #[error("coupon has expired")]
    Expired,
    #[error("coupon usage limit reached")]
    UsageLimitReached,
    #[error("order total must be at least {minimum:.2}")]
    MinimumNotMet { minimum: f64 },
    #[error("coupon does not apply to any item in the cart")]
    NotApplicable,
}

/// Discount and resulting total for a single cart amount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountBreakdown {
    pub discount: f64,
    pub final_total: f64,
}

/// Decimal places kept when reading `f64` inputs, enough to undo binary noise
const INPUT_SCALE: u32 = 6;

/// Rounds a currency amount to cents, half away from zero
pub fn round_currency(amount: f64) -> f64 {
    to_amount(money(amount))
}

/// Reads an `f64` amount as the decimal it was written as (`20.1`, not `20.099999...`)
fn money(amount: f64) -> Decimal {
    Decimal::from_f64(amount)
        .map(|value| value.round_dp(INPUT_SCALE))
        .unwrap_or(Decimal::ZERO)
}

/// Rounds to cents and converts back through integer cents
fn to_amount(value: Decimal) -> f64 {
    let cents = to_cents(value) * Decimal::ONE_HUNDRED;
    cents.to_i64().unwrap_or(0) as f64 / 100.0
}

/// Computes the discount a coupon grants on `cart_total`
///
/// Pure and infallible: a coupon of unknown type grants nothing, and the
/// discount never exceeds the cart total or the coupon's cap.
pub fn calculate_discount(coupon: &Coupon, cart_total: f64) -> DiscountBreakdown {
    let (discount, final_total) = discount_on(coupon, money(cart_total));
    DiscountBreakdown {
        discount: to_amount(discount),
        final_total: to_amount(final_total),
    }
}

/// Discount and remaining total, both already rounded to cents
fn discount_on(coupon: &Coupon, cart_total: Decimal) -> (Decimal, Decimal) {
    let cart_total = cart_total.max(Decimal::ZERO);

    let raw = match coupon.coupon_type {
        CouponType::Percentage => {
            let discount = cart_total * money(coupon.value) / Decimal::ONE_HUNDRED;
            match coupon.maximum_discount {
                Some(cap) => discount.min(money(cap)),
                None => discount,
            }
        }
        CouponType::FixedAmount => money(coupon.value).min(cart_total),
        CouponType::Unknown => Decimal::ZERO,
    };

    let discount = to_cents(raw.clamp(Decimal::ZERO, cart_total));
    let final_total = to_cents(cart_total - discount).max(Decimal::ZERO);
    (discount, final_total)
}

fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Checks the coupon's state against the cart and returns the eligible subtotal
///
/// Checks run in a fixed order so the first failing constraint is reported.
pub fn validate_coupon(
    coupon: &Coupon,
    lines: &[PricedLine],
    now: DateTime<Utc>,
) -> Result<f64, CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }
    if coupon.starts_at.is_some_and(|starts| starts > now) {
        return Err(CouponRejection::NotYetActive);
    }
    if coupon.expires_at.is_some_and(|expires| expires <= now) {
        return Err(CouponRejection::Expired);
    }
    if coupon.is_exhausted() {
        return Err(CouponRejection::UsageLimitReached);
    }

    let cart_total = cart_total(lines);
    if let Some(minimum) = coupon.minimum_order_amount {
        if cart_total < money(minimum) {
            return Err(CouponRejection::MinimumNotMet { minimum });
        }
    }

    let eligible = eligible_subtotal(coupon, lines);
    if eligible <= Decimal::ZERO {
        return Err(CouponRejection::NotApplicable);
    }

    Ok(to_amount(eligible))
}

/// Validates the coupon and prices the cart with it applied
pub fn quote(
    coupon: &Coupon,
    lines: &[PricedLine],
    now: DateTime<Utc>,
) -> Result<CouponQuote, CouponRejection> {
    validate_coupon(coupon, lines, now)?;
    let total = cart_total(lines);
    let eligible = eligible_subtotal(coupon, lines);
    let (discount, _) = discount_on(coupon, eligible);

    Ok(CouponQuote {
        code: coupon.code.clone(),
        cart_total: to_amount(total),
        eligible_subtotal: to_amount(eligible),
        discount: to_amount(discount),
        final_total: to_amount((total - discount).max(Decimal::ZERO)),
    })
}

/// Rejects admin coupon definitions that could never discount sensibly
pub fn check_new_coupon(new: &NewCoupon) -> AppResult<()> {
    if new.code.trim().is_empty() {
        return Err(AppError::InvalidInput("coupon code must not be empty".to_string()));
    }
    if new.coupon_type == CouponType::Unknown {
        return Err(AppError::InvalidInput(
            "coupon_type must be percentage or fixed_amount".to_string(),
        ));
    }
    if !new.value.is_finite() || new.value < 0.0 {
        return Err(AppError::InvalidInput("value must be a non-negative number".to_string()));
    }
    if new.coupon_type == CouponType::Percentage && new.value > 100.0 {
        return Err(AppError::InvalidInput("percentage value must be at most 100".to_string()));
    }
    if new.maximum_discount.is_some_and(|cap| cap < 0.0) {
        return Err(AppError::InvalidInput("maximum_discount must not be negative".to_string()));
    }
    if new.usage_limit.is_some_and(|limit| limit < 0) {
        return Err(AppError::InvalidInput("usage_limit must not be negative".to_string()));
    }
    if let (Some(starts), Some(expires)) = (new.starts_at, new.expires_at) {
        if expires <= starts {
            return Err(AppError::InvalidInput("expires_at must be after starts_at".to_string()));
        }
    }
    Ok(())
}

fn line_subtotal(line: &PricedLine) -> Decimal {
    money(line.unit_price) * Decimal::from(line.quantity)
}

fn cart_total(lines: &[PricedLine]) -> Decimal {
    to_cents(lines.iter().map(line_subtotal).sum())
}

fn eligible_subtotal(coupon: &Coupon, lines: &[PricedLine]) -> Decimal {
    if !coupon.is_scoped() {
        return cart_total(lines);
    }

    let eligible: Decimal = lines
        .iter()
        .filter(|line| {
            coupon.applicable_product_ids.contains(&line.product_id)
                || coupon
                    .applicable_categories
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(&line.category))
        })
        .map(line_subtotal)
        .sum();

    to_cents(eligible)
}
