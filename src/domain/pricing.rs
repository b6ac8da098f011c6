use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Checkout percentage rates. Both denominators are 100, which keeps the
/// scaled arithmetic in [`compute_pricing`] exact.
#[derive(Debug, Clone, Copy)]
pub struct PricingRates {
    pub service_fee_percent: u32,
    pub tax_percent: u32,
}

impl Default for PricingRates {
    fn default() -> Self {
        Self {
            service_fee_percent: 5,
            tax_percent: 8,
        }
    }
}

/// One priced entry of an order: unit price in cents, frozen at the moment
/// the order is created.
#[derive(Debug, Clone, Copy)]
pub struct LineItem {
    pub unit_price: i64,
    pub quantity: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("order has no line items")]
    EmptyOrder,

    #[error("invalid line item: {0}")]
    InvalidLineItem(String),
}

/// Immutable pricing breakdown of an order, all amounts in cents.
///
/// `total == subtotal + delivery_fee + service_fee + taxes` holds for the
/// stored values; nothing outside [`compute_pricing`] ever recomputes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pricing {
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub service_fee: i64,
    pub taxes: i64,
    pub total: i64,
}

// Amounts are carried as cents scaled by 10^4 while fees accumulate, so the
// two percentage divisions stay exact and rounding happens once per component.
const SCALE: i128 = 10_000;

fn round_half_up(scaled: i128) -> i64 {
    ((scaled + SCALE / 2) / SCALE) as i64
}

/// Pure pricing function: line items + vendor delivery fee -> breakdown.
///
/// Tax applies after the delivery and service fees are added; that ordering
/// is part of the contract, not an accident.
pub fn compute_pricing(
    items: &[LineItem],
    delivery_fee: i64,
    rates: PricingRates,
) -> Result<Pricing, PricingError> {
    if items.is_empty() {
        return Err(PricingError::EmptyOrder);
    }
    if delivery_fee < 0 {
        return Err(PricingError::InvalidLineItem(
            "delivery fee cannot be negative".into(),
        ));
    }

    let mut subtotal: i128 = 0;
    for item in items {
        if item.quantity < 1 {
            return Err(PricingError::InvalidLineItem(format!(
                "quantity must be at least 1, got {}",
                item.quantity
            )));
        }
        if item.unit_price < 0 {
            return Err(PricingError::InvalidLineItem(format!(
                "unit price cannot be negative, got {}",
                item.unit_price
            )));
        }
        subtotal += item.unit_price as i128 * item.quantity as i128;
    }

    let subtotal_scaled = subtotal * SCALE;
    let delivery_scaled = delivery_fee as i128 * SCALE;
    let service_scaled = subtotal_scaled * rates.service_fee_percent as i128 / 100;
    let tax_scaled =
        (subtotal_scaled + delivery_scaled + service_scaled) * rates.tax_percent as i128 / 100;

    let subtotal = subtotal as i64;
    let service_fee = round_half_up(service_scaled);
    let taxes = round_half_up(tax_scaled);

    Ok(Pricing {
        subtotal,
        delivery_fee,
        service_fee,
        taxes,
        total: subtotal + delivery_fee + service_fee + taxes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(unit_price: i64, quantity: i32) -> LineItem {
        LineItem {
            unit_price,
            quantity,
        }
    }

    #[test]
    fn documented_scenario() {
        // 2 x $10.00 + 1 x $5.00, $3.00 delivery
        let pricing = compute_pricing(
            &[item(1000, 2), item(500, 1)],
            300,
            PricingRates::default(),
        )
        .unwrap();

        assert_eq!(pricing.subtotal, 2500);
        assert_eq!(pricing.delivery_fee, 300);
        assert_eq!(pricing.service_fee, 125);
        // (25.00 + 3.00 + 1.25) * 0.08 = 2.34
        assert_eq!(pricing.taxes, 234);
        assert_eq!(pricing.total, 3159);
    }

    #[test]
    fn total_equals_component_sum() {
        let cases = [
            (vec![item(1, 1)], 0),
            (vec![item(999, 3), item(1, 7)], 150),
            (vec![item(12345, 2), item(67, 9), item(1, 1)], 499),
        ];
        for (items, delivery_fee) in cases {
            let p = compute_pricing(&items, delivery_fee, PricingRates::default()).unwrap();
            assert_eq!(
                p.total,
                p.subtotal + p.delivery_fee + p.service_fee + p.taxes
            );
        }
    }

    #[test]
    fn deterministic() {
        let items = [item(777, 3), item(250, 2)];
        let a = compute_pricing(&items, 420, PricingRates::default()).unwrap();
        let b = compute_pricing(&items, 420, PricingRates::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rounds_half_up_per_component() {
        // subtotal 10c -> service fee 0.5c rounds to 1c
        let p = compute_pricing(&[item(10, 1)], 0, PricingRates::default()).unwrap();
        assert_eq!(p.service_fee, 1);
        // tax on the exact 10.5c intermediate = 0.84c -> 1c
        assert_eq!(p.taxes, 1);
        assert_eq!(p.total, 12);
    }

    #[test]
    fn empty_order_rejected() {
        assert_eq!(
            compute_pricing(&[], 100, PricingRates::default()),
            Err(PricingError::EmptyOrder)
        );
    }

    #[test]
    fn invalid_items_rejected() {
        assert!(matches!(
            compute_pricing(&[item(100, 0)], 0, PricingRates::default()),
            Err(PricingError::InvalidLineItem(_))
        ));
        assert!(matches!(
            compute_pricing(&[item(-1, 1)], 0, PricingRates::default()),
            Err(PricingError::InvalidLineItem(_))
        ));
        assert!(matches!(
            compute_pricing(&[item(100, 1)], -5, PricingRates::default()),
            Err(PricingError::InvalidLineItem(_))
        ));
    }

    #[test]
    fn zero_priced_items_allowed() {
        let p = compute_pricing(&[item(0, 2)], 0, PricingRates::default()).unwrap();
        assert_eq!(p.total, 0);
    }
}
