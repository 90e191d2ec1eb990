//! Prices

use rust_decimal::Decimal;

use crate::products::ProductSnapshot;

/// Resolves the unit price for a product at add-time.
///
/// The discounted price wins when it is present and strictly positive;
/// otherwise the list price applies, clamped to zero so the result is never
/// negative. The resolution happens exactly once per line; lines keep the
/// resolved price even if the catalog changes afterwards.
#[must_use]
pub fn unit_price(product: &ProductSnapshot) -> Decimal {
    match product.discounted_price {
        Some(discounted) if discounted > Decimal::ZERO => discounted,
        _ => product.price.max(Decimal::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::products::ProductId;

    use super::*;

    fn product(price: Decimal, discounted_price: Option<Decimal>) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::from_uuid(Uuid::now_v7()),
            name: "Widget".to_string(),
            sku: "W-100".to_string(),
            description: None,
            image_url: None,
            price,
            discounted_price,
        }
    }

    #[test]
    fn discounted_price_wins_when_positive() {
        let p = product(Decimal::from(10), Some(Decimal::from(7)));

        assert_eq!(unit_price(&p), Decimal::from(7));
    }

    #[test]
    fn zero_discount_falls_back_to_list_price() {
        let p = product(Decimal::from(10), Some(Decimal::ZERO));

        assert_eq!(unit_price(&p), Decimal::from(10));
    }

    #[test]
    fn missing_discount_uses_list_price() {
        let p = product(Decimal::from(10), None);

        assert_eq!(unit_price(&p), Decimal::from(10));
    }

    #[test]
    fn negative_list_price_clamps_to_zero() {
        let p = product(Decimal::from(-5), None);

        assert_eq!(unit_price(&p), Decimal::ZERO);
    }
}
