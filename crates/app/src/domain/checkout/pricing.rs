//! Order pricing.
//!
//! The unit price captured on an order line is the product's current price
//! rounded half-up to cents. Line totals are `quantity × captured price`,
//! which is exact at two places, so the stored lines always add up to the
//! stored order total.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{
    carts::records::CartItemRecord,
    checkout::errors::CheckoutError,
    orders::data::NewOrderItem,
    products::records::{ProductRecord, ProductUuid},
};

/// Decimal places kept on captured prices and totals.
pub const PRICE_SCALE: u32 = 2;

/// Round a catalog price to the unit price an order line captures.
#[must_use]
pub fn round_unit_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// One validated cart line with the price it will be ordered at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product: ProductUuid,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub available: u32,
}

impl PricedLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    #[must_use]
    pub fn to_order_item(&self) -> NewOrderItem {
        NewOrderItem {
            product: self.product,
            quantity: self.quantity,
            price: self.unit_price,
        }
    }
}

/// Validate cart lines against the current catalog rows and price them.
///
/// `products` holds the live rows read inside the checkout transaction;
/// a cart line whose product is missing from it has been deleted.
///
/// # Errors
///
/// - [`CheckoutError::EmptyCart`] when there are no lines.
/// - [`CheckoutError::ProductUnavailable`] for the first line whose product is gone.
/// - [`CheckoutError::InsufficientStock`] for the first line asking for more than is in stock.
pub fn price_lines(
    items: &[CartItemRecord],
    products: &[ProductRecord],
) -> Result<Vec<PricedLine>, CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let catalog: HashMap<ProductUuid, &ProductRecord> = products
        .iter()
        .map(|product| (product.uuid, product))
        .collect();

    items
        .iter()
        .map(|item| {
            let product = catalog
                .get(&item.product_uuid)
                .ok_or(CheckoutError::ProductUnavailable(item.product_uuid))?;

            if item.quantity > product.stock {
                return Err(CheckoutError::InsufficientStock {
                    product: product.uuid,
                    requested: item.quantity,
                    available: product.stock,
                });
            }

            Ok(PricedLine {
                product: product.uuid,
                quantity: item.quantity,
                unit_price: round_unit_price(product.price),
                available: product.stock,
            })
        })
        .collect()
}

/// Sum of the line totals.
#[must_use]
pub fn order_total(lines: &[PricedLine]) -> Decimal {
    lines.iter().map(PricedLine::line_total).sum()
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rust_decimal_macros::dec;

    use crate::domain::carts::records::CartUuid;

    use super::*;

    fn product(price: Decimal, stock: u32) -> ProductRecord {
        let now = Timestamp::now();

        ProductRecord {
            uuid: ProductUuid::new(),
            price,
            stock,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn item(product: &ProductRecord, quantity: u32) -> CartItemRecord {
        let now = Timestamp::now();

        CartItemRecord {
            cart_uuid: CartUuid::new(),
            product_uuid: product.uuid,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn midpoints_round_up() {
        assert_eq!(round_unit_price(dec!(10.005)), dec!(10.01));
        assert_eq!(round_unit_price(dec!(10.004)), dec!(10.00));
        assert_eq!(round_unit_price(dec!(0.125)), dec!(0.13));
        assert_eq!(round_unit_price(dec!(3)), dec!(3.00));
    }

    #[test]
    fn total_rounds_each_line_before_summing() -> Result<(), CheckoutError> {
        let a = product(dec!(10.005), 10);
        let b = product(dec!(3.00), 10);

        let lines = price_lines(&[item(&a, 2), item(&b, 1)], &[a.clone(), b.clone()])?;

        assert_eq!(order_total(&lines), dec!(23.02));
        assert_eq!(
            lines.iter().map(|line| line.unit_price).collect::<Vec<_>>(),
            vec![dec!(10.01), dec!(3.00)]
        );

        Ok(())
    }

    #[test]
    fn stored_lines_add_up_to_the_total() -> Result<(), CheckoutError> {
        let products = [
            product(dec!(0.3333), 100),
            product(dec!(19.995), 100),
            product(dec!(7.1249), 100),
        ];
        let items: Vec<CartItemRecord> = products
            .iter()
            .zip([3, 7, 11])
            .map(|(product, quantity)| item(product, quantity))
            .collect();

        let lines = price_lines(&items, &products)?;

        let from_items: Decimal = lines
            .iter()
            .map(|line| {
                let order_item = line.to_order_item();
                order_item.price * Decimal::from(order_item.quantity)
            })
            .sum();

        assert_eq!(from_items, order_total(&lines));
        assert_eq!(order_total(&lines), dec!(219.31));

        Ok(())
    }

    #[test]
    fn no_lines_is_an_empty_cart() {
        let result = price_lines(&[], &[]);

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn missing_product_is_unavailable() {
        let gone = product(dec!(1.00), 1);

        let result = price_lines(&[item(&gone, 1)], &[]);

        assert!(
            matches!(result, Err(CheckoutError::ProductUnavailable(uuid)) if uuid == gone.uuid),
            "expected ProductUnavailable, got {result:?}"
        );
    }

    #[test]
    fn quantity_above_stock_is_insufficient() {
        let scarce = product(dec!(1.00), 2);

        let result = price_lines(&[item(&scarce, 3)], std::slice::from_ref(&scarce));

        assert!(
            matches!(
                result,
                Err(CheckoutError::InsufficientStock {
                    requested: 3,
                    available: 2,
                    ..
                })
            ),
            "expected InsufficientStock, got {result:?}"
        );
    }

    #[test]
    fn quantity_equal_to_stock_is_allowed() -> Result<(), CheckoutError> {
        let exact = product(dec!(2.50), 4);

        let lines = price_lines(&[item(&exact, 4)], std::slice::from_ref(&exact))?;

        assert_eq!(order_total(&lines), dec!(10.00));

        Ok(())
    }
}
