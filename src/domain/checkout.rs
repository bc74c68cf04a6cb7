use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use uuid::Uuid;

use super::OrderError;
use crate::{
    dto::orders::PlaceOrderRequest,
    entity::products::Model as ProductModel,
    models::{PaymentMethod, PaymentStatus, effective_price},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A cart that passed every check which needs no database access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    pub lines: Vec<CartLine>,
    pub address: Option<String>,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub card_last4: Option<String>,
}

impl ValidatedOrder {
    /// Card orders are recorded as paid on submission; there is no gateway round-trip.
    pub fn payment_status(&self) -> PaymentStatus {
        match self.payment_method {
            PaymentMethod::Card => PaymentStatus::Paid,
            PaymentMethod::OnDelivery => PaymentStatus::Pending,
        }
    }

    /// Requested quantity summed per distinct product, keyed in id order.
    ///
    /// The id order doubles as the row-lock order during placement.
    pub fn demand(&self) -> BTreeMap<Uuid, i64> {
        let mut demand = BTreeMap::new();
        for line in &self.lines {
            *demand.entry(line.product_id).or_insert(0) += i64::from(line.quantity);
        }
        demand
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.demand().into_keys().collect()
    }
}

pub fn validate(request: PlaceOrderRequest) -> Result<ValidatedOrder, OrderError> {
    if request.items.is_empty() {
        return Err(OrderError::EmptyCart);
    }
    if request.items.iter().any(|item| item.quantity < 1) {
        return Err(OrderError::InvalidQuantity);
    }

    let phone = request
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or(OrderError::MissingPhone)?
        .to_string();

    let address = request
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    let payment_method = PaymentMethod::from_request(request.payment_method.as_deref());
    let card_last4 = match payment_method {
        PaymentMethod::Card => normalize_card_last4(request.card_last4.as_deref()),
        PaymentMethod::OnDelivery => None,
    };

    let lines = request
        .items
        .into_iter()
        .map(|item| CartLine {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();

    Ok(ValidatedOrder {
        lines,
        address,
        phone,
        payment_method,
        card_last4,
    })
}

/// Keeps the digits only and returns the last four of them.
pub fn normalize_card_last4(raw: Option<&str>) -> Option<String> {
    let digits: Vec<char> = raw?.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let start = digits.len().saturating_sub(4);
    Some(digits[start..].iter().collect())
}

/// The product fields placement reads under lock.
#[derive(Debug, Clone, PartialEq)]
pub struct StockSnapshot {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub is_sale: bool,
    pub quantity: i32,
}

impl StockSnapshot {
    pub fn effective_price(&self) -> Decimal {
        effective_price(self.price, self.sale_price, self.is_sale)
    }
}

impl From<ProductModel> for StockSnapshot {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            sale_price: model.sale_price,
            is_sale: model.is_sale,
            quantity: model.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// One entry per submitted line, in submission order.
    pub lines: Vec<PricedLine>,
    pub total: Decimal,
    /// Stock to take per distinct product.
    pub reservations: BTreeMap<Uuid, i32>,
}

/// Prices the cart against the given stock rows.
///
/// Stock is checked against the per-product sum so that a product listed on
/// several lines cannot be counted twice, while the total is summed per line.
pub fn quote(
    order: &ValidatedOrder,
    stock: &HashMap<Uuid, StockSnapshot>,
) -> Result<Quote, OrderError> {
    if let Some(missing) = order
        .lines
        .iter()
        .find(|line| !stock.contains_key(&line.product_id))
    {
        return Err(OrderError::ProductNotFound(missing.product_id));
    }

    let mut reservations = BTreeMap::new();
    for (product_id, requested) in order.demand() {
        let product = &stock[&product_id];
        if requested > i64::from(product.quantity) {
            return Err(OrderError::InsufficientStock {
                product: product.name.clone(),
                available: product.quantity,
            });
        }
        // Bounded by the stock count, which is an i32.
        reservations.insert(product_id, requested as i32);
    }

    let mut total = Decimal::ZERO;
    let lines = order
        .lines
        .iter()
        .map(|line| {
            let unit_price = stock[&line.product_id].effective_price();
            total += unit_price * Decimal::from(line.quantity);
            PricedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
            }
        })
        .collect();

    Ok(Quote {
        lines,
        total,
        reservations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::orders::OrderLineRequest;

    fn request(items: Vec<(Uuid, i32)>, phone: Option<&str>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            items: items
                .into_iter()
                .map(|(product_id, quantity)| OrderLineRequest {
                    product_id,
                    quantity,
                })
                .collect(),
            address: Some("  12 Harbour Road ".into()),
            phone: phone.map(str::to_string),
            payment_method: None,
            card_last4: None,
        }
    }

    fn snapshot(name: &str, price: i64, sale: Option<i64>, is_sale: bool, quantity: i32) -> StockSnapshot {
        StockSnapshot {
            id: Uuid::new_v4(),
            name: name.into(),
            price: Decimal::from(price),
            sale_price: sale.map(Decimal::from),
            is_sale,
            quantity,
        }
    }

    fn stock_of(products: &[&StockSnapshot]) -> HashMap<Uuid, StockSnapshot> {
        products.iter().map(|p| (p.id, (*p).clone())).collect()
    }

    #[test]
    fn empty_cart_is_rejected() {
        let err = validate(request(vec![], Some("555-0101"))).unwrap_err();
        assert_eq!(err, OrderError::EmptyCart);
    }

    #[test]
    fn blank_phone_is_rejected_for_every_payment_method() {
        let id = Uuid::new_v4();
        for method in [None, Some("card"), Some("on_delivery")] {
            for phone in [None, Some(""), Some("   ")] {
                let mut req = request(vec![(id, 1)], phone);
                req.payment_method = method.map(str::to_string);
                assert_eq!(validate(req).unwrap_err(), OrderError::MissingPhone);
            }
        }
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = validate(request(vec![(Uuid::new_v4(), 0)], Some("555"))).unwrap_err();
        assert_eq!(err, OrderError::InvalidQuantity);
    }

    #[test]
    fn card_digits_are_filtered_and_truncated() {
        assert_eq!(
            normalize_card_last4(Some("4242 4242-4242 1234")).as_deref(),
            Some("1234")
        );
        assert_eq!(normalize_card_last4(Some("x9y8")).as_deref(), Some("98"));
        assert_eq!(normalize_card_last4(Some("----")), None);
        assert_eq!(normalize_card_last4(None), None);
    }

    #[test]
    fn card_last4_is_dropped_for_delivery_orders() {
        let mut req = request(vec![(Uuid::new_v4(), 1)], Some("555"));
        req.payment_method = Some("cash".into());
        req.card_last4 = Some("4242".into());
        let order = validate(req).unwrap();
        assert_eq!(order.payment_method, PaymentMethod::OnDelivery);
        assert_eq!(order.card_last4, None);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
    }

    #[test]
    fn card_orders_are_paid_on_submission() {
        let mut req = request(vec![(Uuid::new_v4(), 1)], Some(" 555-0101 "));
        req.payment_method = Some("card".into());
        req.card_last4 = Some("4000 0000 0000 0002".into());
        let order = validate(req).unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert_eq!(order.card_last4.as_deref(), Some("0002"));
        assert_eq!(order.phone, "555-0101");
        assert_eq!(order.address.as_deref(), Some("12 Harbour Road"));
    }

    #[test]
    fn sale_price_drives_the_total() {
        let on_sale = snapshot("Hoodie", 100, Some(80), true, 10);
        let order = validate(request(vec![(on_sale.id, 3)], Some("555"))).unwrap();
        let quote = quote(&order, &stock_of(&[&on_sale])).unwrap();
        assert_eq!(quote.total, Decimal::from(240));
        assert_eq!(quote.lines[0].unit_price, Decimal::from(80));

        let regular = snapshot("Hoodie", 100, Some(80), false, 10);
        let order = validate(request(vec![(regular.id, 3)], Some("555"))).unwrap();
        let quote = super::quote(&order, &stock_of(&[&regular])).unwrap();
        assert_eq!(quote.total, Decimal::from(300));
        assert_eq!(quote.lines[0].unit_price, Decimal::from(100));
    }

    #[test]
    fn duplicate_lines_are_summed_before_the_stock_check() {
        let mug = snapshot("Ferris Mug", 12, None, false, 4);
        let order = validate(request(vec![(mug.id, 2), (mug.id, 3)], Some("555"))).unwrap();
        let err = quote(&order, &stock_of(&[&mug])).unwrap_err();
        assert_eq!(
            err,
            OrderError::InsufficientStock {
                product: "Ferris Mug".into(),
                available: 4,
            }
        );
    }

    #[test]
    fn duplicate_lines_keep_their_own_rows_and_total() {
        let mug = snapshot("Ferris Mug", 12, None, false, 10);
        let order = validate(request(vec![(mug.id, 2), (mug.id, 3)], Some("555"))).unwrap();
        let quote = quote(&order, &stock_of(&[&mug])).unwrap();
        assert_eq!(quote.lines.len(), 2);
        assert_eq!(quote.total, Decimal::from(60));
        assert_eq!(quote.reservations.get(&mug.id), Some(&5));
    }

    #[test]
    fn unknown_product_fails_the_whole_cart() {
        let mug = snapshot("Ferris Mug", 12, None, false, 10);
        let ghost = Uuid::new_v4();
        let order = validate(request(vec![(mug.id, 1), (ghost, 1)], Some("555"))).unwrap();
        assert_eq!(
            quote(&order, &stock_of(&[&mug])).unwrap_err(),
            OrderError::ProductNotFound(ghost)
        );
    }

    #[test]
    fn one_short_product_rejects_every_line() {
        let mug = snapshot("Ferris Mug", 12, None, false, 10);
        let sticker = snapshot("Sticker", 1, None, false, 0);
        let order =
            validate(request(vec![(mug.id, 1), (sticker.id, 1)], Some("555"))).unwrap();
        let err = quote(&order, &stock_of(&[&mug, &sticker])).unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { available: 0, .. }));
    }
}
