use cpg_common::MinorUnits;

use crate::{
    db_types::{NewLineItem, NewOrder},
    pe_api::access_control::Caller,
};

/// A USD order for `user_id` (empty for anonymous) with the given total, made of a single line item.
pub fn order_with_total(user_id: &str, total: i64) -> NewOrder {
    NewOrder::new(user_id, "shopper@example.com", "USD")
        .with_item(NewLineItem::new("SKU-001", "Test item", MinorUnits::from(total), 1))
}

/// A USD order with two line items, shipping and taxes. Its total is 4800.
pub fn detailed_order(user_id: &str) -> NewOrder {
    NewOrder::new(user_id, "shopper@example.com", "USD")
        .with_item(NewLineItem::new("MUG-01", "Mug", MinorUnits::from(1250), 2))
        .with_item(NewLineItem::new("TEA-07", "Tea", MinorUnits::from(500), 3))
        .with_shipping(MinorUnits::from(495))
        .with_taxes(MinorUnits::from(305))
        .with_billing_address(1)
        .with_shipping_address(2)
}

pub fn customer(id: &str) -> Caller {
    Caller { subject_id: id.to_string(), email: format!("{id}@example.com"), groups: Vec::new() }
}

pub fn admin() -> Caller {
    Caller::new("root", "root@example.com").with_group("admin")
}
