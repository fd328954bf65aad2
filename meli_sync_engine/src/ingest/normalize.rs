use meli_tools::{MeliOrder, OrderBuyer};

use crate::db_types::{BuyerInfo, LineItem, NewOrder, OrderId, OrderStatus, PaymentInfo, ShippingInfo};

/// Builds the storable order from the composed marketplace order and the (possibly
/// enriched) buyer snapshot.
pub fn new_order_from_meli(order: &MeliOrder, buyer: &OrderBuyer) -> NewOrder {
    NewOrder {
        order_id: OrderId::from(order.id),
        status: status_from_marketplace(&order.status),
        created_at: order.date_created,
        total_amount: order.total_amount,
        currency: order.currency.clone(),
        buyer: buyer_info(buyer),
        shipping: order.shipping_info.as_ref().map(|s| ShippingInfo {
            shipment_id: Some(s.shipment_id),
            receiver_name: s.receiver_name.clone(),
            receiver_phone: s.receiver_phone.clone(),
            address: s.address.clone(),
            status: s.status.clone(),
            tags: s.tags.clone(),
            logistic_type: s.logistic_type.clone(),
        }),
        line_items: order
            .order_items
            .iter()
            .map(|item| LineItem {
                sku: item.sku.clone(),
                title: item.title.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                currency: item.currency.clone(),
            })
            .collect(),
        payments: order
            .payments
            .iter()
            .map(|p| PaymentInfo {
                id: p.id,
                status: p.status.clone(),
                total_paid: p.total_paid,
                date_approved: p.date_approved,
            })
            .collect(),
    }
}

fn buyer_info(buyer: &OrderBuyer) -> BuyerInfo {
    BuyerInfo {
        id: buyer.id,
        nickname: buyer.nickname.clone(),
        first_name: buyer.first_name.clone(),
        last_name: buyer.last_name.clone(),
        email: buyer.email.clone(),
        phone: buyer.phone.clone(),
        identification_kind: buyer.identification_type.clone(),
        identification_number: buyer.identification_number.clone(),
    }
}

/// Marketplace order statuses collapse onto the local lifecycle: a cancellation is
/// recorded as such, everything else starts as `created`.
fn status_from_marketplace(status: &str) -> OrderStatus {
    match status {
        "cancelled" => OrderStatus::Cancelled,
        _ => OrderStatus::Created,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cancelled_orders_are_recorded_as_cancelled() {
        assert_eq!(status_from_marketplace("cancelled"), OrderStatus::Cancelled);
        assert_eq!(status_from_marketplace("paid"), OrderStatus::Created);
        assert_eq!(status_from_marketplace("confirmed"), OrderStatus::Created);
    }
}
