//! Wire formats for the MercadoLibre REST API, plus the composed order view that the
//! rest of the gateway consumes.
//!
//! The exact field names are a versioned external contract. Only the subset this
//! gateway needs is deserialized; unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{helpers::compose_address, DELIVERED_TAG};

//--------------------------------------   Raw wire types   ----------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrderWire {
    pub id: i64,
    pub status: String,
    pub date_created: DateTime<Utc>,
    pub total_amount: f64,
    pub currency_id: String,
    pub buyer: BuyerWire,
    #[serde(default)]
    pub shipping: Option<ShippingRefWire>,
    #[serde(default)]
    pub order_items: Vec<OrderItemWire>,
    #[serde(default)]
    pub payments: Vec<PaymentWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ShippingRefWire {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct BuyerWire {
    pub id: i64,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<PhoneWire>,
    #[serde(default)]
    pub identification: Option<IdentificationWire>,
    #[serde(default)]
    pub tax_payer_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PhoneWire {
    #[serde(default)]
    pub number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct IdentificationWire {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrderItemWire {
    pub item: ItemRefWire,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub currency_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ItemRefWire {
    #[serde(default)]
    pub seller_sku: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PaymentWire {
    pub id: i64,
    pub status: String,
    #[serde(default)]
    pub total_paid_amount: Option<f64>,
    #[serde(default)]
    pub date_approved: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct NamedWire {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ReceiverAddressWire {
    #[serde(default)]
    pub street_name: Option<String>,
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub city: Option<NamedWire>,
    #[serde(default)]
    pub state: Option<NamedWire>,
    #[serde(default)]
    pub receiver_name: Option<String>,
    #[serde(default)]
    pub receiver_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrderSummaryWire {
    pub id: i64,
    pub status: String,
    pub date_created: DateTime<Utc>,
    pub total_amount: f64,
    pub currency_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrdersSearchResponse {
    #[serde(default)]
    pub results: Vec<OrderSummaryWire>,
    pub paging: PagingWire,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PagingWire {
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ItemsSearchResponse {
    #[serde(default)]
    pub results: Vec<String>,
}

//--------------------------------------   Public data objects   -----------------------------------------------------

/// A shipment as returned by `GET /shipments/{id}`.
///
/// The `order_id` field is the canonical way to resolve a shipment back to its owning
/// order; shipment ids and order ids are never assumed interchangeable.
#[derive(Debug, Clone, Deserialize)]
pub struct MeliShipment {
    pub id: i64,
    #[serde(default)]
    pub order_id: Option<i64>,
    pub status: String,
    #[serde(default)]
    pub substatus: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub logistic_type: Option<String>,
    #[serde(default)]
    pub(crate) receiver_address: Option<ReceiverAddressWire>,
}

impl MeliShipment {
    /// A shipment counts as delivered if either the status says so or the tag set
    /// carries the delivered marker. Either signal alone is sufficient.
    pub fn is_delivered(&self) -> bool {
        self.status == DELIVERED_TAG || self.tags.iter().any(|t| t == DELIVERED_TAG)
    }
}

/// A buyer profile as returned by `GET /users/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeliBuyer {
    pub id: i64,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<PhoneWire>,
    #[serde(default)]
    pub(crate) identification: Option<IdentificationWire>,
}

impl MeliBuyer {
    pub fn phone_number(&self) -> Option<String> {
        self.phone.as_ref().and_then(|p| p.number.clone())
    }

    pub fn identification_kind(&self) -> Option<String> {
        self.identification.as_ref().and_then(|i| i.kind.clone())
    }

    pub fn identification_number(&self) -> Option<String> {
        self.identification.as_ref().and_then(|i| i.number.clone())
    }
}

/// A seller listing, as assembled from `/users/{id}/items/search` + `/items/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeliProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub available_quantity: i64,
    #[serde(default)]
    pub sold_quantity: i64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub status: String,
}

/// The buyer snapshot attached to a composed order.
#[derive(Debug, Clone, Default)]
pub struct OrderBuyer {
    pub id: i64,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub identification_type: Option<String>,
    pub identification_number: Option<String>,
    pub tax_payer_type: Option<String>,
}

impl OrderBuyer {
    /// The best human-readable name we have for the buyer. Falls back to the nickname
    /// when no real name is on record.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => format!("{f} {l}"),
            (Some(f), None) => f.clone(),
            (None, Some(l)) => l.clone(),
            (None, None) => self.nickname.clone().unwrap_or_else(|| format!("MercadoLibre buyer {}", self.id)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub sku: Option<String>,
    pub title: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderPayment {
    pub id: i64,
    pub status: String,
    pub total_paid: Option<f64>,
    pub date_approved: Option<DateTime<Utc>>,
}

/// Shipping details composed from the order's shipment record.
#[derive(Debug, Clone)]
pub struct ShippingDetails {
    pub shipment_id: i64,
    pub receiver_name: Option<String>,
    pub receiver_phone: Option<String>,
    /// The composed single-line address. See [`crate::helpers::compose_address`].
    pub address: String,
    pub status: String,
    pub substatus: Option<String>,
    pub tags: Vec<String>,
    pub logistic_type: Option<String>,
}

impl ShippingDetails {
    /// True when the marketplace warehouses and ships this order itself (logistic type
    /// "fulfillment"), as opposed to the seller shipping it.
    pub fn is_fulfillment(&self) -> bool {
        self.logistic_type.as_deref() == Some("fulfillment")
    }

    pub fn is_delivered(&self) -> bool {
        self.status == DELIVERED_TAG || self.tags.iter().any(|t| t == DELIVERED_TAG)
    }
}

/// A fully composed order: the order resource joined with its shipment detail.
#[derive(Debug, Clone)]
pub struct MeliOrder {
    pub id: i64,
    pub status: String,
    pub date_created: DateTime<Utc>,
    pub total_amount: f64,
    pub currency: String,
    pub buyer: OrderBuyer,
    /// Absent when the order has no shipping reference. This is not an error.
    pub shipping_info: Option<ShippingDetails>,
    /// Billing address composed without the courier comment component.
    pub billing_address: Option<String>,
    pub order_items: Vec<OrderItem>,
    pub payments: Vec<OrderPayment>,
}

impl MeliOrder {
    pub(crate) fn assemble(order: OrderWire, shipment: Option<MeliShipment>) -> Self {
        let buyer = OrderBuyer {
            id: order.buyer.id,
            nickname: order.buyer.nickname,
            email: order.buyer.email,
            phone: order.buyer.phone.and_then(|p| p.number),
            first_name: order.buyer.first_name,
            last_name: order.buyer.last_name,
            identification_type: order.buyer.identification.as_ref().and_then(|i| i.kind.clone()),
            identification_number: order.buyer.identification.as_ref().and_then(|i| i.number.clone()),
            tax_payer_type: order.buyer.tax_payer_type,
        };
        let (shipping_info, billing_address) = match shipment {
            Some(shipment) => {
                let addr = shipment.receiver_address.clone().unwrap_or_default();
                let street = addr.street_name.as_deref().unwrap_or("");
                let number = addr.street_number.as_deref().unwrap_or("");
                let comment = addr.comment.as_deref().unwrap_or("");
                let zip = addr.zip_code.as_deref().unwrap_or("");
                let city = addr.city.as_ref().and_then(|c| c.name.as_deref()).unwrap_or("");
                let state = addr.state.as_ref().and_then(|s| s.name.as_deref()).unwrap_or("");
                let shipping_address = compose_address(street, number, comment, zip, city, state);
                let billing_address = compose_address(street, number, "", zip, city, state);
                let details = ShippingDetails {
                    shipment_id: shipment.id,
                    receiver_name: addr.receiver_name,
                    receiver_phone: addr.receiver_phone,
                    address: shipping_address,
                    status: shipment.status,
                    substatus: shipment.substatus,
                    tags: shipment.tags,
                    logistic_type: shipment.logistic_type,
                };
                (Some(details), Some(billing_address))
            },
            None => (None, None),
        };
        Self {
            id: order.id,
            status: order.status,
            date_created: order.date_created,
            total_amount: order.total_amount,
            currency: order.currency_id,
            buyer,
            shipping_info,
            billing_address,
            order_items: order
                .order_items
                .into_iter()
                .map(|item| OrderItem {
                    sku: item.item.seller_sku,
                    title: item.item.title.unwrap_or_else(|| "Unknown item".to_string()),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    currency: item.currency_id,
                })
                .collect(),
            payments: order
                .payments
                .into_iter()
                .map(|p| OrderPayment {
                    id: p.id,
                    status: p.status,
                    total_paid: p.total_paid_amount,
                    date_approved: p.date_approved,
                })
                .collect(),
        }
    }
}

/// A slim order record from the search endpoint, used by the polling fallback.
#[derive(Debug, Clone)]
pub struct MeliOrderSummary {
    pub id: i64,
    pub status: String,
    pub date_created: DateTime<Utc>,
    pub total_amount: f64,
    pub currency: String,
}

impl From<OrderSummaryWire> for MeliOrderSummary {
    fn from(wire: OrderSummaryWire) -> Self {
        Self {
            id: wire.id,
            status: wire.status,
            date_created: wire.date_created,
            total_amount: wire.total_amount,
            currency: wire.currency_id,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_with_shipment_composes_addresses() {
        let order: OrderWire = serde_json::from_value(serde_json::json!({
            "id": 1001,
            "status": "paid",
            "date_created": "2024-05-01T10:00:00Z",
            "total_amount": 1500.0,
            "currency_id": "ARS",
            "buyer": { "id": 7, "nickname": "BUYER7", "first_name": "Jane", "last_name": "Doe" },
            "shipping": { "id": 42 },
            "order_items": [
                { "item": { "seller_sku": "SKU-1", "title": "Widget" }, "quantity": 2.0, "unit_price": 750.0 }
            ],
            "payments": [
                { "id": 9, "status": "approved", "total_paid_amount": 1500.0, "date_approved": "2024-05-01T10:05:00Z" }
            ]
        }))
        .unwrap();
        let shipment: MeliShipment = serde_json::from_value(serde_json::json!({
            "id": 42,
            "order_id": 1001,
            "status": "shipped",
            "tags": ["paid"],
            "logistic_type": "fulfillment",
            "receiver_address": {
                "street_name": "Main",
                "street_number": "123",
                "comment": "Apt 4B",
                "zip_code": "00100",
                "city": { "name": "Metropolis" },
                "state": { "name": "NY" },
                "receiver_name": "Jane Doe"
            }
        }))
        .unwrap();
        let composed = MeliOrder::assemble(order, Some(shipment));
        let shipping = composed.shipping_info.expect("shipping info should be present");
        assert_eq!(shipping.address, "Main - 123 - Apt 4B - 00100 - Metropolis, NY");
        assert_eq!(composed.billing_address.as_deref(), Some("Main - 123 - 00100 - Metropolis, NY"));
        assert!(shipping.is_fulfillment());
        assert!(!shipping.is_delivered());
        assert_eq!(composed.buyer.display_name(), "Jane Doe");
        assert_eq!(composed.order_items.len(), 1);
    }

    #[test]
    fn order_without_shipping_reference_has_no_shipping_info() {
        let order: OrderWire = serde_json::from_value(serde_json::json!({
            "id": 1002,
            "status": "paid",
            "date_created": "2024-05-01T10:00:00Z",
            "total_amount": 100.0,
            "currency_id": "ARS",
            "buyer": { "id": 7 },
            "order_items": [],
            "payments": []
        }))
        .unwrap();
        let composed = MeliOrder::assemble(order, None);
        assert!(composed.shipping_info.is_none());
        assert!(composed.billing_address.is_none());
        assert_eq!(composed.buyer.display_name(), "MercadoLibre buyer 7");
    }

    #[test]
    fn delivered_detection_accepts_either_signal() {
        let by_status: MeliShipment =
            serde_json::from_value(serde_json::json!({ "id": 1, "status": "delivered" })).unwrap();
        let by_tag: MeliShipment =
            serde_json::from_value(serde_json::json!({ "id": 2, "status": "shipped", "tags": ["delivered"] }))
                .unwrap();
        let both: MeliShipment =
            serde_json::from_value(serde_json::json!({ "id": 3, "status": "delivered", "tags": ["delivered"] }))
                .unwrap();
        let neither: MeliShipment =
            serde_json::from_value(serde_json::json!({ "id": 4, "status": "shipped", "tags": ["paid"] })).unwrap();
        assert!(by_status.is_delivered());
        assert!(by_tag.is_delivered());
        assert!(both.is_delivered());
        assert!(!neither.is_delivered());
    }
}
