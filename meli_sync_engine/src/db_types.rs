use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use meli_tools::DELIVERED_TAG;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use thiserror::Error;

/// The marketplace order id. MercadoLibre hands these out as integers, but they are
/// opaque to the gateway, so we keep them as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion from string: {0}")]
pub struct ConversionError(pub String);

/// Lifecycle of a stored order.
///
/// `Created` on first ingestion, `Completed` once the shipment is delivered and the
/// Odoo pickings are validated. `Cancelled` mirrors a cancellation reported by the
/// marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Processing,
    Completed,
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Created => write!(f, "created"),
            OrderStatus::Processing => write!(f, "processing"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(OrderStatus::Created),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

/// Buyer snapshot persisted alongside the order, already merged with the detail
/// fetched from the buyer endpoint where that was available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyerInfo {
    pub id: i64,
    pub nickname: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub identification_kind: Option<String>,
    pub identification_number: Option<String>,
}

impl BuyerInfo {
    /// Full name if we have one, falling back to the nickname, then to a generic
    /// label. Never empty, since this becomes the Odoo partner name.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<&str>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        match self.nickname.as_deref().filter(|s| !s.is_empty()) {
            Some(nick) => nick.to_string(),
            None => format!("MercadoLibre buyer {}", self.id),
        }
    }
}

/// Shipping snapshot persisted alongside the order. `address` is the composed
/// single-line form (see [`meli_tools::helpers::compose_address`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub shipment_id: Option<i64>,
    pub receiver_name: Option<String>,
    pub receiver_phone: Option<String>,
    pub address: String,
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub logistic_type: Option<String>,
}

impl ShippingInfo {
    pub fn is_fulfillment(&self) -> bool {
        self.logistic_type.as_deref() == Some("fulfillment")
    }

    pub fn is_delivered(&self) -> bool {
        self.status == DELIVERED_TAG || self.tags.iter().any(|t| t == DELIVERED_TAG)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: Option<String>,
    pub title: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub id: i64,
    pub status: String,
    pub total_paid: Option<f64>,
    pub date_approved: Option<DateTime<Utc>>,
}

impl PaymentInfo {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }
}

/// An Odoo delivery order (stock.picking) linked to a sales document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickingRef {
    pub id: i64,
    pub name: String,
    pub status: String,
}

/// The full set of Odoo cross-references written back after propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdooRefs {
    pub order_id: i64,
    pub reference: String,
    pub client_ref: String,
    pub pickings: Vec<PickingRef>,
}

/// A stored order row. The nested snapshots live in JSON columns.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    /// Surrogate row id.
    pub id: i64,
    /// The marketplace order id. Unique; the deduplication key.
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub total_amount: f64,
    pub currency: String,
    pub buyer: Json<BuyerInfo>,
    pub shipping: Option<Json<ShippingInfo>>,
    pub line_items: Json<Vec<LineItem>>,
    pub payments: Json<Vec<PaymentInfo>>,
    pub odoo_order_id: Option<i64>,
    pub odoo_reference: Option<String>,
    pub odoo_client_ref: Option<String>,
    pub odoo_pickings: Option<Json<Vec<PickingRef>>>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// True once the order has a sales document in Odoo.
    pub fn is_propagated(&self) -> bool {
        self.odoo_order_id.is_some()
    }

    /// The first payment is the primary one; MercadoLibre orders virtually always
    /// carry exactly one.
    pub fn primary_payment_approved(&self) -> bool {
        self.payments.first().map(PaymentInfo::is_approved).unwrap_or(false)
    }

    pub fn is_delivered(&self) -> bool {
        self.shipping.as_ref().map(|s| s.is_delivered()).unwrap_or(false)
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order {} [{}], {} {}", self.order_id, self.status, self.total_amount, self.currency)
    }
}

/// A not-yet-stored order, assembled from the marketplace payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub total_amount: f64,
    pub currency: String,
    pub buyer: BuyerInfo,
    pub shipping: Option<ShippingInfo>,
    pub line_items: Vec<LineItem>,
    pub payments: Vec<PaymentInfo>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn buyer_display_name_prefers_full_name() {
        let buyer = BuyerInfo {
            id: 42,
            nickname: Some("NICK123".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: None,
            phone: None,
            identification_kind: None,
            identification_number: None,
        };
        assert_eq!(buyer.display_name(), "Ada Lovelace");
    }

    #[test]
    fn buyer_display_name_falls_back() {
        let mut buyer = BuyerInfo {
            id: 42,
            nickname: Some("NICK123".to_string()),
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            identification_kind: None,
            identification_number: None,
        };
        assert_eq!(buyer.display_name(), "NICK123");
        buyer.nickname = None;
        assert_eq!(buyer.display_name(), "MercadoLibre buyer 42");
    }

    #[test]
    fn delivered_detection_checks_status_and_tags() {
        let mut shipping = ShippingInfo {
            shipment_id: Some(7),
            receiver_name: None,
            receiver_phone: None,
            address: "Somewhere".to_string(),
            status: "shipped".to_string(),
            tags: vec![],
            logistic_type: None,
        };
        assert!(!shipping.is_delivered());
        shipping.tags.push("delivered".to_string());
        assert!(shipping.is_delivered());
        shipping.tags.clear();
        shipping.status = "delivered".to_string();
        assert!(shipping.is_delivered());
    }

    #[test]
    fn order_status_round_trips_through_strings() {
        for status in
            [OrderStatus::Created, OrderStatus::Processing, OrderStatus::Completed, OrderStatus::Cancelled]
        {
            let s = status.to_string();
            assert_eq!(s.parse::<OrderStatus>().unwrap(), status);
        }
        assert!("paid".parse::<OrderStatus>().is_err());
    }
}
