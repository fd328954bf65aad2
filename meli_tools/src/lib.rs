mod api;
mod config;
mod error;
mod token;

mod data_objects;
pub mod helpers;

pub use api::MeliApi;
pub use config::MeliConfig;
pub use data_objects::{
    MeliBuyer,
    MeliOrder,
    MeliOrderSummary,
    MeliProduct,
    MeliShipment,
    OrderBuyer,
    OrderItem,
    OrderPayment,
    ShippingDetails,
};
pub use error::MeliApiError;
pub use token::{TokenHolder, TokenSet};

/// Tag that MercadoLibre attaches to shipments once the carrier has confirmed delivery.
pub const DELIVERED_TAG: &str = "delivered";
