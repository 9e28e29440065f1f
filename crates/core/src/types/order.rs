//! Orders as reported by the backend API, plus the commands a client may issue.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId, VariantId};
use super::price::Price;
use super::status::OrderStatus;
use crate::validation::{self, ValidationError};

/// A placed order. Entirely server-owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub tracking: Option<Tracking>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Order total as a displayable price.
    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::usd(self.total)
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Check that a customer may cancel this order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Invalid`] when the status no longer allows it.
    pub fn ensure_cancellable(&self) -> Result<(), ValidationError> {
        if self.status.is_cancellable() {
            Ok(())
        } else {
            Err(ValidationError::Invalid {
                field: "status",
                reason: format!("{} orders cannot be cancelled", self.status.label()),
            })
        }
    }
}

/// A single order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    #[serde(default)]
    pub variant_label: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
    /// Line subtotal as computed by the backend. Falls back to price × quantity.
    #[serde(default)]
    pub subtotal: Option<Decimal>,
}

impl OrderItem {
    /// Line subtotal.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.subtotal
            .map_or_else(|| Price::usd(self.price).times(self.quantity), Price::usd)
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Validate and normalize a shipping address entered by a shopper.
    ///
    /// # Errors
    ///
    /// Returns the first missing required field.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            full_name: validation::required("full name", &self.full_name)?,
            address_line1: validation::required("address", &self.address_line1)?,
            address_line2: validation::optional(self.address_line2.as_deref()),
            city: validation::required("city", &self.city)?,
            state: validation::optional(self.state.as_deref()),
            postal_code: validation::required("postal code", &self.postal_code)?,
            country: validation::required("country", &self.country)?,
            phone: validation::optional(self.phone.as_deref()),
        })
    }
}

/// Shipment tracking details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Request body for cancelling an order.
///
/// Can only be constructed with a non-blank reason, so a request without one
/// never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelOrder {
    reason: String,
}

impl CancelOrder {
    /// Build a cancel request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] if the reason is blank.
    pub fn new(reason: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            reason: validation::required("cancellation reason", reason)?,
        })
    }

    /// The trimmed reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// A line submitted when placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderItem {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Request body for placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub items: Vec<PlaceOrderItem>,
    pub shipping_address: ShippingAddress,
}

impl PlaceOrder {
    /// Build an order request from cart lines and a shipping address.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty or the address is incomplete.
    pub fn new(
        items: Vec<PlaceOrderItem>,
        shipping_address: ShippingAddress,
    ) -> Result<Self, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::MissingField { field: "cart items" });
        }
        Ok(Self {
            items,
            shipping_address: shipping_address.validated()?,
        })
    }
}

/// Request body for an admin status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<Tracking>,
}
