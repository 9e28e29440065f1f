//! Typed contexts stored in the session.
//!
//! Auth and cart state live in the session as typed values with explicit
//! load and save accessors, so handlers never touch raw session keys.

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use threadline_core::{AccountUser, AuthSession, PlaceOrderItem, Price, ProductId, VariantId};
use tower_sessions::Session;

/// Session keys.
pub mod keys {
    /// Key for the signed-in customer.
    pub const CUSTOMER: &str = "customer";

    /// Key for the cart.
    pub const CART: &str = "cart";

    /// Key for the one-shot flash message.
    pub const FLASH: &str = "flash";

    /// Key for the per-browser id used to scope request generations.
    pub const VIEWER: &str = "viewer";
}

// =============================================================================
// CustomerSession
// =============================================================================

/// The signed-in customer and their bearer token.
#[derive(Clone, Serialize, Deserialize)]
pub struct CustomerSession {
    pub user: AccountUser,
    #[serde(with = "secret_string")]
    token: SecretString,
}

impl CustomerSession {
    /// Build from a successful login.
    #[must_use]
    pub fn new(auth: AuthSession) -> Self {
        Self {
            user: auth.user,
            token: SecretString::from(auth.token),
        }
    }

    /// Bearer token for customer endpoints.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }
}

impl std::fmt::Debug for CustomerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerSession")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

mod secret_string {
    use super::{Deserialize, Deserializer, ExposeSecret, SecretString, Serializer};

    pub fn serialize<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(secret.expose_secret())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
        String::deserialize(deserializer).map(SecretString::from)
    }
}

// =============================================================================
// CartContext
// =============================================================================

/// A cart line. Price and labels are captured when the item is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_slug: String,
    pub product_name: String,
    pub variant_label: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Units on hand when the line was last touched.
    pub max_quantity: u32,
    pub image: Option<String>,
}

impl CartLine {
    /// Unit price for display.
    #[must_use]
    pub fn price(&self) -> Price {
        Price::usd(self.unit_price)
    }

    /// Line total.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price().times(self.quantity)
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartContext {
    lines: Vec<CartLine>,
}

impl CartContext {
    /// Load the cart from the session, empty if none is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session.get::<Self>(keys::CART).await?.unwrap_or_default())
    }

    /// Persist the cart into the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::CART, self).await
    }

    /// Remove the cart from the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.remove::<Self>(keys::CART).await?;
        Ok(())
    }

    /// Add a line, merging with an existing line for the same variant.
    /// Quantities are capped at the line's stock.
    pub fn add(&mut self, line: CartLine) {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.variant_id == line.variant_id)
        {
            existing.max_quantity = line.max_quantity;
            existing.unit_price = line.unit_price;
            existing.quantity = existing
                .quantity
                .saturating_add(line.quantity)
                .min(existing.max_quantity);
        } else if line.quantity > 0 {
            let quantity = line.quantity.min(line.max_quantity);
            self.lines.push(CartLine { quantity, ..line });
        }
        self.lines.retain(|l| l.quantity > 0);
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// Returns `false` if the cart has no line for the variant.
    pub fn update(&mut self, variant_id: VariantId, quantity: u32) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.variant_id == variant_id) else {
            return false;
        };
        line.quantity = quantity.min(line.max_quantity);
        self.lines.retain(|l| l.quantity > 0);
        true
    }

    /// Remove a line. Returns `false` if there was none.
    pub fn remove(&mut self, variant_id: VariantId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.variant_id != variant_id);
        self.lines.len() != before
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        Price::usd(
            self.lines
                .iter()
                .map(|l| l.unit_price * Decimal::from(l.quantity))
                .sum(),
        )
    }

    /// Lines as submitted when placing an order.
    #[must_use]
    pub fn order_items(&self) -> Vec<PlaceOrderItem> {
        self.lines
            .iter()
            .map(|l| PlaceOrderItem {
                variant_id: l.variant_id,
                quantity: l.quantity,
            })
            .collect()
    }
}

// =============================================================================
// Flash
// =============================================================================

/// Flash message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashKind {
    Success,
    Error,
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// Whether this is an error message (for styling).
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == FlashKind::Error
    }

    /// Queue the message for the next page.
    pub async fn push(self, session: &Session) {
        if let Err(e) = session.insert(keys::FLASH, &self).await {
            tracing::error!("Failed to store flash message: {e}");
        }
    }

    /// Take the pending message, if any.
    pub async fn take(session: &Session) -> Option<Self> {
        session.remove::<Self>(keys::FLASH).await.ok().flatten()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use threadline_core::{UserId, UserRole};
    use tower_sessions::MemoryStore;

    use super::*;

    fn line(variant: i64, quantity: u32, max_quantity: u32) -> CartLine {
        CartLine {
            variant_id: VariantId::new(variant),
            product_id: ProductId::new(1),
            product_slug: "linen-shirt".to_string(),
            product_name: "Linen Shirt".to_string(),
            variant_label: Some("Red / S".to_string()),
            unit_price: Decimal::new(2500, 2),
            quantity,
            max_quantity,
            image: None,
        }
    }

    #[test]
    fn test_add_merges_same_variant_and_caps_at_stock() {
        let mut cart = CartContext::default();
        cart.add(line(1, 2, 5));
        cart.add(line(1, 4, 5));
        cart.add(line(2, 1, 5));

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.item_count(), 6);
        assert_eq!(cart.subtotal().to_string(), "$150.00");
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut cart = CartContext::default();
        cart.add(line(1, 2, 5));
        assert!(cart.update(VariantId::new(1), 0));
        assert!(cart.is_empty());
        assert!(!cart.update(VariantId::new(9), 1));
    }

    #[test]
    fn test_remove_reports_missing_line() {
        let mut cart = CartContext::default();
        cart.add(line(1, 1, 5));
        assert!(!cart.remove(VariantId::new(2)));
        assert!(cart.remove(VariantId::new(1)));
    }

    #[test]
    fn test_customer_session_debug_redacts_token() {
        let customer = CustomerSession::new(AuthSession {
            token: "very-secret-token".to_string(),
            user: AccountUser {
                id: UserId::new(1),
                email: "ada@example.com".to_string(),
                name: None,
                role: UserRole::Customer,
            },
        });
        let debug_output = format!("{customer:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("very-secret-token"));
    }

    #[tokio::test]
    async fn test_cart_roundtrips_through_session() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut cart = CartContext::default();
        cart.add(line(7, 1, 3));
        cart.save(&session).await.unwrap();

        assert_eq!(CartContext::load(&session).await.unwrap(), cart);
        CartContext::clear(&session).await.unwrap();
        assert!(CartContext::load(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flash_is_taken_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        Flash::error("Nope").push(&session).await;
        assert_eq!(Flash::take(&session).await, Some(Flash::error("Nope")));
        assert_eq!(Flash::take(&session).await, None);
    }
}
