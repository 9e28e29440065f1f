//! Session-related types for admin authentication and editing.
//!
//! Types stored in the session: the signed-in admin, the product draft being
//! edited and the one-shot flash message.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use threadline_core::{AccountUser, AuthSession, Product, ProductId};
use tower_sessions::Session;

/// Session keys for admin data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the product aggregate being edited.
    pub const DRAFT: &str = "product_draft";

    /// Key for the one-shot flash message.
    pub const FLASH: &str = "flash";
}

// =============================================================================
// CurrentAdmin
// =============================================================================

/// Session-stored admin identity and bearer token.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub user: AccountUser,
    #[serde(with = "secret_string")]
    token: SecretString,
}

impl CurrentAdmin {
    /// Build from a successful login.
    #[must_use]
    pub fn new(auth: AuthSession) -> Self {
        Self {
            user: auth.user,
            token: SecretString::from(auth.token),
        }
    }

    /// Bearer token for admin endpoints.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }
}

impl std::fmt::Debug for CurrentAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentAdmin")
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
// ProductDraft
// =============================================================================

/// The product aggregate open in the editor.
///
/// Image operations mutate the draft first and sync to the backend after, so
/// the draft is the operator's view even when a sync fails. Only one draft is
/// kept per session; opening another product replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub product: Product,
}

impl ProductDraft {
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self { product }
    }

    /// Load the draft for `id`, if that product is the one being edited.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(
        session: &Session,
        id: ProductId,
    ) -> Result<Option<Self>, tower_sessions::session::Error> {
        Ok(session
            .get::<Self>(keys::DRAFT)
            .await?
            .filter(|draft| draft.product.id == id))
    }

    /// Persist the draft into the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::DRAFT, self).await
    }

    /// Drop the draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.remove::<Self>(keys::DRAFT).await?;
        Ok(())
    }
}

// =============================================================================
// Flash
// =============================================================================

/// Flash message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashKind {
    Success,
    Warning,
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
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Warning,
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

    /// CSS modifier for the message.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "flash-success",
            FlashKind::Warning => "flash-warning",
            FlashKind::Error => "flash-error",
        }
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

    use rust_decimal::Decimal;
    use threadline_core::{UserId, UserRole, VariantImage};
    use tower_sessions::MemoryStore;

    use super::*;

    fn product(id: i64) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": "Linen Shirt",
            "slug": "linen-shirt",
            "price": "49.00",
            "variants": [{"id": 30, "productId": id, "price": "49.00"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_current_admin_debug_redacts_token() {
        let admin = CurrentAdmin::new(AuthSession {
            token: "admin-secret".to_string(),
            user: AccountUser {
                id: UserId::new(1),
                email: "ops@example.com".to_string(),
                name: None,
                role: UserRole::Admin,
            },
        });
        let debug_output = format!("{admin:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("admin-secret"));
    }

    #[tokio::test]
    async fn test_draft_only_loads_for_matching_product() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        ProductDraft::new(product(3)).save(&session).await.unwrap();

        assert!(ProductDraft::load(&session, ProductId::new(3)).await.unwrap().is_some());
        assert!(ProductDraft::load(&session, ProductId::new(4)).await.unwrap().is_none());

        ProductDraft::clear(&session).await.unwrap();
        assert!(ProductDraft::load(&session, ProductId::new(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pending_images_survive_session_roundtrip() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut draft = ProductDraft::new(product(3));
        if let Some(variant) = draft.product.variants.first_mut() {
            variant.images.push(VariantImage::pending("new.jpg"));
        }
        draft.save(&session).await.unwrap();

        let loaded = ProductDraft::load(&session, ProductId::new(3))
            .await
            .unwrap()
            .unwrap();
        let image = &loaded.product.variants[0].images[0];
        assert!(image.id.persisted().is_none());
        assert_eq!(loaded.product.price, Decimal::new(4900, 2));
    }

    #[tokio::test]
    async fn test_flash_is_taken_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        Flash::warning("Saved locally").push(&session).await;
        let flash = Flash::take(&session).await.unwrap();
        assert_eq!(flash.css_class(), "flash-warning");
        assert_eq!(Flash::take(&session).await, None);
    }
}
