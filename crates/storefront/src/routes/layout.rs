//! Data shared by every full page: header state and the flash message.

use tower_sessions::Session;

use crate::models::{CartContext, CustomerSession, Flash};

/// Header and flash state rendered by `base.html`.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub customer_name: Option<String>,
    pub cart_count: u32,
    pub flash: Option<Flash>,
}

impl Layout {
    /// Gather layout state, consuming any pending flash message.
    pub async fn load(session: &Session, customer: Option<&CustomerSession>) -> Self {
        let cart_count = match CartContext::load(session).await {
            Ok(cart) => cart.item_count(),
            Err(e) => {
                tracing::warn!("Failed to load cart for header: {e}");
                0
            }
        };

        Self {
            customer_name: customer.map(|c| c.user.display_name().to_string()),
            cart_count,
            flash: Flash::take(session).await,
        }
    }
}
