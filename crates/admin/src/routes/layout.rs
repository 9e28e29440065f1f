//! Data shared by every admin page: the signed-in admin, the active nav item
//! and the flash message.

use tower_sessions::Session;

use crate::models::{CurrentAdmin, Flash};

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.user.display_name().to_string(),
            email: admin.user.email.clone(),
        }
    }
}

/// Header and flash state rendered by `base.html`.
#[derive(Debug, Clone)]
pub struct Layout {
    pub admin_user: Option<AdminUserView>,
    pub current_path: &'static str,
    pub flash: Option<Flash>,
}

impl Layout {
    /// Gather layout state, consuming any pending flash message.
    pub async fn load(
        session: &Session,
        admin: Option<&CurrentAdmin>,
        current_path: &'static str,
    ) -> Self {
        Self {
            admin_user: admin.map(AdminUserView::from),
            current_path,
            flash: Flash::take(session).await,
        }
    }

    /// Whether `section` is the active nav item.
    #[must_use]
    pub fn is_active(&self, section: &str) -> bool {
        if section == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(section)
        }
    }
}
