//! Categories, colors and sizes.
//!
//! The three lists share one set of admin endpoints (`/admin/{kind}`) and one
//! entry shape; fields that do not apply to a kind are left empty.

use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use threadline_core::ValidationError;
use threadline_core::validation;
use tracing::instrument;

use super::{ApiClient, ApiError};

/// Which taxonomy list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyKind {
    Categories,
    Colors,
    Sizes,
}

impl TaxonomyKind {
    pub const ALL: [Self; 3] = [Self::Categories, Self::Colors, Self::Sizes];

    /// Path segment used by both the backend and the admin routes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Colors => "colors",
            Self::Sizes => "sizes",
        }
    }

    /// Heading for the list page.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Categories => "Categories",
            Self::Colors => "Colors",
            Self::Sizes => "Sizes",
        }
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxonomyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown catalog list: {s}"))
    }
}

/// A category, color or size as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub hex_code: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// A validated entry ready to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaxonomyEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex_code: Option<String>,
}

impl NewTaxonomyEntry {
    /// Validate form input for the given list.
    ///
    /// Categories need a slug; colors accept a `#rrggbb` swatch; sizes accept
    /// a numeric display order.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn parse(
        kind: TaxonomyKind,
        name: &str,
        slug: Option<&str>,
        display_order: Option<&str>,
        hex_code: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let name = validation::required("name", name)?;
        let display_order = validation::optional(display_order)
            .map(|raw| {
                raw.parse::<i32>().map_err(|_| ValidationError::Invalid {
                    field: "display order",
                    reason: format!("'{raw}' is not a whole number"),
                })
            })
            .transpose()?;

        match kind {
            TaxonomyKind::Categories => Ok(Self {
                name,
                slug: Some(validation::slug("slug", slug.unwrap_or_default())?),
                display_order: None,
                hex_code: None,
            }),
            TaxonomyKind::Colors => {
                let hex_code = validation::optional(hex_code)
                    .map(|raw| {
                        let well_formed = raw.len() == 7
                            && raw.starts_with('#')
                            && raw.chars().skip(1).all(|c| c.is_ascii_hexdigit());
                        if well_formed {
                            Ok(raw.to_ascii_lowercase())
                        } else {
                            Err(ValidationError::Invalid {
                                field: "hex code",
                                reason: "use the #rrggbb form".to_string(),
                            })
                        }
                    })
                    .transpose()?;
                Ok(Self {
                    name,
                    slug: None,
                    display_order,
                    hex_code,
                })
            }
            TaxonomyKind::Sizes => Ok(Self {
                name,
                slug: None,
                display_order,
                hex_code: None,
            }),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntryList {
    Bare(Vec<TaxonomyEntry>),
    Named {
        #[serde(alias = "categories", alias = "colors", alias = "sizes")]
        items: Vec<TaxonomyEntry>,
    },
}

impl ApiClient {
    /// List every entry of a taxonomy.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn taxonomy(
        &self,
        token: &SecretString,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyEntry>, ApiError> {
        let url = self.endpoint(&["admin", kind.as_str()])?;
        let list: EntryList = self
            .fetch(self.request(reqwest::Method::GET, url, token))
            .await?;
        let mut entries = match list {
            EntryList::Bare(entries) | EntryList::Named { items: entries } => entries,
        };
        entries.sort_by_key(|entry| (entry.display_order.unwrap_or(i32::MAX), entry.id));
        Ok(entries)
    }

    /// Create an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the entry or the request fails.
    #[instrument(skip(self, token, entry), fields(name = %entry.name))]
    pub async fn create_taxonomy(
        &self,
        token: &SecretString,
        kind: TaxonomyKind,
        entry: &NewTaxonomyEntry,
    ) -> Result<Option<String>, ApiError> {
        let url = self.endpoint(&["admin", kind.as_str()])?;
        self.acknowledge(self.request(reqwest::Method::POST, url, token).json(entry))
            .await
    }

    /// Delete an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses (for example, the entry is in
    /// use) or the request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_taxonomy(
        &self,
        token: &SecretString,
        kind: TaxonomyKind,
        id: i64,
    ) -> Result<Option<String>, ApiError> {
        let url = self.endpoint(&["admin", kind.as_str(), &id.to_string()])?;
        self.acknowledge(self.request(reqwest::Method::DELETE, url, token))
            .await
    }
}
