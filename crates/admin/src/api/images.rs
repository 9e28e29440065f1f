//! Variant image endpoints.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use threadline_core::ordering;
use threadline_core::{ImageId, VariantId, VariantImage, resolve_image_url};
use tracing::instrument;

use super::{ApiClient, ApiError};

/// A file received from the upload form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Deserialize)]
struct ImagePayload {
    image: VariantImage,
}

/// One entry of the persisted image order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePosition {
    pub id: ImageId,
    pub order: u32,
    pub is_primary: bool,
}

/// The image order as the backend should hold it.
///
/// Pending images are dropped and the remaining ones renumbered from 0 with
/// the first flagged primary, so a pending image at the front never leaves
/// the backend without a primary or with gaps.
#[must_use]
pub fn persisted_order(images: &[VariantImage]) -> Vec<ImagePosition> {
    let mut persisted: Vec<VariantImage> = images
        .iter()
        .filter(|image| image.id.persisted().is_some())
        .cloned()
        .collect();
    ordering::normalize(&mut persisted);

    persisted
        .iter()
        .filter_map(|image| {
            image.id.persisted().map(|id| ImagePosition {
                id,
                order: image.order,
                is_primary: image.is_primary,
            })
        })
        .collect()
}

impl ApiClient {
    /// Upload an image for a variant.
    ///
    /// The returned image carries its backend id and resolved URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the file or the request fails.
    #[instrument(skip(self, token, upload), fields(variant_id = %variant_id, file = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload_image(
        &self,
        token: &SecretString,
        variant_id: VariantId,
        upload: ImageUpload,
    ) -> Result<VariantImage, ApiError> {
        let url = self.endpoint(&["admin", "variants", &variant_id.to_string(), "images"])?;
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let payload: ImagePayload = self
            .fetch(self.request(reqwest::Method::POST, url, token).multipart(form))
            .await?;
        let mut image = payload.image;
        image.url = resolve_image_url(self.storage_base_url(), &image.url);
        Ok(image)
    }

    /// Persist the order and primary flag of a variant's images.
    ///
    /// Images still pending upload are left out and the rest renumbered, see
    /// [`persisted_order`].
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order or the request fails.
    #[instrument(skip(self, token, images), fields(variant_id = %variant_id, count = images.len()))]
    pub async fn save_image_order(
        &self,
        token: &SecretString,
        variant_id: VariantId,
        images: &[VariantImage],
    ) -> Result<Option<String>, ApiError> {
        let url = self.endpoint(&["admin", "variants", &variant_id.to_string(), "images"])?;
        let positions = persisted_order(images);

        self.acknowledge(
            self.request(reqwest::Method::PUT, url, token)
                .json(&serde_json::json!({ "images": positions })),
        )
        .await
    }

    /// Delete an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses or the request fails.
    #[instrument(skip(self, token), fields(image_id = %id))]
    pub async fn delete_image(
        &self,
        token: &SecretString,
        id: ImageId,
    ) -> Result<Option<String>, ApiError> {
        let url = self.endpoint(&["admin", "images", &id.to_string()])?;
        self.acknowledge(self.request(reqwest::Method::DELETE, url, token))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use threadline_core::ImageKey;
    use wiremock::matchers::{body_json, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::tests::{client_for, token};
    use super::*;

    #[tokio::test]
    async fn test_upload_sends_multipart_and_resolves_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/variants/30/images"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {"image": {"id": 77, "url": "variants/30/new.jpg", "order": 0, "isPrimary": false}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let image = client
            .upload_image(
                &token(),
                VariantId::new(30),
                ImageUpload {
                    file_name: "new.jpg".to_string(),
                    content_type: "image/jpeg".to_string(),
                    bytes: vec![0xFF, 0xD8, 0xFF],
                },
            )
            .await
            .unwrap();

        assert_eq!(image.id, ImageKey::Persisted(ImageId::new(77)));
        assert_eq!(image.url, "https://bucket.local/variants/30/new.jpg");
    }

    #[tokio::test]
    async fn test_save_order_skips_pending_images() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/admin/variants/30/images"))
            .and(body_json(json!({"images": [{"id": 5, "order": 0, "isPrimary": true}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let persisted = VariantImage {
            id: ImageKey::Persisted(ImageId::new(5)),
            url: "a.jpg".to_string(),
            alt_text: None,
            is_primary: true,
            order: 0,
        };
        let mut pending = VariantImage::pending("new.jpg");
        pending.order = 1;

        client
            .save_image_order(&token(), VariantId::new(30), &[persisted, pending])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_save_order_promotes_first_persisted_behind_pending_primary() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/admin/variants/30/images"))
            .and(body_json(json!({"images": [
                {"id": 5, "order": 0, "isPrimary": true},
                {"id": 6, "order": 1, "isPrimary": false}
            ]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let mut images = vec![VariantImage::pending("new.jpg")];
        for id in [5, 6] {
            ordering::append(
                &mut images,
                VariantImage {
                    id: ImageKey::Persisted(ImageId::new(id)),
                    url: format!("{id}.jpg"),
                    alt_text: None,
                    is_primary: false,
                    order: 0,
                },
            );
        }
        ordering::set_primary(&mut images, 0).unwrap();

        client
            .save_image_order(&token(), VariantId::new(30), &images)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_image_surfaces_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/admin/images/5"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "message": "Image in use"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let err = client
            .delete_image(&token(), ImageId::new(5))
            .await
            .unwrap_err();
        assert_eq!(err.summary(), "Image in use");
    }
}
