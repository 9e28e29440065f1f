//! Optimistic editing of a variant's image list.
//!
//! Every command mutates the session draft first through
//! [`threadline_core::ordering`], which keeps exactly one primary image at
//! position 0 and contiguous orders, and then syncs the result to the
//! backend. A failed sync is reported but never rolled back: the draft keeps
//! the operator's intent and the next successful sync (or a full save)
//! brings the backend in line.

use secrecy::SecretString;
use threadline_core::ordering;
use threadline_core::{ImageKey, Product, VariantId, VariantImage};

use crate::api::{ApiClient, ApiError, ImageUpload};
use crate::error::AppError;

/// A change to one variant's image list, addressed by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCommand {
    SetPrimary(usize),
    Remove(usize),
    Reorder { from: usize, to: usize },
}

/// How the backend sync went after the draft was updated.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The backend accepted the change.
    Synced,
    /// Nothing needed syncing (the change left every uploaded image as it was).
    LocalOnly,
    /// The backend call failed; the draft keeps the change.
    Failed(ApiError),
}

impl SyncOutcome {
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<Result<Option<String>, ApiError>> for SyncOutcome {
    fn from(result: Result<Option<String>, ApiError>) -> Self {
        match result {
            Ok(_) => Self::Synced,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Order and primary flag of every uploaded image, in list order.
fn persisted_state(images: &[VariantImage]) -> Vec<(ImageKey, u32, bool)> {
    images
        .iter()
        .filter(|image| image.id.persisted().is_some())
        .map(|image| (image.id, image.order, image.is_primary))
        .collect()
}

fn variant_images(product: &mut Product, variant_id: VariantId) -> Result<&mut Vec<VariantImage>, AppError> {
    product
        .variant_mut(variant_id)
        .map(|variant| &mut variant.images)
        .ok_or_else(|| AppError::NotFound(format!("variant {variant_id}")))
}

/// Apply `command` to the draft, then sync it.
///
/// # Errors
///
/// Returns an error, leaving the draft untouched, if the variant is not part
/// of the draft or a position is out of range. Backend failures are reported
/// through [`SyncOutcome::Failed`] instead.
pub async fn apply(
    api: &ApiClient,
    token: &SecretString,
    draft: &mut Product,
    variant_id: VariantId,
    command: ImageCommand,
) -> Result<SyncOutcome, AppError> {
    let images = variant_images(draft, variant_id)?;

    let outcome = match command {
        ImageCommand::SetPrimary(index) => {
            ordering::set_primary(images, index)?;
            api.save_image_order(token, variant_id, images).await.into()
        }
        ImageCommand::Reorder { from, to } => {
            ordering::reorder(images, from, to)?;
            api.save_image_order(token, variant_id, images).await.into()
        }
        ImageCommand::Remove(index) => {
            let before = persisted_state(images);
            let removed = ordering::remove(images, index)?;
            match removed.id {
                ImageKey::Pending(_) if persisted_state(images) == before => SyncOutcome::LocalOnly,
                ImageKey::Pending(_) => api.save_image_order(token, variant_id, images).await.into(),
                ImageKey::Persisted(image_id) => match api.delete_image(token, image_id).await {
                    Ok(_) => api.save_image_order(token, variant_id, images).await.into(),
                    Err(e) => SyncOutcome::Failed(e),
                },
            }
        }
    };

    if let SyncOutcome::Failed(e) = &outcome {
        tracing::warn!(
            variant_id = %variant_id,
            ?command,
            error = %e,
            "Image change kept locally, backend sync failed"
        );
    }

    Ok(outcome)
}

/// Append an image to the draft as pending, then upload it.
///
/// On success the pending entry is replaced by the uploaded image, keeping
/// its position and primary flag, and the order is synced. On failure the
/// pending entry stays in the draft so the operator can see what did not
/// make it.
///
/// # Errors
///
/// Returns an error if the variant is not part of the draft.
pub async fn upload(
    api: &ApiClient,
    token: &SecretString,
    draft: &mut Product,
    variant_id: VariantId,
    upload: ImageUpload,
) -> Result<SyncOutcome, AppError> {
    let images = variant_images(draft, variant_id)?;
    let pending = VariantImage::pending(upload.file_name.clone());
    let key = pending.id;
    ordering::append(images, pending);

    let uploaded = match api.upload_image(token, variant_id, upload).await {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!(variant_id = %variant_id, error = %e, "Image upload failed, kept as pending");
            return Ok(SyncOutcome::Failed(e));
        }
    };

    let images = variant_images(draft, variant_id)?;
    if let Some(slot) = images.iter_mut().find(|img| img.id == key) {
        *slot = VariantImage {
            order: slot.order,
            is_primary: slot.is_primary,
            ..uploaded
        };
    }

    let outcome: SyncOutcome = api.save_image_order(token, variant_id, images).await.into();
    if let SyncOutcome::Failed(e) = &outcome {
        tracing::warn!(variant_id = %variant_id, error = %e, "Uploaded image order not synced");
    }
    Ok(outcome)
}
