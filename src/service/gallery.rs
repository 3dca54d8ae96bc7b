//! Gallery image records. The image bytes live with the object storage provider.

use super::Festival;
use crate::errors::AppError;
use crate::models::{required, CreateGalleryImageRequest, GalleryImage};
use crate::store::collections;

impl Festival {
    /// Gallery images, newest first, optionally only those attributed to one unit.
    pub async fn list_gallery(&self, unit_id: Option<&str>) -> Result<Vec<GalleryImage>, AppError> {
        let mut images = self
            .store
            .get_all(collections::GALLERY_IMAGES)
            .await?
            .into_iter()
            .map(|(id, record)| GalleryImage::from_record(&id, record))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(unit_id) = unit_id.filter(|u| !u.is_empty()) {
            images.retain(|img| img.unit_id.as_deref() == Some(unit_id));
        }

        images.reverse();
        Ok(images)
    }

    pub async fn add_gallery_image(
        &self,
        request: &CreateGalleryImageRequest,
    ) -> Result<GalleryImage, AppError> {
        let src = required(&request.src, "Image source")?;
        let alt = required(&request.alt, "Alt text")?;
        let unit_id = request
            .unit_id
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        if let Some(unit_id) = &unit_id {
            if self.store.get_one(collections::UNITS, unit_id).await?.is_none() {
                return Err(AppError::Validation(format!("Unit {} does not exist", unit_id)));
            }
        }

        let mut image = GalleryImage {
            id: String::new(),
            src,
            alt,
            unit_id,
            ai_hint: request.ai_hint.trim().to_string(),
            storage_path: request.storage_path.clone().filter(|p| !p.is_empty()),
        };
        image.id = self
            .store
            .push(collections::GALLERY_IMAGES, image.to_record()?)
            .await?;
        tracing::info!(image_id = %image.id, unit_id = ?image.unit_id, "Gallery image added");

        Ok(image)
    }

    pub async fn delete_gallery_image(&self, id: &str) -> Result<(), AppError> {
        if !self.store.remove(collections::GALLERY_IMAGES, id).await? {
            return Err(AppError::NotFound(format!("Image {} not found", id)));
        }
        Ok(())
    }
}
