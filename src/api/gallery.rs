//! Gallery endpoints.

use axum::extract::{Path, State};

use super::{success, ApiJson, ApiQuery, ApiResult};
use crate::models::{CreateGalleryImageRequest, GalleryImage, GalleryQuery};
use crate::AppState;

/// GET /api/gallery - Gallery images, newest first.
pub async fn list_gallery(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<GalleryQuery>,
) -> ApiResult<Vec<GalleryImage>> {
    success(state.festival.list_gallery(params.unit_id.as_deref()).await?)
}

/// POST /api/admin/gallery - Add an image record.
pub async fn create_gallery_image(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateGalleryImageRequest>,
) -> ApiResult<GalleryImage> {
    success(state.festival.add_gallery_image(&request).await?)
}

/// DELETE /api/admin/gallery/:id - Remove an image record.
pub async fn delete_gallery_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.festival.delete_gallery_image(&id).await?;
    success(())
}
