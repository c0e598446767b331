//! Product image lookups.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::image_manifest::ProductImage;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductImagesResponse {
    pub handle: String,
    pub images: Vec<ProductImage>,
}

/// Images for a product handle, in display order.
///
/// # Errors
///
/// `404` if the manifest has no entry for the handle.
pub async fn images(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<ProductImagesResponse>> {
    let images = state
        .images()
        .images(&handle)
        .ok_or_else(|| AppError::NotFound(format!("product {handle}")))?
        .to_vec();

    Ok(Json(ProductImagesResponse { handle, images }))
}
