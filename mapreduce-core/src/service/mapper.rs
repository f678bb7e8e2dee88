use axum::{routing::post, Json, Router};
use tracing::instrument;

use super::{health, JsonBody, ServiceError};
use crate::{
    algorithm::AlgorithmKind,
    api::{MapRequest, MapResponse},
    mapper::map_chunk,
};

/// The mapper service over the algorithms registered in `K`.
pub fn router<K: AlgorithmKind>() -> Router {
    Router::new()
        .route("/map", post(map::<K>))
        .route("/health", health("mapper"))
}

#[instrument(
    skip_all,
    fields(algorithm = %request.algorithm_path, lines = request.data_lines.len())
)]
async fn map<K: AlgorithmKind>(
    JsonBody(request): JsonBody<MapRequest>,
) -> Result<Json<MapResponse>, ServiceError> {
    let mapped_data = map_chunk::<K>(&request.algorithm_path, request.data_lines).await?;
    Ok(Json(MapResponse {
        total_records: mapped_data.len(),
        mapped_data,
    }))
}
