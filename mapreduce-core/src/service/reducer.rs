use axum::{routing::post, Json, Router};
use tracing::instrument;

use super::{health, JsonBody, ServiceError};
use crate::{
    algorithm::AlgorithmKind,
    api::{ReduceRequest, ReduceResponse},
    reducer::reduce_partition,
};

/// The reducer service over the algorithms registered in `K`.
pub fn router<K: AlgorithmKind>() -> Router {
    Router::new()
        .route("/reduce", post(reduce::<K>))
        .route("/health", health("reducer"))
}

#[instrument(
    skip_all,
    fields(algorithm = %request.algorithm_path, records = request.partitioned_data.len())
)]
async fn reduce<K: AlgorithmKind>(
    JsonBody(request): JsonBody<ReduceRequest>,
) -> Result<Json<ReduceResponse>, ServiceError> {
    let reduced_data =
        reduce_partition::<K>(&request.algorithm_path, request.partitioned_data).await?;
    Ok(Json(ReduceResponse {
        total_records: reduced_data.len(),
        reduced_data,
    }))
}
