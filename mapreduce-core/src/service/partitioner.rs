use axum::{routing::post, Json, Router};
use tracing::{debug, instrument};

use super::{health, JsonBody, ServiceError};
use crate::{
    api::{PartitionRequest, PartitionResponse},
    partition::partition_records,
};

/// The partitioner service. It is independent of any algorithm.
pub fn router() -> Router {
    Router::new()
        .route("/partition", post(partition))
        .route("/health", health("partitioner"))
}

#[instrument(
    skip_all,
    fields(records = request.all_mapped_data.len(), partitions = request.num_partitions)
)]
async fn partition(
    JsonBody(request): JsonBody<PartitionRequest>,
) -> Result<Json<PartitionResponse>, ServiceError> {
    let assignment = partition_records(request.all_mapped_data, request.num_partitions)?;
    debug!(counts = ?assignment.partition_counts, "partitioned");
    Ok(Json(assignment))
}
