//! HTTP front ends of the services.
//!
//! Each submodule builds the [`axum::Router`] of one service:
//! - [`mapper::router`]: `POST /map`
//! - [`partitioner::router`]: `POST /partition`
//! - [`reducer::router`]: `POST /reduce`
//! - [`orchestrator::router`]: `POST /jobs`, `GET /jobs/{jobId}` and
//!   `GET /jobs/{jobId}/output`
//!
//! Every service also answers `GET /health`. Failures are reported as
//! `{"detail": "..."}` with the status code given by [`ServiceError::status`].
use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Json, Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::{
    api::{ErrorBody, Health},
    mapper::MapperError,
    orchestrator::{ClientRequestError, OutputError},
    partition::PartitionerError,
    reducer::ReducerError,
};

pub mod mapper;
pub mod orchestrator;
pub mod partitioner;
pub mod reducer;

/// Any error a service answers a request with.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Mapper(#[from] MapperError),
    #[error(transparent)]
    Reducer(#[from] ReducerError),
    #[error(transparent)]
    Partitioner(#[from] PartitionerError),
    #[error(transparent)]
    ClientRequest(#[from] ClientRequestError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("Job not found")]
    JobNotFound,
    #[error("Invalid request body: {}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Mapper(MapperError::Contract(_)) | Self::Reducer(ReducerError::Contract(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Mapper(MapperError::Execution(_)) | Self::Reducer(ReducerError::Execution(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Partitioner(_) => StatusCode::BAD_REQUEST,
            Self::ClientRequest(ClientRequestError::DatasetNotFound(_)) => StatusCode::NOT_FOUND,
            Self::ClientRequest(_) => StatusCode::BAD_REQUEST,
            Self::Output(_) | Self::JobNotFound => StatusCode::NOT_FOUND,
            Self::InvalidBody(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();
        if status.is_server_error() {
            error!(%status, %detail, "request failed");
        } else {
            warn!(%status, %detail, "request rejected");
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// A JSON request body. Rejections answer like every other [`ServiceError`].
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ServiceError))]
pub(crate) struct JsonBody<T>(pub T);

/// `GET /health` for the named service.
pub(crate) fn health<S>(service: &'static str) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    get(move || async move { Json(Health::healthy(service)) })
}

/// Serve `router` on `addr` until Ctrl-C is received.
pub async fn serve(addr: SocketAddr, service: &str, router: Router) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {service} to {addr}"))?;
    info!(%addr, service, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| format!("{service} server failed"))?;

    info!(service, "shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}
