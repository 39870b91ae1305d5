use std::sync::Arc;

use apm_injector::{admission_response::AdmissionResponse, hierarchy::ClusterClient};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{Span, error};

use crate::api::{service::review, state::ApiServerState};

#[tracing::instrument(
    name = "mutation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        resource=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Mutate a pod creation request sent by the Kubernetes API server.
pub(crate) async fn mutate_handler(
    State(state): State<Arc<ApiServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // verify the content type is accurate
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if content_type != mime::APPLICATION_JSON.essence_str() {
        error!(
            content_type,
            "contentType={content_type}, expect application/json"
        );
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    let lookup = ClusterClient::new(state.kube_client.clone());
    let admission_review = review(&lookup, &body).await;

    populate_span_with_response_data(&admission_review.response);

    Json(admission_review).into_response()
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

fn populate_span_with_response_data(response: &AdmissionResponse) {
    Span::current().record("allowed", response.allowed);
    Span::current().record("mutated", response.patch.is_some());
    if let Some(message) = response.status.as_ref().and_then(|s| s.message.as_ref()) {
        Span::current().record("response_message", message.as_str());
    }
}
