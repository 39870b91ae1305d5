use apm_injector::{
    admission_request::AdmissionRequest, admission_response::AdmissionResponse, admit,
    hierarchy::ClusterLookup,
};
use tracing::{Span, debug, error};

use crate::api::admission_review::{AdmissionReviewRequest, AdmissionReviewResponse};

/// Decode an AdmissionReview, run the pod mutation and build the
/// AdmissionReview to send back.
///
/// Errors never escape: they end up inside of the response message and
/// the request is not allowed.
pub(crate) async fn review(lookup: &dyn ClusterLookup, body: &[u8]) -> AdmissionReviewResponse {
    let admission_review: AdmissionReviewRequest = match serde_json::from_slice(body) {
        Ok(ar) => ar,
        Err(e) => {
            error!(error = %e, "cannot decode admission review");
            return AdmissionReviewResponse::new(
                None,
                AdmissionResponse::reject(recover_uid(body), e.to_string()),
            );
        }
    };
    let request = &admission_review.request;
    populate_span_with_admission_request_data(request);

    let mut response = match admit(lookup, request).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "cannot mutate pod");
            AdmissionResponse::reject(request.uid.clone(), e.to_string())
        }
    };
    // Return the same UID
    response.uid = request.uid.clone();
    debug!(response =? &response, "admission review handled");

    AdmissionReviewResponse::new(admission_review.api_version, response)
}

/// Best effort extraction of the request UID out of a body that could not
/// be decoded. Empty when the body isn't JSON or doesn't carry the UID.
fn recover_uid(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|review| {
            review
                .pointer("/request/uid")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_default()
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("request_uid", adm_req.uid.as_str());
    Span::current().record("name", adm_req.name.clone().unwrap_or_default().as_str());
    Span::current().record(
        "namespace",
        adm_req.namespace.clone().unwrap_or_default().as_str(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("resource", adm_req.resource.to_string().as_str());
}
