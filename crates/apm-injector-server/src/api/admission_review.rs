use apm_injector::{admission_request::AdmissionRequest, admission_response::AdmissionResponse};

pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub request: AdmissionRequest,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub response: AdmissionResponse,
}

impl AdmissionReviewResponse {
    /// Wrap the response using the same API version of the request,
    /// `admission.k8s.io/v1` when it is not known.
    pub fn new(api_version: Option<String>, response: AdmissionResponse) -> Self {
        AdmissionReviewResponse {
            api_version: Some(api_version.unwrap_or_else(|| ADMISSION_API_VERSION.to_owned())),
            kind: Some(String::from(ADMISSION_REVIEW_KIND)),
            response,
        }
    }
}
