use thiserror::Error;

use crate::admission_request::GroupVersionResource;

/// Failure to fetch one level of the pod ownership hierarchy.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("cannot fetch {kind} {name}: {source}")]
    Kube {
        kind: &'static str,
        name: String,
        #[source]
        source: kube::Error,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid value {value:?} for label {label}: expected a boolean")]
pub struct LabelValueError {
    pub label: String,
    pub value: String,
}

#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("expected resource to be {expected}, got {actual}")]
    UnexpectedResource {
        expected: GroupVersionResource,
        actual: GroupVersionResource,
    },

    #[error("admission request does not carry an object")]
    MissingObject,

    #[error("cannot decode pod: {0}")]
    PodDeserialization(#[source] serde_json::Error),

    #[error("cannot serialize patch: {0}")]
    PatchSerialization(#[source] serde_json::Error),
}
