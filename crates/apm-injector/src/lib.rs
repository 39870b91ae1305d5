pub extern crate k8s_openapi;
pub extern crate kube;

pub mod admission_request;
pub mod admission_response;
pub mod constants;
pub mod errors;
pub mod hierarchy;
pub mod label_chain;
pub mod mutation;
pub mod patch;

pub use mutation::admit;
