use std::collections::BTreeMap;

use apm_injector::constants::OPT_IN_LABEL;
use k8s_openapi::{
    api::{
        apps::v1::{Deployment, ReplicaSet},
        core::v1::Namespace,
    },
    apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference},
};
use serde_json::json;

fn opt_in_labels(opt_in: Option<&str>) -> Option<BTreeMap<String, String>> {
    opt_in.map(|value| BTreeMap::from([(OPT_IN_LABEL.to_owned(), value.to_owned())]))
}

pub(crate) fn namespace(name: &str, opt_in: Option<&str>) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            labels: opt_in_labels(opt_in),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub(crate) fn replica_set(name: &str, deployment: &str) -> ReplicaSet {
    ReplicaSet {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some("apm-enabled".to_owned()),
            owner_references: Some(vec![OwnerReference {
                api_version: "apps/v1".to_owned(),
                kind: "Deployment".to_owned(),
                name: deployment.to_owned(),
                uid: format!("{deployment}-uid"),
                controller: Some(true),
                ..Default::default()
            }]),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub(crate) fn deployment(name: &str, opt_in: Option<&str>) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some("apm-enabled".to_owned()),
            labels: opt_in_labels(opt_in),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub(crate) fn not_found(name: &str) -> serde_json::Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": format!("\"{name}\" not found"),
        "reason": "NotFound",
        "details": { "name": name },
        "code": 404
    })
}
