use json_patch::Patch;
use k8s_openapi::api::core::v1::Pod;
use tracing::{debug, info};

use crate::{
    admission_request::AdmissionRequest,
    admission_response::AdmissionResponse,
    constants::pod_resource,
    errors::AdmissionError,
    hierarchy::{self, ClusterLookup},
    label_chain::LabelChain,
    patch,
};

/// Decide whether `pod`, created inside of `namespace`, opted into the
/// injection and return the patch performing it.
pub async fn mutate_pod(lookup: &dyn ClusterLookup, pod: &Pod, namespace: &str) -> Option<Patch> {
    let hierarchy = hierarchy::resolve(lookup, pod, namespace).await;
    let chain = LabelChain::new(&hierarchy, pod.metadata.labels.as_ref());
    let inject = chain.decide();

    patch::build(pod, inject)
}

/// Handle the admission request of a pod.
///
/// The request is always allowed once the pod is decoded; a patch is
/// attached only when the pod opted in.
pub async fn admit(
    lookup: &dyn ClusterLookup,
    request: &AdmissionRequest,
) -> Result<AdmissionResponse, AdmissionError> {
    let expected = pod_resource();
    if request.resource != expected {
        return Err(AdmissionError::UnexpectedResource {
            expected,
            actual: request.resource.clone(),
        });
    }

    let raw = request.object.as_ref().ok_or(AdmissionError::MissingObject)?;
    let pod: Pod =
        serde_json::from_value(raw.0.clone()).map_err(AdmissionError::PodDeserialization)?;

    let namespace = request
        .namespace
        .as_deref()
        .or(pod.metadata.namespace.as_deref())
        .unwrap_or_default();

    let response = AdmissionResponse::allow(request.uid.clone());
    match mutate_pod(lookup, &pod, namespace).await {
        Some(patch) => {
            info!(
                namespace,
                containers = patch.0.len(),
                "injecting host IP into pod containers"
            );
            response
                .with_patch(&patch)
                .map_err(AdmissionError::PatchSerialization)
        }
        None => {
            debug!(namespace, "pod not mutated");
            Ok(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        admission_request::GroupVersionResource,
        admission_response::PatchType,
        hierarchy::tests::{FakeCluster, deployment, namespace, pod, replica_set},
    };
    use base64::{Engine as _, engine::general_purpose};
    use k8s_openapi::{
        api::core::v1::{Container, PodSpec},
        apimachinery::pkg::runtime::RawExtension,
    };
    use serde_json::json;
    use std::collections::HashMap;

    fn with_containers(mut pod: Pod, names: &[&str]) -> Pod {
        pod.spec = Some(PodSpec {
            containers: names
                .iter()
                .map(|name| Container {
                    name: (*name).to_owned(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        });
        pod
    }

    fn request_for(pod: &Pod) -> AdmissionRequest {
        AdmissionRequest {
            uid: "8c3e5c10-2fa8-4a4e-9a4a-6f1f3c6b1d2e".to_owned(),
            kind: Default::default(),
            resource: pod_resource(),
            sub_resource: None,
            request_kind: None,
            name: None,
            namespace: Some("shop".to_owned()),
            operation: "CREATE".to_owned(),
            user_info: Default::default(),
            object: Some(RawExtension(serde_json::to_value(pod).unwrap())),
            dry_run: None,
        }
    }

    fn decoded_patch(response: &AdmissionResponse) -> serde_json::Value {
        let raw = general_purpose::STANDARD
            .decode(response.patch.as_ref().expect("patch expected"))
            .unwrap();
        serde_json::from_slice(&raw).unwrap()
    }

    #[tokio::test]
    async fn namespace_opt_in_patches_every_container() {
        let cluster = FakeCluster {
            namespaces: HashMap::from([("shop".to_owned(), namespace("shop", Some("true")))]),
            ..Default::default()
        };
        let pod = with_containers(pod(None, None), &["web", "worker"]);

        let response = admit(&cluster, &request_for(&pod)).await.unwrap();

        assert!(response.allowed);
        assert_eq!(response.uid, "8c3e5c10-2fa8-4a4e-9a4a-6f1f3c6b1d2e");
        assert_eq!(response.patch_type, Some(PatchType::JSONPatch));
        let patch = decoded_patch(&response);
        let paths: Vec<&str> = patch
            .as_array()
            .unwrap()
            .iter()
            .map(|op| op["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, vec!["/spec/containers/0/env", "/spec/containers/1/env"]);
        assert_eq!(patch[1]["value"][0]["name"], json!("DD_AGENT_HOST"));
    }

    #[tokio::test]
    async fn deployment_opt_out_wins_over_namespace() {
        let cluster = FakeCluster {
            namespaces: HashMap::from([("shop".to_owned(), namespace("shop", Some("true")))]),
            replica_sets: HashMap::from([(
                "web-7d4b9".to_owned(),
                replica_set("web-7d4b9", None, Some("web")),
            )]),
            deployments: HashMap::from([("web".to_owned(), deployment("web", Some("false")))]),
            ..Default::default()
        };
        let pod = with_containers(pod(Some("web-7d4b9"), None), &["web"]);

        let response = admit(&cluster, &request_for(&pod)).await.unwrap();

        assert!(response.allowed);
        assert!(response.patch.is_none());
        assert!(response.patch_type.is_none());
    }

    #[tokio::test]
    async fn no_opt_in_anywhere() {
        let cluster = FakeCluster {
            namespaces: HashMap::from([("shop".to_owned(), namespace("shop", None))]),
            ..Default::default()
        };
        let pod = with_containers(pod(None, None), &["web"]);

        let response = admit(&cluster, &request_for(&pod)).await.unwrap();

        assert_eq!(response, AdmissionResponse::allow(request_for(&pod).uid));
    }

    #[tokio::test]
    async fn pod_namespace_is_used_when_the_request_has_none() {
        let cluster = FakeCluster::default();
        let pod = pod(None, None);
        let mut request = request_for(&pod);
        request.namespace = None;

        admit(&cluster, &request).await.unwrap();

        assert_eq!(cluster.lookups(), vec!["Namespace/shop"]);
    }

    #[tokio::test]
    async fn other_resources_are_refused() {
        let cluster = FakeCluster::default();
        let mut request = request_for(&pod(None, None));
        request.resource = GroupVersionResource {
            group: "apps".to_owned(),
            version: "v1".to_owned(),
            resource: "deployments".to_owned(),
        };

        let err = admit(&cluster, &request).await.unwrap_err();

        assert!(matches!(err, AdmissionError::UnexpectedResource { .. }));
        assert_eq!(
            err.to_string(),
            "expected resource to be v1/pods, got apps/v1/deployments"
        );
        assert!(cluster.lookups().is_empty());
    }

    #[tokio::test]
    async fn missing_object() {
        let cluster = FakeCluster::default();
        let mut request = request_for(&pod(None, None));
        request.object = None;

        let err = admit(&cluster, &request).await.unwrap_err();

        assert!(matches!(err, AdmissionError::MissingObject));
    }

    #[tokio::test]
    async fn undecodable_pod() {
        let cluster = FakeCluster::default();
        let mut request = request_for(&pod(None, None));
        request.object = Some(RawExtension(json!({"spec": {"containers": "nope"}})));

        let err = admit(&cluster, &request).await.unwrap_err();

        assert!(matches!(err, AdmissionError::PodDeserialization(_)));
        assert!(cluster.lookups().is_empty());
    }
}
