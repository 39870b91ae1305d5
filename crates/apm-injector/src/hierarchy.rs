use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::{
    apps::v1::{Deployment, ReplicaSet},
    core::v1::{Namespace, Pod},
};
use kube::Api;
use tracing::{debug, error, info, warn};

use crate::errors::LookupError;

pub type Labels = BTreeMap<String, String>;

/// Read-only access to the objects a pod can inherit the opt-in label from.
#[async_trait]
pub trait ClusterLookup: Send + Sync {
    async fn namespace(&self, name: &str) -> Result<Namespace, LookupError>;

    async fn replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet, LookupError>;

    async fn deployment(&self, namespace: &str, name: &str) -> Result<Deployment, LookupError>;
}

/// `ClusterLookup` backed by the Kubernetes API server.
#[derive(Clone)]
pub struct ClusterClient {
    kube_client: kube::Client,
}

impl ClusterClient {
    pub fn new(kube_client: kube::Client) -> Self {
        Self { kube_client }
    }
}

async fn get_object<K>(api: Api<K>, kind: &'static str, name: &str) -> Result<K, LookupError>
where
    K: kube::Resource + Clone + serde::de::DeserializeOwned + std::fmt::Debug,
{
    match api.get_opt(name).await {
        Ok(Some(object)) => Ok(object),
        Ok(None) => Err(LookupError::NotFound {
            kind,
            name: name.to_owned(),
        }),
        Err(source) => Err(LookupError::Kube {
            kind,
            name: name.to_owned(),
            source,
        }),
    }
}

#[async_trait]
impl ClusterLookup for ClusterClient {
    async fn namespace(&self, name: &str) -> Result<Namespace, LookupError> {
        let api: Api<Namespace> = Api::all(self.kube_client.clone());
        get_object(api, "Namespace", name).await
    }

    async fn replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet, LookupError> {
        let api: Api<ReplicaSet> = Api::namespaced(self.kube_client.clone(), namespace);
        get_object(api, "ReplicaSet", name).await
    }

    async fn deployment(&self, namespace: &str, name: &str) -> Result<Deployment, LookupError> {
        let api: Api<Deployment> = Api::namespaced(self.kube_client.clone(), namespace);
        get_object(api, "Deployment", name).await
    }
}

/// Labels of the objects above a pod. A level is `None` when the pod
/// is not owned by such an object or when fetching it failed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    pub namespace_labels: Labels,
    pub deployment_labels: Option<Labels>,
    pub replica_set_labels: Option<Labels>,
}

/// Fetch the ancestry of `pod`: its namespace and, following the first
/// owner reference at each step, its ReplicaSet and that ReplicaSet's
/// Deployment.
///
/// Lookup failures never abort the resolution: they are logged and the
/// level is left out (the namespace level falls back to no labels).
pub async fn resolve(lookup: &dyn ClusterLookup, pod: &Pod, namespace: &str) -> Hierarchy {
    let mut hierarchy = Hierarchy::default();

    if namespace.is_empty() {
        warn!("admission request carries no namespace, namespace labels are ignored");
    } else {
        match lookup.namespace(namespace).await {
            Ok(ns) => hierarchy.namespace_labels = ns.metadata.labels.unwrap_or_default(),
            Err(e) => error!(error = %e, "error fetching namespace"),
        }
    }

    let Some(pod_owner) = first_owner_name(pod.metadata.owner_references.as_deref()) else {
        debug!("pod has no owner");
        return hierarchy;
    };

    info!(
        owner = pod_owner,
        "pod has an owner, attempting to fetch replicaset (if it belongs to one)"
    );
    let replica_set = match lookup.replica_set(namespace, pod_owner).await {
        Ok(rs) => rs,
        Err(e) => {
            error!(error = %e, "error getting owner of pod");
            return hierarchy;
        }
    };

    if let Some(rs_owner) = first_owner_name(replica_set.metadata.owner_references.as_deref()) {
        match lookup.deployment(namespace, rs_owner).await {
            Ok(deployment) => {
                hierarchy.deployment_labels = Some(deployment.metadata.labels.unwrap_or_default())
            }
            Err(e) => error!(error = %e, "error getting owner of replicaset (deployment)"),
        }
    }
    hierarchy.replica_set_labels = Some(replica_set.metadata.labels.unwrap_or_default());

    hierarchy
}

fn first_owner_name(
    owner_references: Option<&[k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference]>,
) -> Option<&str> {
    owner_references
        .and_then(|refs| refs.first())
        .map(|owner| owner.name.as_str())
}
