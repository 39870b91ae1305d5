use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, ObjectFieldSelector};

use crate::admission_request::GroupVersionResource;

/// Label toggling the injection on a Namespace, Deployment, ReplicaSet or Pod.
pub const OPT_IN_LABEL: &str = "datadog-apm-enabled";

/// Name of the environment variable added to every container.
pub const HOST_IP_ENV_VAR_NAME: &str = "DD_AGENT_HOST";

pub const HOST_IP_FIELD_API_VERSION: &str = "v1";
pub const HOST_IP_FIELD_PATH: &str = "status.hostIP";

pub const POD_RESOURCE_GROUP: &str = "";
pub const POD_RESOURCE_VERSION: &str = "v1";
pub const POD_RESOURCE: &str = "pods";

/// The only resource the webhook knows how to mutate.
pub fn pod_resource() -> GroupVersionResource {
    GroupVersionResource {
        group: POD_RESOURCE_GROUP.to_owned(),
        version: POD_RESOURCE_VERSION.to_owned(),
        resource: POD_RESOURCE.to_owned(),
    }
}

/// The environment variable pointing at the node's host IP.
///
/// The value is a field reference: the kubelet resolves it when the
/// container starts, not when the pod is admitted.
pub fn host_ip_env_var() -> EnvVar {
    EnvVar {
        name: HOST_IP_ENV_VAR_NAME.to_owned(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                api_version: Some(HOST_IP_FIELD_API_VERSION.to_owned()),
                field_path: HOST_IP_FIELD_PATH.to_owned(),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
