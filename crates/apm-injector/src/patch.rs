use json_patch::{AddOperation, Patch, PatchOperation, jsonptr::PointerBuf};
use k8s_openapi::api::core::v1::{EnvVar, Pod};
use tracing::error;

use crate::constants::host_ip_env_var;

/// Build the patch injecting the host IP variable, or `None` when the
/// pod did not opt in.
///
/// Each container gets one `add` operation replacing its whole `env`
/// list with the current entries plus the host IP variable. An existing
/// variable with the same name is not detected: patching an already
/// patched pod appends a second entry.
pub fn build(pod: &Pod, inject: bool) -> Option<Patch> {
    if !inject {
        return None;
    }

    let containers = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .unwrap_or_default();

    let operations = containers
        .iter()
        .enumerate()
        .filter_map(|(index, container)| {
            let mut env = container.env.clone().unwrap_or_default();
            env.push(host_ip_env_var());

            match env_operation(index, &env) {
                Ok(operation) => Some(operation),
                Err(e) => {
                    error!(
                        container = container.name.as_str(),
                        error = %e,
                        "error marshalling env vars into json"
                    );
                    None
                }
            }
        })
        .collect();

    Some(Patch(operations))
}

fn env_operation(index: usize, env: &[EnvVar]) -> Result<PatchOperation, String> {
    let value = serde_json::to_value(env).map_err(|e| e.to_string())?;
    let path = PointerBuf::parse(&format!("/spec/containers/{index}/env"))
        .map_err(|e| e.to_string())?;

    Ok(PatchOperation::Add(AddOperation { path, value }))
}
