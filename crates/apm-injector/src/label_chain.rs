use std::fmt;

use tracing::{debug, warn};

use crate::{
    constants::OPT_IN_LABEL,
    errors::LabelValueError,
    hierarchy::{Hierarchy, Labels},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Namespace,
    Deployment,
    ReplicaSet,
    Pod,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Level::Namespace => write!(f, "namespace"),
            Level::Deployment => write!(f, "deployment"),
            Level::ReplicaSet => write!(f, "replicaset"),
            Level::Pod => write!(f, "pod"),
        }
    }
}

/// Label maps of a pod and of its ancestors, ordered from the most
/// general (namespace) to the most specific (pod).
#[derive(Debug, Default)]
pub struct LabelChain<'a> {
    levels: Vec<(Level, &'a Labels)>,
}

impl<'a> LabelChain<'a> {
    /// Build the chain out of a resolved hierarchy and the pod's own labels.
    /// Levels missing from the hierarchy are skipped.
    pub fn new(hierarchy: &'a Hierarchy, pod_labels: Option<&'a Labels>) -> Self {
        let mut chain = LabelChain::default();
        chain.push(Level::Namespace, Some(&hierarchy.namespace_labels));
        chain.push(Level::Deployment, hierarchy.deployment_labels.as_ref());
        chain.push(Level::ReplicaSet, hierarchy.replica_set_labels.as_ref());
        chain.push(Level::Pod, pod_labels);
        chain
    }

    fn push(&mut self, level: Level, labels: Option<&'a Labels>) {
        if let Some(labels) = labels {
            self.levels.push((level, labels));
        }
    }

    /// Opt-in values set along the chain, in order. Levels without the
    /// label, or with an empty value, do not contribute.
    pub fn opt_in_values(&self) -> Vec<(Level, &'a str)> {
        self.levels
            .iter()
            .filter_map(|(level, labels)| {
                labels
                    .get(OPT_IN_LABEL)
                    .map(String::as_str)
                    .filter(|value| !value.is_empty())
                    .map(|value| (*level, value))
            })
            .collect()
    }

    /// Whether the pod opted into the injection.
    ///
    /// The most specific non-empty value wins. No value at all means `false`,
    /// and so does a value that is not a boolean.
    pub fn decide(&self) -> bool {
        let Some((level, value)) = self.opt_in_values().last().copied() else {
            debug!("opt-in label not set, skipping injection");
            return false;
        };

        match parse_opt_in_value(value) {
            Ok(decision) => {
                debug!(%level, value, decision, "opt-in label found");
                decision
            }
            Err(e) => {
                warn!(%level, error = %e, "malformed opt-in label, skipping injection");
                false
            }
        }
    }
}

/// Parse a label value using the usual boolean spellings:
/// `1`, `t`, `T`, `TRUE`, `true`, `True` and their `false` counterparts.
pub fn parse_opt_in_value(value: &str) -> Result<bool, LabelValueError> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(LabelValueError {
            label: OPT_IN_LABEL.to_owned(),
            value: value.to_owned(),
        }),
    }
}
