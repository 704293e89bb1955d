//! Resource descriptor table
//!
//! Every kind the client can read is described once here. Descriptors drive
//! REST path derivation and the comparisons made by the release filter.

use kube::core::{ApiResource, GroupVersionKind};
use std::fmt;

use crate::manifest::ResourceId;

/// Static description of a Kubernetes kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    /// API group, empty for the core group
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    /// Plural resource name used in REST paths
    pub plural: &'static str,
    /// Whether objects of this kind live in a namespace
    pub scoped: bool,
}

impl ResourceKind {
    pub const fn new(
        group: &'static str,
        version: &'static str,
        kind: &'static str,
        plural: &'static str,
        scoped: bool,
    ) -> Self {
        Self {
            group,
            version,
            kind,
            plural,
            scoped,
        }
    }

    /// `group/version`, or just `version` for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(self.group, self.version, self.kind)
    }

    /// API resource used to build a dynamic `Api`
    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(&self.gvk(), self.plural)
    }

    /// Resource name as the API server reports it (`deployments.apps`)
    pub fn resource_name(&self) -> String {
        if self.group.is_empty() {
            self.plural.to_string()
        } else {
            format!("{}.{}", self.plural, self.group)
        }
    }

    /// Whether an `apiVersion`/`kind` pair names this kind
    pub fn is(&self, api_version: &str, kind: &str) -> bool {
        self.kind == kind && self.api_version() == api_version
    }

    /// Whether a manifest entry has this group, version and kind
    pub fn matches_id(&self, id: &ResourceId) -> bool {
        self.group == id.group && self.version == id.version && self.kind == id.kind
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.api_version())
    }
}

pub mod admissionregistration_v1 {
    use super::ResourceKind;

    const GROUP: &str = "admissionregistration.k8s.io";

    pub const MUTATING_WEBHOOK_CONFIGURATION: ResourceKind = ResourceKind::new(
        GROUP,
        "v1",
        "MutatingWebhookConfiguration",
        "mutatingwebhookconfigurations",
        false,
    );
    pub const VALIDATING_WEBHOOK_CONFIGURATION: ResourceKind = ResourceKind::new(
        GROUP,
        "v1",
        "ValidatingWebhookConfiguration",
        "validatingwebhookconfigurations",
        false,
    );
}

pub mod apiextensions_v1 {
    use super::ResourceKind;

    pub const CUSTOM_RESOURCE_DEFINITION: ResourceKind = ResourceKind::new(
        "apiextensions.k8s.io",
        "v1",
        "CustomResourceDefinition",
        "customresourcedefinitions",
        false,
    );
}

pub mod apiextensions_v1beta1 {
    use super::ResourceKind;

    pub const CUSTOM_RESOURCE_DEFINITION: ResourceKind = ResourceKind::new(
        "apiextensions.k8s.io",
        "v1beta1",
        "CustomResourceDefinition",
        "customresourcedefinitions",
        false,
    );
}

pub mod apps_v1 {
    use super::ResourceKind;

    pub const DAEMON_SET: ResourceKind =
        ResourceKind::new("apps", "v1", "DaemonSet", "daemonsets", true);
    pub const DEPLOYMENT: ResourceKind =
        ResourceKind::new("apps", "v1", "Deployment", "deployments", true);
    pub const REPLICA_SET: ResourceKind =
        ResourceKind::new("apps", "v1", "ReplicaSet", "replicasets", true);
    pub const STATEFUL_SET: ResourceKind =
        ResourceKind::new("apps", "v1", "StatefulSet", "statefulsets", true);
}

pub mod apps_v1beta1 {
    use super::ResourceKind;

    pub const DEPLOYMENT: ResourceKind =
        ResourceKind::new("apps", "v1beta1", "Deployment", "deployments", true);
    pub const STATEFUL_SET: ResourceKind =
        ResourceKind::new("apps", "v1beta1", "StatefulSet", "statefulsets", true);
}

pub mod batch_v1 {
    use super::ResourceKind;

    pub const JOB: ResourceKind = ResourceKind::new("batch", "v1", "Job", "jobs", true);
    pub const CRON_JOB: ResourceKind = ResourceKind::new("batch", "v1", "CronJob", "cronjobs", true);
}

pub mod batch_v1beta1 {
    use super::ResourceKind;

    pub const CRON_JOB: ResourceKind =
        ResourceKind::new("batch", "v1beta1", "CronJob", "cronjobs", true);
}

pub mod batch_v2alpha1 {
    use super::ResourceKind;

    pub const CRON_JOB: ResourceKind =
        ResourceKind::new("batch", "v2alpha1", "CronJob", "cronjobs", true);
}

pub mod extensions_v1beta1 {
    use super::ResourceKind;

    pub const INGRESS: ResourceKind =
        ResourceKind::new("extensions", "v1beta1", "Ingress", "ingresses", true);
}

pub mod networking_v1 {
    use super::ResourceKind;

    pub const INGRESS: ResourceKind =
        ResourceKind::new("networking.k8s.io", "v1", "Ingress", "ingresses", true);
}

pub mod networking_v1beta1 {
    use super::ResourceKind;

    pub const INGRESS: ResourceKind =
        ResourceKind::new("networking.k8s.io", "v1beta1", "Ingress", "ingresses", true);
}

pub mod policy_v1 {
    use super::ResourceKind;

    pub const POD_DISRUPTION_BUDGET: ResourceKind = ResourceKind::new(
        "policy",
        "v1",
        "PodDisruptionBudget",
        "poddisruptionbudgets",
        true,
    );
}

pub mod policy_v1beta1 {
    use super::ResourceKind;

    pub const POD_DISRUPTION_BUDGET: ResourceKind = ResourceKind::new(
        "policy",
        "v1beta1",
        "PodDisruptionBudget",
        "poddisruptionbudgets",
        true,
    );
    pub const POD_SECURITY_POLICY: ResourceKind = ResourceKind::new(
        "policy",
        "v1beta1",
        "PodSecurityPolicy",
        "podsecuritypolicies",
        false,
    );
}

pub mod rbac_v1 {
    use super::ResourceKind;

    const GROUP: &str = "rbac.authorization.k8s.io";

    pub const CLUSTER_ROLE: ResourceKind =
        ResourceKind::new(GROUP, "v1", "ClusterRole", "clusterroles", false);
    pub const CLUSTER_ROLE_BINDING: ResourceKind = ResourceKind::new(
        GROUP,
        "v1",
        "ClusterRoleBinding",
        "clusterrolebindings",
        false,
    );
    pub const ROLE: ResourceKind = ResourceKind::new(GROUP, "v1", "Role", "roles", true);
    pub const ROLE_BINDING: ResourceKind =
        ResourceKind::new(GROUP, "v1", "RoleBinding", "rolebindings", true);
}

pub mod storage_v1 {
    use super::ResourceKind;

    pub const STORAGE_CLASS: ResourceKind = ResourceKind::new(
        "storage.k8s.io",
        "v1",
        "StorageClass",
        "storageclasses",
        false,
    );
}

pub mod core_v1 {
    use super::ResourceKind;

    pub const CONFIG_MAP: ResourceKind = ResourceKind::new("", "v1", "ConfigMap", "configmaps", true);
    pub const ENDPOINTS: ResourceKind = ResourceKind::new("", "v1", "Endpoints", "endpoints", true);
    pub const NAMESPACE: ResourceKind =
        ResourceKind::new("", "v1", "Namespace", "namespaces", false);
    pub const NODE: ResourceKind = ResourceKind::new("", "v1", "Node", "nodes", false);
    pub const PERSISTENT_VOLUME: ResourceKind =
        ResourceKind::new("", "v1", "PersistentVolume", "persistentvolumes", false);
    pub const PERSISTENT_VOLUME_CLAIM: ResourceKind = ResourceKind::new(
        "",
        "v1",
        "PersistentVolumeClaim",
        "persistentvolumeclaims",
        true,
    );
    pub const POD: ResourceKind = ResourceKind::new("", "v1", "Pod", "pods", true);
    pub const POD_TEMPLATE: ResourceKind =
        ResourceKind::new("", "v1", "PodTemplate", "podtemplates", true);
    pub const SECRET: ResourceKind = ResourceKind::new("", "v1", "Secret", "secrets", true);
    pub const SERVICE: ResourceKind = ResourceKind::new("", "v1", "Service", "services", true);
}

/// Every supported kind
pub static ALL: &[ResourceKind] = &[
    admissionregistration_v1::MUTATING_WEBHOOK_CONFIGURATION,
    admissionregistration_v1::VALIDATING_WEBHOOK_CONFIGURATION,
    apiextensions_v1::CUSTOM_RESOURCE_DEFINITION,
    apiextensions_v1beta1::CUSTOM_RESOURCE_DEFINITION,
    apps_v1::DAEMON_SET,
    apps_v1::DEPLOYMENT,
    apps_v1::REPLICA_SET,
    apps_v1::STATEFUL_SET,
    apps_v1beta1::DEPLOYMENT,
    apps_v1beta1::STATEFUL_SET,
    batch_v1::JOB,
    batch_v1::CRON_JOB,
    batch_v1beta1::CRON_JOB,
    batch_v2alpha1::CRON_JOB,
    extensions_v1beta1::INGRESS,
    networking_v1::INGRESS,
    networking_v1beta1::INGRESS,
    policy_v1::POD_DISRUPTION_BUDGET,
    policy_v1beta1::POD_DISRUPTION_BUDGET,
    policy_v1beta1::POD_SECURITY_POLICY,
    rbac_v1::CLUSTER_ROLE,
    rbac_v1::CLUSTER_ROLE_BINDING,
    rbac_v1::ROLE,
    rbac_v1::ROLE_BINDING,
    storage_v1::STORAGE_CLASS,
    core_v1::CONFIG_MAP,
    core_v1::ENDPOINTS,
    core_v1::NAMESPACE,
    core_v1::NODE,
    core_v1::PERSISTENT_VOLUME,
    core_v1::PERSISTENT_VOLUME_CLAIM,
    core_v1::POD,
    core_v1::POD_TEMPLATE,
    core_v1::SECRET,
    core_v1::SERVICE,
];

/// Find the descriptor for an `apiVersion`/`kind` pair
pub fn lookup(api_version: &str, kind: &str) -> Option<&'static ResourceKind> {
    ALL.iter().find(|k| k.is(api_version, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version() {
        assert_eq!(core_v1::POD.api_version(), "v1");
        assert_eq!(apps_v1::DEPLOYMENT.api_version(), "apps/v1");
        assert_eq!(
            networking_v1beta1::INGRESS.api_version(),
            "networking.k8s.io/v1beta1"
        );
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("apps/v1", "ReplicaSet"), Some(&apps_v1::REPLICA_SET));
        assert_eq!(lookup("v1", "Service"), Some(&core_v1::SERVICE));
        assert_eq!(
            lookup("apps/v1beta1", "Deployment"),
            Some(&apps_v1beta1::DEPLOYMENT)
        );
        assert!(lookup("apps/v1", "Service").is_none());
        assert!(lookup("example.com/v1", "Widget").is_none());
    }

    #[test]
    fn test_api_resource() {
        let resource = apps_v1::STATEFUL_SET.api_resource();
        assert_eq!(resource.group, "apps");
        assert_eq!(resource.api_version, "apps/v1");
        assert_eq!(resource.plural, "statefulsets");

        let resource = core_v1::NODE.api_resource();
        assert_eq!(resource.group, "");
        assert_eq!(resource.api_version, "v1");
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(apps_v1::DEPLOYMENT.resource_name(), "deployments.apps");
        assert_eq!(core_v1::POD.resource_name(), "pods");
    }

    #[test]
    fn test_table_is_unique() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert!(
                    !(a.group == b.group && a.version == b.version && a.kind == b.kind),
                    "duplicate descriptor {}",
                    a
                );
            }
        }
    }
}
