//! Per-group clients
//!
//! Each API group/version gets a small client whose methods return readers
//! for the kinds of that group. Kinds still shipped by `k8s-openapi` decode
//! into its types; retired beta kinds decode into `DynamicObject`.

use k8s_openapi::api::admissionregistration::v1 as admissionregistration;
use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::batch::v1 as batch;
use k8s_openapi::api::core::v1 as core;
use k8s_openapi::api::networking::v1 as networking;
use k8s_openapi::api::policy::v1 as policy;
use k8s_openapi::api::rbac::v1 as rbac;
use k8s_openapi::api::storage::v1 as storage;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1 as apiextensions;
use kube::api::DynamicObject;

use crate::client::KubernetesClient;
use crate::kinds;
use crate::reader::Reader;

macro_rules! group_client {
    (
        $(#[$doc:meta])*
        $client:ident {
            $($method:ident => $kind:path : $ty:ty),* $(,)?
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $client {
            client: KubernetesClient,
        }

        impl $client {
            pub(crate) fn new(client: KubernetesClient) -> Self {
                Self { client }
            }

            $(
                pub fn $method(&self) -> Reader<$ty> {
                    self.client.reader(&$kind)
                }
            )*
        }
    };
}

group_client! {
    /// admissionregistration.k8s.io/v1
    AdmissionregistrationV1 {
        mutating_webhook_configurations =>
            kinds::admissionregistration_v1::MUTATING_WEBHOOK_CONFIGURATION
            : admissionregistration::MutatingWebhookConfiguration,
        validating_webhook_configurations =>
            kinds::admissionregistration_v1::VALIDATING_WEBHOOK_CONFIGURATION
            : admissionregistration::ValidatingWebhookConfiguration,
    }
}

group_client! {
    /// apiextensions.k8s.io/v1
    ApiextensionsV1 {
        custom_resource_definitions =>
            kinds::apiextensions_v1::CUSTOM_RESOURCE_DEFINITION
            : apiextensions::CustomResourceDefinition,
    }
}

group_client! {
    /// apiextensions.k8s.io/v1beta1
    ApiextensionsV1beta1 {
        custom_resource_definitions =>
            kinds::apiextensions_v1beta1::CUSTOM_RESOURCE_DEFINITION : DynamicObject,
    }
}

group_client! {
    /// apps/v1
    AppsV1 {
        daemon_sets => kinds::apps_v1::DAEMON_SET : apps::DaemonSet,
        deployments => kinds::apps_v1::DEPLOYMENT : apps::Deployment,
        replica_sets => kinds::apps_v1::REPLICA_SET : apps::ReplicaSet,
        stateful_sets => kinds::apps_v1::STATEFUL_SET : apps::StatefulSet,
    }
}

group_client! {
    /// apps/v1beta1
    AppsV1beta1 {
        deployments => kinds::apps_v1beta1::DEPLOYMENT : DynamicObject,
        stateful_sets => kinds::apps_v1beta1::STATEFUL_SET : DynamicObject,
    }
}

group_client! {
    /// batch/v1
    BatchV1 {
        jobs => kinds::batch_v1::JOB : batch::Job,
        cron_jobs => kinds::batch_v1::CRON_JOB : batch::CronJob,
    }
}

group_client! {
    /// batch/v1beta1
    BatchV1beta1 {
        cron_jobs => kinds::batch_v1beta1::CRON_JOB : DynamicObject,
    }
}

group_client! {
    /// batch/v2alpha1
    BatchV2alpha1 {
        cron_jobs => kinds::batch_v2alpha1::CRON_JOB : DynamicObject,
    }
}

group_client! {
    /// extensions/v1beta1
    ExtensionsV1beta1 {
        ingresses => kinds::extensions_v1beta1::INGRESS : DynamicObject,
    }
}

group_client! {
    /// networking.k8s.io/v1
    NetworkingV1 {
        ingresses => kinds::networking_v1::INGRESS : networking::Ingress,
    }
}

group_client! {
    /// networking.k8s.io/v1beta1
    NetworkingV1beta1 {
        ingresses => kinds::networking_v1beta1::INGRESS : DynamicObject,
    }
}

group_client! {
    /// policy/v1
    PolicyV1 {
        pod_disruption_budgets =>
            kinds::policy_v1::POD_DISRUPTION_BUDGET : policy::PodDisruptionBudget,
    }
}

group_client! {
    /// policy/v1beta1
    PolicyV1beta1 {
        pod_disruption_budgets => kinds::policy_v1beta1::POD_DISRUPTION_BUDGET : DynamicObject,
        pod_security_policies => kinds::policy_v1beta1::POD_SECURITY_POLICY : DynamicObject,
    }
}

group_client! {
    /// rbac.authorization.k8s.io/v1
    RbacV1 {
        cluster_roles => kinds::rbac_v1::CLUSTER_ROLE : rbac::ClusterRole,
        cluster_role_bindings => kinds::rbac_v1::CLUSTER_ROLE_BINDING : rbac::ClusterRoleBinding,
        roles => kinds::rbac_v1::ROLE : rbac::Role,
        role_bindings => kinds::rbac_v1::ROLE_BINDING : rbac::RoleBinding,
    }
}

group_client! {
    /// storage.k8s.io/v1
    StorageV1 {
        storage_classes => kinds::storage_v1::STORAGE_CLASS : storage::StorageClass,
    }
}

group_client! {
    /// Core group, v1
    CoreV1 {
        config_maps => kinds::core_v1::CONFIG_MAP : core::ConfigMap,
        endpoints => kinds::core_v1::ENDPOINTS : core::Endpoints,
        namespaces => kinds::core_v1::NAMESPACE : core::Namespace,
        nodes => kinds::core_v1::NODE : core::Node,
        persistent_volumes => kinds::core_v1::PERSISTENT_VOLUME : core::PersistentVolume,
        persistent_volume_claims =>
            kinds::core_v1::PERSISTENT_VOLUME_CLAIM : core::PersistentVolumeClaim,
        pods => kinds::core_v1::POD : core::Pod,
        pod_templates => kinds::core_v1::POD_TEMPLATE : core::PodTemplate,
        secrets => kinds::core_v1::SECRET : core::Secret,
        services => kinds::core_v1::SERVICE : core::Service,
    }
}
