//! Default namespace resolution

/// Namespace selected by the Helm CLI environment
pub const HELM_NAMESPACE_ENV: &str = "HELM_NAMESPACE";

/// Namespace injected into pods through the downward API
pub const POD_NAMESPACE_ENV: &str = "POD_NAMESPACE";

pub const DEFAULT_NAMESPACE: &str = "default";

/// Namespace from the process environment
pub fn namespace_from_env() -> String {
    namespace_from_lookup(|key| std::env::var(key).ok())
}

/// Namespace from an arbitrary variable lookup
///
/// `HELM_NAMESPACE` wins over `POD_NAMESPACE`; empty values are ignored.
pub fn namespace_from_lookup<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    [HELM_NAMESPACE_ENV, POD_NAMESPACE_ENV]
        .into_iter()
        .filter_map(|key| lookup(key))
        .find(|ns| !ns.is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}
