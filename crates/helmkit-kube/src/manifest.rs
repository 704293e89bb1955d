//! Release manifest parsing
//!
//! A rendered release manifest is a multi-document YAML stream. The filter
//! only needs the identity of each object, so that is all we keep.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{KubeError, Result};
use crate::kinds::{self, ResourceKind};

/// Identity of one object rendered by a release
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// API group, empty for the core group
    pub group: String,
    pub version: String,
    pub kind: String,
    /// Empty for cluster-scoped objects
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    /// `group/version`, or just `version` for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// Objects rendered by a release, in manifest order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceList(Vec<ResourceId>);

impl ResourceList {
    pub fn new(resources: Vec<ResourceId>) -> Self {
        Self(resources)
    }

    /// Parse a release manifest
    ///
    /// Objects without a namespace get `namespace` unless their kind is
    /// known to be cluster-scoped.
    pub fn from_manifest(manifest: &str, namespace: &str) -> Result<Self> {
        let mut resources = Vec::new();

        for document in serde_yaml::Deserializer::from_str(manifest) {
            let value = JsonValue::deserialize(document)?;
            collect(&value, namespace, &mut resources)?;
        }

        Ok(Self(resources))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether an object of `kind` with this namespace and name was rendered
    pub fn contains(&self, kind: &ResourceKind, namespace: &str, name: &str) -> bool {
        self.0
            .iter()
            .any(|id| kind.matches_id(id) && id.namespace == namespace && id.name == name)
    }

    /// Whether an owner reference points at a rendered object
    pub fn contains_owner(&self, api_version: &str, kind: &str, name: &str) -> bool {
        self.0
            .iter()
            .any(|id| id.kind == kind && id.name == name && id.api_version() == api_version)
    }
}

impl IntoIterator for ResourceList {
    type Item = ResourceId;
    type IntoIter = std::vec::IntoIter<ResourceId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn collect(value: &JsonValue, namespace: &str, out: &mut Vec<ResourceId>) -> Result<()> {
    // comment-only documents
    if value.is_null() {
        return Ok(());
    }

    let api_version = field(value, &["apiVersion"])?;
    let kind = field(value, &["kind"])?;

    if kind == "List" {
        if let Some(items) = value.get("items").and_then(JsonValue::as_array) {
            for item in items {
                collect(item, namespace, out)?;
            }
        }
        return Ok(());
    }

    let name = field(value, &["metadata", "name"])?;
    let (group, version) = match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.clone()),
    };

    let cluster_scoped = kinds::lookup(&api_version, &kind).is_some_and(|k| !k.scoped);
    let namespace = if cluster_scoped {
        String::new()
    } else {
        value
            .pointer("/metadata/namespace")
            .and_then(JsonValue::as_str)
            .filter(|ns| !ns.is_empty())
            .unwrap_or(namespace)
            .to_string()
    };

    out.push(ResourceId {
        group,
        version,
        kind,
        namespace,
        name,
    });
    Ok(())
}

fn field(value: &JsonValue, path: &[&str]) -> Result<String> {
    let mut current = value;
    for key in path {
        current = current.get(key).ok_or_else(|| missing(path))?;
    }
    current
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| missing(path))
}

fn missing(path: &[&str]) -> KubeError {
    KubeError::InvalidManifest(format!("document without {}", path.join(".")))
}
