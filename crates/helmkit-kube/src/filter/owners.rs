//! Owner kinds the release filter can follow

use std::collections::HashMap;

use crate::kinds::{self, ResourceKind};

/// Maps an owner reference's `(apiVersion, kind)` to the descriptor used to
/// fetch the owner
///
/// The default table covers every kind in [`kinds::ALL`]. Custom kinds can be
/// added with [`OwnerTable::register`].
#[derive(Debug, Clone)]
pub struct OwnerTable {
    kinds: HashMap<(String, String), &'static ResourceKind>,
}

impl OwnerTable {
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: &'static ResourceKind) -> &mut Self {
        self.kinds
            .insert((kind.api_version(), kind.kind.to_string()), kind);
        self
    }

    pub fn with(mut self, kind: &'static ResourceKind) -> Self {
        self.register(kind);
        self
    }

    /// Descriptor for an owner reference, `None` when the kind is unsupported
    pub fn resolve(&self, api_version: &str, kind: &str) -> Option<&'static ResourceKind> {
        self.kinds
            .get(&(api_version.to_string(), kind.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for OwnerTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for kind in kinds::ALL {
            table.register(kind);
        }
        table
    }
}
