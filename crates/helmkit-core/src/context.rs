//! Release context: values the caller pins per release name
//!
//! Context values are applied on top of request values when a release is
//! installed or upgraded, so they always win.

use std::collections::HashMap;

use crate::values::ImmutableValues;

#[derive(Debug, Clone, Default)]
pub struct HelmContext {
    values: HashMap<String, ImmutableValues>,
}

impl HelmContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a release name -> values mapping
    pub fn from_values(values: HashMap<String, ImmutableValues>) -> Self {
        Self { values }
    }

    /// Pin values for a release
    pub fn with_release(mut self, name: impl Into<String>, values: ImmutableValues) -> Self {
        self.values.insert(name.into(), values);
        self
    }

    /// Values pinned for a release, empty when none were given
    pub fn release(&self, name: &str) -> ImmutableValues {
        self.values.get(name).cloned().unwrap_or_default()
    }
}
