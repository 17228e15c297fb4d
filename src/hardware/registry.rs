// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Registry of experiment rigs.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::{ExperimentRig, RigType};
use crate::error::{Error, HardwareError, Result};

/// Named rigs plus a default.
///
/// The registry is thread-safe and can be shared across async tasks.
#[derive(Default)]
pub struct RigRegistry {
    rigs: RwLock<HashMap<String, Arc<dyn ExperimentRig>>>,
    default_rig: RwLock<Option<String>>,
}

impl RigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rig, replacing any rig of the same name.
    ///
    /// The first rig registered becomes the default.
    pub fn register(&self, rig: Arc<dyn ExperimentRig>) {
        let name = rig.name().to_string();
        info!(rig = %name, rig_type = %rig.rig_type(), "Registering rig");

        self.rigs.write().insert(name.clone(), rig);

        let mut default = self.default_rig.write();
        if default.is_none() {
            debug!(rig = %name, "Setting as default rig");
            *default = Some(name);
        }
    }

    pub fn set_default(&self, name: &str) -> Result<()> {
        if !self.rigs.read().contains_key(name) {
            return Err(Error::Hardware(HardwareError::NotFound(name.to_string())));
        }
        *self.default_rig.write() = Some(name.to_string());
        info!(rig = %name, "Set as default rig");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn ExperimentRig>> {
        self.rigs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Hardware(HardwareError::NotFound(name.to_string())))
    }

    pub fn get_default(&self) -> Result<Arc<dyn ExperimentRig>> {
        let default = self.default_rig.read().clone();
        match default {
            Some(name) => self.get(&name),
            None => Err(Error::Hardware(HardwareError::NotFound(
                "No default rig configured".to_string(),
            ))),
        }
    }

    /// Get a rig by name, or the default if `name` is `None`.
    pub fn get_or_default(&self, name: Option<&str>) -> Result<Arc<dyn ExperimentRig>> {
        match name {
            Some(n) => self.get(n),
            None => self.get_default(),
        }
    }

    /// Registered rigs with their types, sorted by name.
    pub fn list_with_types(&self) -> Vec<(String, RigType)> {
        let mut rigs: Vec<_> = self
            .rigs
            .read()
            .iter()
            .map(|(name, rig)| (name.clone(), rig.rig_type()))
            .collect();
        rigs.sort_by(|a, b| a.0.cmp(&b.0));
        rigs
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rigs.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rigs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<dyn ExperimentRig>> {
        let removed = self.rigs.write().remove(name);

        if removed.is_some() {
            info!(rig = %name, "Unregistered rig");
            let mut default = self.default_rig.write();
            if default.as_deref() == Some(name) {
                warn!(rig = %name, "Unregistered default rig");
                *default = None;
            }
        }

        removed
    }

    pub fn default_rig_name(&self) -> Option<String> {
        self.default_rig.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockRig;

    #[test]
    fn test_registry_register_and_get() {
        let registry = RigRegistry::new();
        registry.register(MockRig::arc("bench"));

        assert!(registry.contains("bench"));
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("bench").unwrap().name(), "bench");
    }

    #[test]
    fn test_registry_default_rig() {
        let registry = RigRegistry::new();
        registry.register(MockRig::arc("first"));
        registry.register(MockRig::arc("second"));
        assert_eq!(registry.default_rig_name(), Some("first".to_string()));

        registry.set_default("second").unwrap();
        assert_eq!(registry.default_rig_name(), Some("second".to_string()));
        assert_eq!(registry.get_or_default(None).unwrap().name(), "second");
    }

    #[test]
    fn test_set_default_nonexistent() {
        let registry = RigRegistry::new();
        assert!(matches!(
            registry.set_default("nope"),
            Err(Error::Hardware(HardwareError::NotFound(_)))
        ));
    }

    #[test]
    fn test_get_default_empty_registry() {
        assert!(RigRegistry::new().get_default().is_err());
    }

    #[test]
    fn test_list_sorted() {
        let registry = RigRegistry::new();
        registry.register(MockRig::arc("zeta"));
        registry.register(MockRig::arc("alpha"));
        let names: Vec<_> = registry
            .list_with_types()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_unregister_default_clears() {
        let registry = RigRegistry::new();
        registry.register(MockRig::arc("only"));
        assert!(registry.unregister("only").is_some());
        assert_eq!(registry.default_rig_name(), None);
        assert!(registry.unregister("only").is_none());
    }

    #[test]
    fn test_unregister_non_default() {
        let registry = RigRegistry::new();
        registry.register(MockRig::arc("first"));
        registry.register(MockRig::arc("second"));
        registry.unregister("second");
        assert_eq!(registry.default_rig_name(), Some("first".to_string()));
    }
}
