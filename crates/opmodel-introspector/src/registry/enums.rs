//! Run-scoped enum and flags registry.
//!
//! Registration is idempotent and only assigns a target name; values are
//! fetched later, once per type, from whatever [`EnumValueSource`] the
//! discovery path provides.

use opmodel_core::naming::{enum_target_name, enum_value_target_name};
use opmodel_core::traits::EnumValueSource;
use opmodel_core::{EnumType, EnumValue, Error, ModelConfig, Result};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
struct Entry {
    target_name: String,
    flags: bool,
    values: Option<Vec<EnumValue>>,
}

/// Registry of enum and flags types discovered during one run.
///
/// # Examples
///
/// ```
/// use opmodel_core::ModelConfig;
/// use opmodel_introspector::registry::EnumRegistry;
///
/// let mut registry = EnumRegistry::new(&ModelConfig::default());
/// let first = registry.register("VipsInterpretation", false);
/// let second = registry.register("VipsInterpretation", false);
///
/// assert_eq!(first.as_deref(), Some("Interpretation"));
/// assert_eq!(first, second);
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct EnumRegistry {
    namespace: String,
    sub_prefix: String,
    max_values: usize,
    excluded: Vec<String>,
    entries: BTreeMap<String, Entry>,
    owners: HashMap<String, String>,
}

impl EnumRegistry {
    /// Creates an empty registry using the naming settings of `config`.
    #[must_use]
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            sub_prefix: config.sub_prefix.clone(),
            max_values: config.max_enum_values,
            excluded: config.excluded_enums.clone(),
            entries: BTreeMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Registers a native enum type and returns its target name.
    ///
    /// Returns `None` for excluded types. A name that would collide with an
    /// already registered type keeps its sub-prefix, falls back to the full
    /// native name if that collides too, and then to the native name with
    /// the first free numeric suffix.
    pub fn register(&mut self, native_name: &str, flags: bool) -> Option<String> {
        if let Some(entry) = self.entries.get(native_name) {
            return Some(entry.target_name.clone());
        }
        if self.excluded.iter().any(|e| e == native_name) {
            tracing::debug!(enum_type = native_name, "enum type excluded from registry");
            return None;
        }

        let stripped = enum_target_name(native_name, &self.namespace, &self.sub_prefix);
        let namespaced = native_name
            .strip_prefix(self.namespace.as_str())
            .unwrap_or(native_name)
            .to_string();

        let target_name = [stripped, namespaced, native_name.to_string()]
            .into_iter()
            .find(|candidate| !self.owners.contains_key(candidate))
            .or_else(|| {
                // More candidates than registered names, so one is free.
                (2..self.owners.len() + 3)
                    .map(|n| format!("{native_name}{n}"))
                    .find(|candidate| !self.owners.contains_key(candidate))
            })
            .unwrap_or_else(|| native_name.to_string());

        tracing::debug!(enum_type = native_name, target = %target_name, flags, "registered enum type");
        self.owners
            .insert(target_name.clone(), native_name.to_string());
        self.entries.insert(
            native_name.to_string(),
            Entry {
                target_name: target_name.clone(),
                flags,
                values: None,
            },
        );
        Some(target_name)
    }

    /// Returns `true` if the type is registered.
    #[must_use]
    pub fn contains(&self, native_name: &str) -> bool {
        self.entries.contains_key(native_name)
    }

    /// Returns `true` if the type is registered as bit flags.
    #[must_use]
    pub fn is_flags(&self, native_name: &str) -> bool {
        self.entries.get(native_name).is_some_and(|e| e.flags)
    }

    /// Returns the target name of a registered type.
    #[must_use]
    pub fn target_name(&self, native_name: &str) -> Option<&str> {
        self.entries.get(native_name).map(|e| e.target_name.as_str())
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the ordered values of a registered type, fetching them from
    /// `source` on first access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LookupMiss`] if the type is not registered or the
    /// source does not know it. A miss is not cached; a later call with a
    /// different source may succeed.
    pub fn values(
        &mut self,
        native_name: &str,
        source: &dyn EnumValueSource,
    ) -> Result<&[EnumValue]> {
        let miss = || Error::LookupMiss {
            kind: "enum".to_string(),
            name: native_name.to_string(),
        };

        let max_values = self.max_values;
        let namespace = self.namespace.clone();
        let sub_prefix = self.sub_prefix.clone();
        let entry = self.entries.get_mut(native_name).ok_or_else(miss)?;

        if entry.values.is_none() {
            let raw = source.enum_values(native_name).ok_or_else(miss)?;
            let canonical = enum_target_name(native_name, &namespace, &sub_prefix);
            let values = raw
                .into_iter()
                .take(max_values)
                .map(|v| {
                    let name = enum_value_target_name(&canonical, &v.name, &namespace, &sub_prefix);
                    let target_name = match name.strip_prefix(canonical.as_str()) {
                        Some(rest) if entry.target_name != canonical => {
                            format!("{}{rest}", entry.target_name)
                        }
                        _ => name,
                    };
                    EnumValue {
                        native_name: v.name,
                        target_name,
                        value: v.value,
                        description: v.nick,
                    }
                })
                .collect::<Vec<_>>();
            tracing::debug!(enum_type = native_name, count = values.len(), "loaded enum values");
            entry.values = Some(values);
        }

        Ok(entry.values.as_deref().unwrap_or_default())
    }

    /// Returns `true` if the registered type has a loaded value with this
    /// native name.
    ///
    /// Only values already fetched through [`values`](Self::values) count.
    #[must_use]
    pub fn has_value(&self, native_name: &str, value_name: &str) -> bool {
        self.entries
            .get(native_name)
            .and_then(|e| e.values.as_ref())
            .is_some_and(|values| values.iter().any(|v| v.native_name == value_name))
    }

    /// Native names of every registered type, in lexical order.
    pub fn native_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Snapshot of all registered types with their loaded values.
    ///
    /// Types whose values were never fetched are listed with an empty value
    /// list.
    #[must_use]
    pub fn enum_types(&self) -> Vec<EnumType> {
        self.entries
            .iter()
            .map(|(native_name, entry)| EnumType {
                native_name: native_name.clone(),
                target_name: entry.target_name.clone(),
                flags: entry.flags,
                values: entry.values.clone().unwrap_or_default(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opmodel_core::traits::RawEnumValue;
    use std::cell::Cell;

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl EnumValueSource for CountingSource {
        fn enum_values(&self, native_name: &str) -> Option<Vec<RawEnumValue>> {
            self.calls.set(self.calls.get() + 1);
            match native_name {
                "VipsAccess" => Some(vec![
                    RawEnumValue {
                        name: "VIPS_ACCESS_RANDOM".to_string(),
                        nick: "random".to_string(),
                        value: 0,
                    },
                    RawEnumValue {
                        name: "VIPS_ACCESS_SEQUENTIAL".to_string(),
                        nick: "sequential".to_string(),
                        value: 1,
                    },
                ]),
                "VipsForeignKeep" | "VipsKeep" => Some(vec![RawEnumValue {
                    name: "VIPS_FOREIGN_KEEP_EXIF".to_string(),
                    nick: "exif".to_string(),
                    value: 1,
                }]),
                _ => None,
            }
        }

        fn is_flags_type(&self, native_name: &str) -> bool {
            native_name.ends_with("Keep")
        }
    }

    fn source() -> CountingSource {
        CountingSource {
            calls: Cell::new(0),
        }
    }

    #[test]
    fn test_values_fetched_once() {
        let mut registry = EnumRegistry::new(&ModelConfig::default());
        let src = source();
        registry.register("VipsAccess", false);

        let names: Vec<_> = registry
            .values("VipsAccess", &src)
            .unwrap()
            .iter()
            .map(|v| v.target_name.clone())
            .collect();
        assert_eq!(names, vec!["AccessRandom", "AccessSequential"]);

        registry.register("VipsAccess", false);
        assert_eq!(registry.values("VipsAccess", &src).unwrap().len(), 2);
        assert_eq!(src.calls.get(), 1);
    }

    #[test]
    fn test_unregistered_lookup_misses() {
        let mut registry = EnumRegistry::new(&ModelConfig::default());
        let err = registry.values("VipsAccess", &source()).unwrap_err();
        assert!(err.is_lookup_miss());

        registry.register("VipsMystery", false);
        assert!(registry.values("VipsMystery", &source()).is_err());
    }

    #[test]
    fn test_excluded_enum_not_registered() {
        let mut registry = EnumRegistry::new(&ModelConfig::default());
        assert_eq!(registry.register("VipsForeignPngFilter", true), None);
        assert!(!registry.contains("VipsForeignPngFilter"));
    }

    #[test]
    fn test_collision_keeps_sub_prefix() {
        let mut registry = EnumRegistry::new(&ModelConfig::default());
        let plain = registry.register("VipsKeep", false).unwrap();
        let foreign = registry.register("VipsForeignKeep", true).unwrap();

        assert_eq!(plain, "Keep");
        assert_eq!(foreign, "ForeignKeep");
        assert_ne!(plain, foreign);

        let src = source();
        let values = registry.values("VipsForeignKeep", &src).unwrap();
        assert_eq!(values[0].target_name, "ForeignKeepExif");
        assert!(registry.is_flags("VipsForeignKeep"));
    }

    #[test]
    fn test_numbered_fallback_skips_taken_names() {
        let mut registry = EnumRegistry::new(&ModelConfig::default());
        assert_eq!(registry.register("Keep2", false).as_deref(), Some("Keep2"));
        assert_eq!(registry.register("VipsKeep", false).as_deref(), Some("Keep"));
        assert_eq!(registry.register("Keep", false).as_deref(), Some("Keep3"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_value_cap() {
        let config = ModelConfig::builder().max_enum_values(1).build();
        let mut registry = EnumRegistry::new(&config);
        registry.register("VipsAccess", false);
        assert_eq!(registry.values("VipsAccess", &source()).unwrap().len(), 1);
    }

    #[test]
    fn test_has_value_requires_loaded_values() {
        let mut registry = EnumRegistry::new(&ModelConfig::default());
        registry.register("VipsAccess", false);
        assert!(!registry.has_value("VipsAccess", "VIPS_ACCESS_RANDOM"));

        registry.values("VipsAccess", &source()).unwrap();
        assert!(registry.has_value("VipsAccess", "VIPS_ACCESS_RANDOM"));
        assert!(!registry.has_value("VipsAccess", "VIPS_ACCESS_LAST"));
    }

    #[test]
    fn test_snapshot_is_sorted_by_native_name() {
        let mut registry = EnumRegistry::new(&ModelConfig::default());
        registry.register("VipsKernel", false);
        registry.register("VipsAccess", false);
        let names: Vec<_> = registry.enum_types().into_iter().map(|e| e.native_name).collect();
        assert_eq!(names, vec!["VipsAccess", "VipsKernel"]);
    }
}
