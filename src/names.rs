//! Per-class name tables.
//!
//! A [`NameTable`] holds the interned property, method and signal names a
//! class declares itself, plus a reference to its parent's table. Lookups
//! check the local names first and then walk up the chain; iteration lists
//! inherited names before local ones.
//!
//! Tables are built once per class on first use and never change afterwards.

use std::any::TypeId;
use std::sync::OnceLock;

use enginebridge_core::StringName;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{EngineClass, ScriptClass};

/// Interned member names of one class.
#[derive(Debug)]
pub struct NameTable {
    class: StringName,
    parent: Option<&'static NameTable>,
    properties: Vec<StringName>,
    methods: Vec<StringName>,
    signals: Vec<StringName>,
}

impl NameTable {
    pub fn new(class: &str, parent: Option<&'static NameTable>) -> Self {
        Self {
            class: StringName::new(class),
            parent,
            properties: Vec::new(),
            methods: Vec::new(),
            signals: Vec::new(),
        }
    }

    pub fn with_properties(mut self, names: &[&str]) -> Self {
        self.properties.extend(names.iter().map(|name| StringName::new(name)));
        self
    }

    pub fn with_methods(mut self, names: &[&str]) -> Self {
        self.methods.extend(names.iter().map(|name| StringName::new(name)));
        self
    }

    pub fn with_signals(mut self, names: &[&str]) -> Self {
        self.signals.extend(names.iter().map(|name| StringName::new(name)));
        self
    }

    pub fn class(&self) -> &StringName {
        &self.class
    }

    pub fn parent(&self) -> Option<&'static NameTable> {
        self.parent
    }

    /// Tables from this class up to the root.
    pub fn chain(&self) -> impl Iterator<Item = &NameTable> {
        std::iter::successors(Some(self), |table| table.parent)
    }

    // ==========================================================================
    // Lookups
    // ==========================================================================

    pub fn property(&self, name: &str) -> Option<&StringName> {
        self.find(name, |table| &table.properties)
    }

    pub fn method(&self, name: &str) -> Option<&StringName> {
        self.find(name, |table| &table.methods)
    }

    pub fn signal(&self, name: &str) -> Option<&StringName> {
        self.find(name, |table| &table.signals)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    pub fn has_signal(&self, name: &str) -> bool {
        self.signal(name).is_some()
    }

    fn find<'a>(&'a self, name: &str, list: impl Fn(&'a NameTable) -> &'a Vec<StringName>) -> Option<&'a StringName> {
        self.chain()
            .find_map(|table| list(table).iter().find(|local| local.as_str() == name))
    }

    // ==========================================================================
    // Iteration
    // ==========================================================================

    pub fn local_properties(&self) -> &[StringName] {
        &self.properties
    }

    pub fn local_methods(&self) -> &[StringName] {
        &self.methods
    }

    pub fn local_signals(&self) -> &[StringName] {
        &self.signals
    }

    /// All property names, inherited first.
    pub fn properties(&self) -> Vec<&StringName> {
        self.collect(|table| &table.properties)
    }

    /// All method names, inherited first.
    pub fn methods(&self) -> Vec<&StringName> {
        self.collect(|table| &table.methods)
    }

    /// All signal names, inherited first.
    pub fn signals(&self) -> Vec<&StringName> {
        self.collect(|table| &table.signals)
    }

    fn collect<'a>(&'a self, list: impl Fn(&'a NameTable) -> &'a Vec<StringName>) -> Vec<&'a StringName> {
        let mut tables: Vec<&NameTable> = self.chain().collect();
        tables.reverse();

        let mut seen = FxHashSet::default();
        tables
            .into_iter()
            .flat_map(|table| list(table).iter())
            .filter(|&name| seen.insert(name.as_str()))
            .collect()
    }
}

// ============================================================================
// Script Class Tables
// ============================================================================

static SCRIPT_TABLES: OnceLock<RwLock<FxHashMap<TypeId, &'static NameTable>>> = OnceLock::new();

/// Name table of a script class: its base class's table extended with the
/// script's overrides, methods and signals.
pub fn script_names<T: ScriptClass>() -> &'static NameTable {
    let tables = SCRIPT_TABLES.get_or_init(Default::default);
    let key = TypeId::of::<T>();
    if let Some(table) = tables.read().get(&key).copied() {
        return table;
    }

    let mut tables = tables.write();
    *tables.entry(key).or_insert_with(|| {
        let methods: Vec<&str> = T::OVERRIDES.iter().chain(T::METHODS).copied().collect();
        let table = NameTable::new(T::CLASS_NAME, Some(<T::Base as EngineClass>::names()))
            .with_methods(&methods)
            .with_signals(T::SIGNALS);
        log::debug!("built name table for script class {}", T::CLASS_NAME);
        let table: &'static NameTable = Box::leak(Box::new(table));
        table
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> &'static NameTable {
        static TABLE: OnceLock<NameTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            NameTable::new("Base", None)
                .with_properties(&["name"])
                .with_methods(&["get_name", "set_name"])
                .with_signals(&["renamed"])
        })
    }

    fn child() -> &'static NameTable {
        static TABLE: OnceLock<NameTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            NameTable::new("Child", Some(root()))
                .with_properties(&["position"])
                .with_methods(&["get_position", "set_name"])
                .with_signals(&["moved"])
        })
    }

    #[test]
    fn lookup_falls_back_to_parent() {
        let table = child();
        assert!(table.has_property("position"));
        assert!(table.has_property("name"));
        assert!(table.has_signal("renamed"));
        assert!(!table.has_method("missing"));
        assert!(!root().has_property("position"));
    }

    #[test]
    fn lookups_return_interned_names() {
        let name = child().method("get_name").unwrap();
        assert!(name.ptr_eq(&StringName::new("get_name")));
    }

    #[test]
    fn iteration_lists_inherited_names_first() {
        let methods: Vec<&str> = child().methods().into_iter().map(StringName::as_str).collect();
        assert_eq!(methods, ["get_name", "set_name", "get_position"]);

        let signals: Vec<&str> = child().signals().into_iter().map(StringName::as_str).collect();
        assert_eq!(signals, ["renamed", "moved"]);
    }

    #[test]
    fn local_names_exclude_parent() {
        assert_eq!(child().local_properties().len(), 1);
        assert_eq!(child().chain().count(), 2);
        assert_eq!(child().parent().map(|p| p.class().as_str()), Some("Base"));
    }
}
