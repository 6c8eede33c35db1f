//! Discovered column catalog with per-column selection flags

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::DiscoveryError;

/// A single discovered column and whether it is included in the transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub name: String,
    pub selected: bool,
}

/// Ordered set of columns discovered on the configured source.
///
/// Order is the discovery order reported by the endpoint and stays stable
/// across toggles. Names are unique within a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCatalog {
    entries: Vec<ColumnEntry>,
}

impl ColumnCatalog {
    /// Build a catalog from a discovery result, every entry unselected.
    ///
    /// An empty list means the source has nothing to offer; blank or
    /// duplicate names mean the source schema was not usable.
    pub fn from_discovery(names: Vec<String>) -> Result<Self, DiscoveryError> {
        if names.is_empty() {
            return Err(DiscoveryError::SourceEmpty(
                "source reported no columns".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(DiscoveryError::ParseFailure(
                    "blank column name in source schema".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(DiscoveryError::ParseFailure(format!(
                    "duplicate column name {name:?}"
                )));
            }
        }
        Ok(Self {
            entries: names
                .into_iter()
                .map(|name| ColumnEntry {
                    name,
                    selected: false,
                })
                .collect(),
        })
    }

    /// Flip one entry's selection flag. Returns false if the name is not
    /// in the catalog, in which case nothing changes.
    pub fn toggle(&mut self, name: &str) -> bool {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.selected = !entry.selected;
                true
            }
            None => false,
        }
    }

    pub fn select_all(&mut self) {
        for entry in &mut self.entries {
            entry.selected = true;
        }
    }

    pub fn deselect_all(&mut self) {
        for entry in &mut self.entries {
            entry.selected = false;
        }
    }

    pub fn entries(&self) -> &[ColumnEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.selected).count()
    }

    /// Selected column names in catalog order
    pub fn selected_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.selected)
            .map(|entry| entry.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> ColumnCatalog {
        ColumnCatalog::from_discovery(names.iter().map(|n| n.to_string()).collect()).unwrap()
    }

    #[test]
    fn discovery_rejects_empty_list() {
        let result = ColumnCatalog::from_discovery(Vec::new());
        assert!(matches!(result, Err(DiscoveryError::SourceEmpty(_))));
    }

    #[test]
    fn discovery_rejects_blank_and_duplicate_names() {
        let result = ColumnCatalog::from_discovery(vec!["id".to_string(), "  ".to_string()]);
        assert!(matches!(result, Err(DiscoveryError::ParseFailure(_))));

        let result = ColumnCatalog::from_discovery(vec!["id".to_string(), "id".to_string()]);
        assert!(matches!(result, Err(DiscoveryError::ParseFailure(_))));
    }

    #[test]
    fn toggle_is_an_involution() {
        let mut cat = catalog(&["id", "name", "amount"]);
        let before = cat.clone();
        assert!(cat.toggle("name"));
        assert!(cat.toggle("name"));
        assert_eq!(cat, before);
    }

    #[test]
    fn toggle_unknown_name_changes_nothing() {
        let mut cat = catalog(&["id", "name"]);
        let before = cat.clone();
        assert!(!cat.toggle("missing"));
        assert_eq!(cat, before);
    }

    #[test]
    fn select_all_then_deselect_all_restores_flags() {
        let mut cat = catalog(&["id", "name", "amount"]);
        let before = cat.clone();
        cat.select_all();
        assert_eq!(cat.selected_count(), 3);
        cat.deselect_all();
        assert_eq!(cat, before);
    }

    #[test]
    fn selected_names_preserve_catalog_order() {
        let mut cat = catalog(&["id", "name", "amount"]);
        cat.toggle("amount");
        cat.toggle("id");
        assert_eq!(cat.selected_names(), vec!["id", "amount"]);
    }
}
