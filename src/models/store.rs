//! The preference store: a lookup map plus an ordered edit view.
//!
//! `PreferenceFile` keeps the same entries twice: a `HashMap` that is
//! authoritative for existence and lookup, and a `Vec` that is authoritative
//! for presentation order. All mutation funnels through two private helpers
//! so the structures cannot drift apart.

use std::collections::HashMap;

use crate::codec;
use crate::models::{PrefEntry, PrefValue};

/// An editable preference file held in memory.
///
/// Ordering rules:
/// - entries created through [`add`](Self::add) go to the front of the list
///   (most recently created first),
/// - updating an existing key keeps its position,
/// - renaming a key onto another existing key merges into the target key's
///   position and drops the renamed-away entry.
///
/// The list order is an editing concern only; [`to_xml`](Self::to_xml)
/// serializes the map and ignores it.
#[derive(Debug, Clone, Default)]
pub struct PreferenceFile {
    prefs: HashMap<String, PrefValue>,
    entries: Vec<PrefEntry>,
}

impl PreferenceFile {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an XML payload.
    ///
    /// Blank input and malformed input both yield an empty store: the
    /// editor always needs something to show, so decode failures are
    /// logged and swallowed here. Strict validation lives in the save
    /// protocol, not in this constructor.
    pub fn from_xml(xml: &str) -> Self {
        let prefs = match codec::decode(xml) {
            Ok(map) => map,
            Err(e) => {
                log::warn!("treating undecodable payload as empty: {}", e);
                HashMap::new()
            }
        };

        // Stable derivation of the edit order: the codec hands back a map,
        // so document order is already gone. Sorted keys keep the view
        // independent of hash seeds.
        let mut entries: Vec<PrefEntry> = prefs
            .iter()
            .map(|(k, v)| PrefEntry::new(k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        Self { prefs, entries }
    }

    /// Serialize the store back to the XML payload format.
    pub fn to_xml(&self) -> String {
        codec::encode(&self.prefs)
    }

    /// The entries in display/edit order.
    pub fn entries(&self) -> &[PrefEntry] {
        &self.entries
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&PrefValue> {
        self.prefs.get(key)
    }

    /// Whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.prefs.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.prefs.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.prefs.is_empty()
    }

    /// Add, update, or rename an entry.
    ///
    /// With `edit_mode == false` the caller intends a create: an existing
    /// `new_key` is updated in place, a fresh key is inserted at the front.
    ///
    /// With `edit_mode == true` the caller is editing the entry previously
    /// known as `previous_key`. Keeping the key updates in place; changing
    /// it removes the old entry and then follows the create rules. Renaming
    /// onto a key that already exists overwrites that key's value at its
    /// current position and the renamed-away entry disappears - merge on
    /// rename is intentional.
    ///
    /// An empty `new_key` is a no-op.
    pub fn add(
        &mut self,
        previous_key: Option<&str>,
        new_key: &str,
        value: PrefValue,
        edit_mode: bool,
    ) {
        if new_key.is_empty() {
            return;
        }

        if !edit_mode {
            if self.prefs.contains_key(new_key) {
                self.update_value(new_key, value);
            } else {
                self.create_and_add_value(new_key, value);
            }
        } else {
            if previous_key == Some(new_key) {
                self.update_value(new_key, value);
                return;
            }
            if let Some(previous) = previous_key {
                self.remove_value(previous);
            }
            if self.prefs.contains_key(new_key) {
                self.update_value(new_key, value);
            } else {
                self.create_and_add_value(new_key, value);
            }
        }
    }

    /// Remove an entry from both views. Absent keys are a no-op.
    pub fn remove_value(&mut self, key: &str) {
        self.prefs.remove(key);
        if let Some(pos) = self.entries.iter().position(|e| e.key == key) {
            self.entries.remove(pos);
        }
    }

    /// Replace the value of an existing key, keeping its list position.
    fn update_value(&mut self, key: &str, value: PrefValue) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.value = value.clone();
        }
        self.prefs.insert(key.to_string(), value);
    }

    /// Insert a brand-new entry at the front of the list.
    fn create_and_add_value(&mut self, key: &str, value: PrefValue) {
        self.entries.insert(0, PrefEntry::new(key, value.clone()));
        self.prefs.insert(key.to_string(), value);
    }
}
