use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Opaque handle the media server uses for an item (Plex `ratingKey`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemHandle(pub String);

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub handle: ItemHandle,
    pub title: String,
    pub year: Option<i32>,
}

impl Item {
    pub fn new(handle: impl Into<String>, title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            handle: ItemHandle(handle.into()),
            title: title.into(),
            year,
        }
    }

    pub fn display_name(&self) -> String {
        display_name(&self.title, self.year)
    }
}

/// A library item whose external identifier could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unidentified {
    pub title: String,
    pub year: Option<i32>,
}

impl From<&Item> for Unidentified {
    fn from(item: &Item) -> Self {
        Self {
            title: item.title.clone(),
            year: item.year,
        }
    }
}

/// One entry of the external ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub identifier: Option<String>,
    pub title: String,
    pub year: Option<i32>,
    pub rank: Option<u32>,
}

impl ReferenceEntry {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            title: title.into(),
            year,
            rank: None,
        }
    }

    pub fn display_name(&self) -> String {
        display_name(&self.title, self.year)
    }
}

fn display_name(title: &str, year: Option<i32>) -> String {
    match year {
        Some(year) => format!("{} ({})", title, year),
        None => title.to_string(),
    }
}

/// External identifier to item lookup, last write wins on duplicates.
///
/// The handle direction is maintained in the same pass so that grouping
/// membership can be derived without scanning values.
#[derive(Debug, Clone, Default)]
pub struct IdentifierIndex {
    by_id: HashMap<String, Item>,
    by_handle: HashMap<ItemHandle, String>,
}

impl IdentifierIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `item` under `identifier`, returning the item it displaced.
    pub fn insert(&mut self, identifier: String, item: Item) -> Option<Item> {
        if let Some(previous_id) = self.by_handle.remove(&item.handle) {
            if previous_id != identifier {
                self.by_id.remove(&previous_id);
            }
        }
        let handle = item.handle.clone();
        let displaced = self.by_id.insert(identifier.clone(), item);
        if let Some(old) = &displaced {
            if old.handle != handle {
                self.by_handle.remove(&old.handle);
            }
        }
        self.by_handle.insert(handle, identifier);
        displaced
    }

    pub fn get(&self, identifier: &str) -> Option<&Item> {
        self.by_id.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.by_id.contains_key(identifier)
    }

    pub fn identifier_of(&self, handle: &ItemHandle) -> Option<&str> {
        self.by_handle.get(handle).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Identifiers of the items currently in a named grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingMembership {
    pub identifiers: HashSet<String>,
    pub exists: bool,
    /// Grouped items the index could not place in identifier space.
    pub skipped: usize,
}

impl GroupingMembership {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }
}

impl<S: Into<String>> FromIterator<S> for GroupingMembership {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            identifiers: iter.into_iter().map(Into::into).collect(),
            exists: true,
            skipped: 0,
        }
    }
}

/// What a reconciliation pass did; side effects are applied by the time it exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub missing: Vec<ReferenceEntry>,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
