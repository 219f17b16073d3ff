//! In-memory collaborators shared by the unit tests.

use crate::core::{Item, ItemHandle, LibraryPort, ReferenceEntry, ReferenceListPort};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;

pub struct MemoryLibrary {
    items: Vec<Item>,
    identifiers: HashMap<ItemHandle, String>,
    groupings: Mutex<HashMap<String, BTreeSet<String>>>,
    resolve_calls: Mutex<Vec<String>>,
    mutations: Mutex<Vec<String>>,
    failure: Option<(String, String)>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            identifiers: HashMap::new(),
            groupings: Mutex::new(HashMap::new()),
            resolve_calls: Mutex::new(Vec::new()),
            mutations: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    pub fn with_item(mut self, item: Item, identifier: Option<&str>) -> Self {
        if let Some(identifier) = identifier {
            self.identifiers
                .insert(item.handle.clone(), identifier.to_string());
        }
        self.items.push(item);
        self
    }

    pub fn with_grouping(mut self, name: &str, handles: &[&str]) -> Self {
        self.groupings.get_mut().insert(
            name.to_string(),
            handles.iter().map(|h| h.to_string()).collect(),
        );
        self
    }

    /// Makes `operation` fail with a transport-like error for the given handle.
    pub fn failing_on(mut self, operation: &str, handle: &str) -> Self {
        self.failure = Some((operation.to_string(), handle.to_string()));
        self
    }

    pub async fn resolve_calls(&self) -> Vec<String> {
        self.resolve_calls.lock().await.clone()
    }

    pub async fn mutations(&self) -> Vec<String> {
        self.mutations.lock().await.clone()
    }

    /// Handles currently in the grouping, `None` if it does not exist.
    pub async fn grouping(&self, name: &str) -> Option<BTreeSet<String>> {
        self.groupings.lock().await.get(name).cloned()
    }

    fn check(&self, operation: &str, item: &Item) -> Result<()> {
        match &self.failure {
            Some((op, handle)) if op == operation && *handle == item.handle.0 => {
                Err(SyncError::HttpStatus {
                    operation: operation.to_string(),
                    target: item.display_name(),
                    status: 500,
                    body: String::new(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl LibraryPort for MemoryLibrary {
    async fn enumerate_all_items(&self) -> Result<Vec<Item>> {
        Ok(self.items.clone())
    }

    async fn resolve_external_id(&self, item: &Item) -> Result<Option<String>> {
        self.resolve_calls.lock().await.push(item.handle.0.clone());
        self.check("resolve_external_id", item)?;
        Ok(self.identifiers.get(&item.handle).cloned())
    }

    async fn find_items_in_grouping(&self, name: &str) -> Result<Option<Vec<Item>>> {
        let groupings = self.groupings.lock().await;
        Ok(groupings.get(name).map(|handles| {
            self.items
                .iter()
                .filter(|item| handles.contains(&item.handle.0))
                .cloned()
                .collect()
        }))
    }

    async fn add_to_grouping(&self, item: &Item, name: &str) -> Result<()> {
        self.check("add_to_grouping", item)?;
        self.groupings
            .lock()
            .await
            .entry(name.to_string())
            .or_default()
            .insert(item.handle.0.clone());
        self.mutations
            .lock()
            .await
            .push(format!("add {} {}", name, item.handle));
        Ok(())
    }

    async fn remove_from_grouping(&self, item: &Item, name: &str) -> Result<()> {
        self.check("remove_from_grouping", item)?;
        if let Some(handles) = self.groupings.lock().await.get_mut(name) {
            handles.remove(&item.handle.0);
        }
        self.mutations
            .lock()
            .await
            .push(format!("remove {} {}", name, item.handle));
        Ok(())
    }
}

/// Serves fixed lists keyed by URL; unknown URLs fail like a 404.
pub struct MemoryLists {
    lists: HashMap<String, Vec<ReferenceEntry>>,
}

impl MemoryLists {
    pub fn new() -> Self {
        Self {
            lists: HashMap::new(),
        }
    }

    pub fn with_list(mut self, url: &str, entries: Vec<ReferenceEntry>) -> Self {
        self.lists.insert(url.to_string(), entries);
        self
    }
}

#[async_trait]
impl ReferenceListPort for MemoryLists {
    async fn fetch_list(&self, list_url: &str) -> Result<Vec<ReferenceEntry>> {
        self.lists
            .get(list_url)
            .cloned()
            .ok_or_else(|| SyncError::HttpStatus {
                operation: "fetch_list".to_string(),
                target: list_url.to_string(),
                status: 404,
                body: String::new(),
            })
    }
}
