use crate::core::{Item, LibraryPort};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Library wrapper that performs every read but only logs mutations.
pub struct DryRunLibrary<L> {
    inner: L,
}

impl<L: LibraryPort> DryRunLibrary<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

#[async_trait]
impl<L: LibraryPort> LibraryPort for DryRunLibrary<L> {
    async fn enumerate_all_items(&self) -> Result<Vec<Item>> {
        self.inner.enumerate_all_items().await
    }

    async fn resolve_external_id(&self, item: &Item) -> Result<Option<String>> {
        self.inner.resolve_external_id(item).await
    }

    async fn find_items_in_grouping(&self, name: &str) -> Result<Option<Vec<Item>>> {
        self.inner.find_items_in_grouping(name).await
    }

    async fn add_to_grouping(&self, item: &Item, name: &str) -> Result<()> {
        tracing::debug!("[dry run] would add {} to '{}'", item.display_name(), name);
        Ok(())
    }

    async fn remove_from_grouping(&self, item: &Item, name: &str) -> Result<()> {
        tracing::debug!("[dry run] would remove {} from '{}'", item.display_name(), name);
        Ok(())
    }
}
