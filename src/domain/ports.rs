use crate::domain::model::{Item, ReferenceEntry};
use crate::utils::error::Result;
use async_trait::async_trait;

/// The media library holding the items and their collections.
#[async_trait]
pub trait LibraryPort: Send + Sync {
    async fn enumerate_all_items(&self) -> Result<Vec<Item>>;

    /// `Ok(None)` when the item carries no external identifier.
    async fn resolve_external_id(&self, item: &Item) -> Result<Option<String>>;

    /// `Ok(None)` when no grouping with that name exists yet.
    async fn find_items_in_grouping(&self, name: &str) -> Result<Option<Vec<Item>>>;

    async fn add_to_grouping(&self, item: &Item, name: &str) -> Result<()>;

    async fn remove_from_grouping(&self, item: &Item, name: &str) -> Result<()>;
}

/// Source of the ranked list a grouping should mirror.
#[async_trait]
pub trait ReferenceListPort: Send + Sync {
    async fn fetch_list(&self, list_url: &str) -> Result<Vec<ReferenceEntry>>;
}

#[async_trait]
impl<T: LibraryPort + ?Sized> LibraryPort for std::sync::Arc<T> {
    async fn enumerate_all_items(&self) -> Result<Vec<Item>> {
        (**self).enumerate_all_items().await
    }

    async fn resolve_external_id(&self, item: &Item) -> Result<Option<String>> {
        (**self).resolve_external_id(item).await
    }

    async fn find_items_in_grouping(&self, name: &str) -> Result<Option<Vec<Item>>> {
        (**self).find_items_in_grouping(name).await
    }

    async fn add_to_grouping(&self, item: &Item, name: &str) -> Result<()> {
        (**self).add_to_grouping(item, name).await
    }

    async fn remove_from_grouping(&self, item: &Item, name: &str) -> Result<()> {
        (**self).remove_from_grouping(item, name).await
    }
}

#[async_trait]
impl<T: ReferenceListPort + ?Sized> ReferenceListPort for std::sync::Arc<T> {
    async fn fetch_list(&self, list_url: &str) -> Result<Vec<ReferenceEntry>> {
        (**self).fetch_list(list_url).await
    }
}
