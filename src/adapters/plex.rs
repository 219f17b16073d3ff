//! Plex Media Server library client.
//!
//! Talks to the server's JSON API (`Accept: application/json`) with the
//! `X-Plex-Token` header. Collection membership is edited through the
//! section-level tag edit endpoint, the same call the Plex web UI makes.
//! Indexed `collection[i].tag.tag` params replace an item's whole tag list,
//! so an add always resends the tags the item already carries.

use crate::adapters::http::{read_json, send_with_retry, RetryPolicy};
use crate::config::toml_config::PlexConfig;
use crate::core::{Item, LibraryPort};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const IMDB_GUID_PREFIX: &str = "imdb://";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Debug, Deserialize)]
struct DirectoryContainer {
    #[serde(rename = "Directory", default)]
    directory: Vec<PlexDirectory>,
}

#[derive(Debug, Deserialize)]
struct PlexDirectory {
    key: String,
    title: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexMetadata>,
}

#[derive(Debug, Deserialize)]
struct PlexMetadata {
    #[serde(rename = "ratingKey")]
    rating_key: String,
    #[serde(default)]
    title: String,
    year: Option<i32>,
    #[serde(rename = "Guid", default)]
    guids: Vec<PlexGuid>,
    #[serde(rename = "Collection", default)]
    collections: Vec<PlexTag>,
}

#[derive(Debug, Deserialize)]
struct PlexTag {
    tag: String,
}

#[derive(Debug, Deserialize)]
struct PlexGuid {
    id: String,
}

impl From<PlexMetadata> for Item {
    fn from(metadata: PlexMetadata) -> Self {
        Item::new(metadata.rating_key, metadata.title, metadata.year)
    }
}

/// The library section every call is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlexSection {
    pub key: String,
    pub title: String,
    /// Plex metadata type used in edit calls (1 movie, 2 show).
    pub media_type: u8,
}

fn media_type_for(kind: &str) -> u8 {
    match kind {
        "show" => 2,
        _ => 1,
    }
}

pub struct PlexLibrary {
    base_url: String,
    token: String,
    timeout: Option<Duration>,
    section: PlexSection,
    client: Client,
    retry: RetryPolicy,
}

impl PlexLibrary {
    /// Connects to the server and locates the configured library section.
    pub async fn connect(config: &PlexConfig, retry: RetryPolicy) -> Result<Self> {
        let mut library = Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            timeout: config.timeout_seconds.map(Duration::from_secs),
            section: PlexSection {
                key: String::new(),
                title: config.library.clone(),
                media_type: 1,
            },
            client: Client::new(),
            retry,
        };
        library.section = library.find_section(&config.library).await?;
        tracing::info!(
            "📚 Using Plex library '{}' (section {})",
            library.section.title,
            library.section.key
        );
        Ok(library)
    }

    pub fn section(&self) -> &PlexSection {
        &self.section
    }

    async fn find_section(&self, name: &str) -> Result<PlexSection> {
        let sections: DirectoryContainer = self
            .get_json("list_sections", &self.base_url, "/library/sections", &[])
            .await?;

        sections
            .directory
            .into_iter()
            .find(|d| d.title == name)
            .map(|d| PlexSection {
                media_type: media_type_for(&d.kind),
                key: d.key,
                title: d.title,
            })
            .ok_or_else(|| SyncError::LibraryNotFound {
                name: name.to_string(),
            })
    }

    fn request(&self, method: Method, path: &str, query: &[(&str, &str)]) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("X-Plex-Token", &self.token)
            .header("Accept", "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        request
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        target: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = send_with_retry(&self.retry, operation, target, || {
            self.request(Method::GET, path, query)
        })
        .await?;
        let envelope: Envelope<T> = read_json(response, operation, target).await?;
        Ok(envelope.media_container)
    }

    async fn item_metadata(&self, operation: &str, item: &Item) -> Result<Option<PlexMetadata>> {
        let path = format!("/library/metadata/{}", item.handle);
        let target = item_target(item);
        let container: MetadataContainer = self.get_json(operation, &target, &path, &[]).await?;
        Ok(container.metadata.into_iter().next())
    }

    async fn edit_collection_tag(
        &self,
        operation: &str,
        item: &Item,
        query: &[(&str, &str)],
    ) -> Result<()> {
        let path = format!("/library/sections/{}/all", self.section.key);
        let media_type = self.section.media_type.to_string();
        let mut params = vec![("type", media_type.as_str()), ("id", item.handle.0.as_str())];
        params.extend_from_slice(query);

        let target = item_target(item);
        send_with_retry(&self.retry, operation, &target, || {
            self.request(Method::PUT, &path, &params)
        })
        .await?;
        Ok(())
    }

    async fn find_collection_key(&self, name: &str) -> Result<Option<String>> {
        let path = format!("/library/sections/{}/collections", self.section.key);
        let target = format!("collection '{}'", name);
        let collections: MetadataContainer = self
            .get_json("find_items_in_grouping", &target, &path, &[])
            .await?;

        Ok(collections
            .metadata
            .into_iter()
            .find(|c| c.title == name)
            .map(|c| c.rating_key))
    }
}

fn item_target(item: &Item) -> String {
    format!("item {} '{}'", item.handle, item.display_name())
}

/// Tag params for an add: the current collection tags followed by `name`,
/// each under its own index.
fn collection_tag_params(current: &[PlexTag], name: &str) -> Vec<(String, String)> {
    let mut tags: Vec<&str> = current.iter().map(|t| t.tag.as_str()).collect();
    if !tags.contains(&name) {
        tags.push(name);
    }
    tags.into_iter()
        .enumerate()
        .map(|(i, tag)| (format!("collection[{}].tag.tag", i), tag.to_string()))
        .collect()
}

/// Extracts the IMDb id from a list of Plex guids such as `imdb://tt0111161`.
fn imdb_id_from_guids(guids: &[PlexGuid]) -> Option<String> {
    guids.iter().find_map(|guid| {
        guid.id
            .split_once(IMDB_GUID_PREFIX)
            .map(|(_, id)| id.to_string())
            .filter(|id| !id.is_empty())
    })
}

#[async_trait]
impl LibraryPort for PlexLibrary {
    async fn enumerate_all_items(&self) -> Result<Vec<Item>> {
        let path = format!("/library/sections/{}/all", self.section.key);
        let target = format!("library '{}'", self.section.title);
        let container: MetadataContainer = self
            .get_json("enumerate_all_items", &target, &path, &[])
            .await?;

        Ok(container.metadata.into_iter().map(Item::from).collect())
    }

    async fn resolve_external_id(&self, item: &Item) -> Result<Option<String>> {
        let metadata = self.item_metadata("resolve_external_id", item).await?;
        Ok(metadata.and_then(|metadata| imdb_id_from_guids(&metadata.guids)))
    }

    async fn find_items_in_grouping(&self, name: &str) -> Result<Option<Vec<Item>>> {
        let Some(key) = self.find_collection_key(name).await? else {
            return Ok(None);
        };

        let path = format!("/library/collections/{}/children", key);
        let target = format!("collection '{}'", name);
        let children: MetadataContainer = self
            .get_json("find_items_in_grouping", &target, &path, &[])
            .await?;

        Ok(Some(children.metadata.into_iter().map(Item::from).collect()))
    }

    async fn add_to_grouping(&self, item: &Item, name: &str) -> Result<()> {
        // read fresh: an earlier add in this run may have changed the tags
        let current = self
            .item_metadata("add_to_grouping", item)
            .await?
            .map(|metadata| metadata.collections)
            .unwrap_or_default();

        let tags = collection_tag_params(&current, name);
        let mut query: Vec<(&str, &str)> = tags
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        query.push(("collection.locked", "1"));

        self.edit_collection_tag("add_to_grouping", item, &query).await
    }

    async fn remove_from_grouping(&self, item: &Item, name: &str) -> Result<()> {
        self.edit_collection_tag("remove_from_grouping", item, &[("collection[].tag.tag-", name)])
            .await
    }
}
