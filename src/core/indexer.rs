use crate::core::{GroupingMembership, IdentifierIndex, Item, LibraryPort, Unidentified};
use crate::utils::error::Result;

/// Builds the identifier lookup for every item in the library.
///
/// Each item costs one identifier resolution call. Items without an
/// identifier are left out and returned for the caller to report; a later item with an
/// identifier already seen replaces the earlier one. Only a failing call to
/// the library aborts the build.
pub async fn build_index<L: LibraryPort + ?Sized>(
    library: &L,
) -> Result<(IdentifierIndex, Vec<Unidentified>)> {
    let items = library.enumerate_all_items().await?;
    tracing::debug!("Resolving identifiers for {} library items", items.len());

    let mut index = IdentifierIndex::new();
    let mut unidentified = Vec::new();

    for item in items {
        match library.resolve_external_id(&item).await? {
            Some(identifier) => {
                if let Some(previous) = index.insert(identifier.clone(), item) {
                    tracing::debug!(
                        "Identifier {} already mapped to {}, keeping the later item",
                        identifier,
                        previous.display_name()
                    );
                }
            }
            None => {
                tracing::debug!("No IMDb id for {}", item.display_name());
                unidentified.push(Unidentified::from(&item));
            }
        }
    }

    tracing::info!("Found {} identified items in the library", index.len());
    Ok((index, unidentified))
}

/// Maps the items of a grouping into identifier space.
///
/// `None` means the grouping does not exist; that yields an empty, absent
/// membership rather than an error. Grouped items the index does not know
/// are skipped.
pub fn membership(index: &IdentifierIndex, grouped_items: Option<&[Item]>) -> GroupingMembership {
    let Some(items) = grouped_items else {
        return GroupingMembership::absent();
    };

    let mut membership = GroupingMembership {
        exists: true,
        ..GroupingMembership::default()
    };
    for item in items {
        match index.identifier_of(&item.handle) {
            Some(identifier) => {
                membership.identifiers.insert(identifier.to_string());
            }
            None => membership.skipped += 1,
        }
    }
    membership
}

/// Queries the library for a grouping and derives its membership.
pub async fn current_membership<L: LibraryPort + ?Sized>(
    library: &L,
    index: &IdentifierIndex,
    grouping: &str,
) -> Result<GroupingMembership> {
    let grouped = library.find_items_in_grouping(grouping).await?;
    let membership = membership(index, grouped.as_deref());

    match &grouped {
        Some(items) => tracing::info!("{} items are currently in the collection", items.len()),
        None => tracing::info!("The '{}' collection does not exist yet", grouping),
    }
    if membership.skipped > 0 {
        tracing::debug!(
            "{} grouped items have no identifier and are left untouched",
            membership.skipped
        );
    }
    Ok(membership)
}
