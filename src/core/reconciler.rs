use crate::core::{
    GroupingMembership, IdentifierIndex, LibraryPort, ReconcileOutcome, ReferenceEntry,
};
use crate::utils::error::Result;
use std::collections::HashSet;

/// Brings `grouping` in line with `reference_list`, applying each change as it is found.
///
/// Entries whose identifier is in the index are kept when already grouped and
/// added otherwise; entries the index does not know are reported as missing.
/// Whatever membership is left unclaimed after the pass is removed. A failing
/// mutation aborts the pass, leaving earlier mutations in place.
pub async fn reconcile<L: LibraryPort + ?Sized>(
    library: &L,
    grouping: &str,
    index: &IdentifierIndex,
    membership: &GroupingMembership,
    reference_list: &[ReferenceEntry],
) -> Result<ReconcileOutcome> {
    let mut remaining: HashSet<&str> = membership.identifiers.iter().map(String::as_str).collect();
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut outcome = ReconcileOutcome::default();

    for entry in reference_list {
        let matched = entry
            .identifier
            .as_deref()
            .and_then(|id| index.get(id).map(|item| (id, item)));

        let Some((identifier, item)) = matched else {
            outcome.missing.push(entry.clone());
            continue;
        };

        // a repeated list entry was already handled by its first occurrence
        if !claimed.insert(identifier) {
            continue;
        }

        if !remaining.remove(identifier) {
            library.add_to_grouping(item, grouping).await?;
            tracing::info!("  Added {}", entry.display_name());
            outcome.added.push(identifier.to_string());
        }
    }

    if !outcome.added.is_empty() {
        tracing::info!("Added {} items to the collection", outcome.added.len());
    }

    let mut leftover: Vec<&str> = remaining.into_iter().collect();
    leftover.sort_unstable();

    for identifier in leftover {
        let Some(item) = index.get(identifier) else {
            continue;
        };
        library.remove_from_grouping(item, grouping).await?;
        tracing::info!("  Removed {}", item.display_name());
        outcome.removed.push(identifier.to_string());
    }

    if !outcome.removed.is_empty() {
        tracing::info!("Removed {} items from the collection", outcome.removed.len());
    }

    Ok(outcome)
}
