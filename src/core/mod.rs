pub mod dry_run;
pub mod indexer;
pub mod reconciler;
pub mod sync_sequence;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{
    GroupingMembership, IdentifierIndex, Item, ItemHandle, ReconcileOutcome, ReferenceEntry,
    Unidentified,
};
pub use crate::domain::ports::{LibraryPort, ReferenceListPort};
pub use crate::utils::error::Result;
