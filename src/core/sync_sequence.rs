/// Collection queue runner and its reports.
pub use crate::app::sequence::{
    CollectionFailure, CollectionJob, CollectionReport, FailurePolicy, ReportedItem, RunSummary,
    SyncSequence,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::report::{render_collection, render_summary};
    use crate::core::dry_run::DryRunLibrary;
    use crate::core::testing::{MemoryLibrary, MemoryLists};
    use crate::core::{Item, ReferenceEntry};
    use crate::utils::error::ErrorSeverity;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    const TOP: &str = "https://trakt.tv/users/justin/lists/imdb-top-rated-movies";
    const DISNEY: &str =
        "https://trakt.tv/users/movistapp/lists/walt-disney-animated-feature-films";
    const BEST_PICTURE: &str =
        "https://trakt.tv/users/thefork/lists/academy-awards-best-picture-winners";
    const BROKEN: &str = "https://trakt.tv/users/nobody/lists/gone";

    fn library() -> Arc<MemoryLibrary> {
        Arc::new(
            MemoryLibrary::new()
                .with_item(
                    Item::new("10", "The Shawshank Redemption", Some(1994)),
                    Some("tt0111161"),
                )
                .with_item(Item::new("11", "The Godfather", Some(1972)), Some("tt0068646"))
                .with_item(Item::new("12", "Pinocchio", Some(1940)), Some("tt0032910"))
                .with_item(Item::new("13", "Family Vacation 2019", None), None)
                .with_grouping("IMDb Top 250", &["11", "12"]),
        )
    }

    fn top_list() -> Vec<ReferenceEntry> {
        vec![
            ReferenceEntry::new("tt0111161", "The Shawshank Redemption", Some(1994)),
            ReferenceEntry::new("tt0068646", "The Godfather", Some(1972)),
            ReferenceEntry::new("tt0071562", "The Godfather Part II", Some(1974)),
        ]
    }

    fn lists() -> Arc<MemoryLists> {
        Arc::new(
            MemoryLists::new()
                .with_list(TOP, top_list())
                .with_list(
                    DISNEY,
                    vec![ReferenceEntry::new("tt0032910", "Pinocchio", Some(1940))],
                ),
        )
    }

    fn grouping(handles: &[&str]) -> Option<BTreeSet<String>> {
        Some(handles.iter().map(|h| h.to_string()).collect())
    }

    #[tokio::test]
    async fn test_execute_all_runs_jobs_in_order() {
        let library = library();
        let sequence = SyncSequence::new(library.clone(), lists()).with_jobs([
            CollectionJob::new("IMDb Top 250", TOP),
            CollectionJob::new("Walt Disney Animation Studios", DISNEY),
        ]);

        let summary = sequence.execute_all().await.unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.indexed_items, 3);
        assert_eq!(summary.unidentified.len(), 1);
        assert_eq!(summary.collections.len(), 2);

        let top = &summary.collections[0];
        assert!(top.existed);
        assert_eq!(top.members_before, 2);
        assert_eq!(top.added[0].title, "The Shawshank Redemption");
        assert_eq!(top.removed[0].identifier, "tt0032910");
        assert_eq!(top.missing[0].title, "The Godfather Part II");

        let disney = &summary.collections[1];
        assert!(!disney.existed);
        assert_eq!(disney.added.len(), 1);
        assert!(disney.removed.is_empty());

        assert_eq!(library.grouping("IMDb Top 250").await, grouping(&["10", "11"]));
        assert_eq!(library.grouping("Walt Disney Animation Studios").await, grouping(&["12"]));
    }

    #[tokio::test]
    async fn test_item_on_two_lists_stays_in_both_collections() {
        let library = library();
        let lists = Arc::new(MemoryLists::new().with_list(TOP, top_list()).with_list(
            BEST_PICTURE,
            vec![ReferenceEntry::new("tt0068646", "The Godfather", Some(1972))],
        ));
        let jobs = [
            CollectionJob::new("IMDb Top 250", TOP),
            CollectionJob::new("Best Picture", BEST_PICTURE),
        ];

        let first = SyncSequence::new(library.clone(), lists.clone())
            .with_jobs(jobs.clone())
            .execute_all()
            .await
            .unwrap();
        assert!(first.is_success());
        assert_eq!(library.grouping("IMDb Top 250").await, grouping(&["10", "11"]));
        assert_eq!(library.grouping("Best Picture").await, grouping(&["11"]));

        let mutations = library.mutations().await.len();
        let second = SyncSequence::new(library.clone(), lists)
            .with_jobs(jobs)
            .execute_all()
            .await
            .unwrap();
        assert_eq!(second.total_added() + second.total_removed(), 0);
        assert_eq!(library.mutations().await.len(), mutations);
    }

    #[tokio::test]
    async fn test_shared_index_resolves_each_item_once_per_run() {
        let library = library();
        let sequence = SyncSequence::new(library.clone(), lists()).with_jobs([
            CollectionJob::new("IMDb Top 250", TOP),
            CollectionJob::new("Walt Disney Animation Studios", DISNEY),
        ]);

        sequence.execute_all().await.unwrap();

        assert_eq!(library.resolve_calls().await.len(), 4);
    }

    #[tokio::test]
    async fn test_reindex_per_collection_rebuilds_index() {
        let library = library();
        let sequence = SyncSequence::new(library.clone(), lists())
            .with_reindex_per_collection(true)
            .with_jobs([
                CollectionJob::new("IMDb Top 250", TOP),
                CollectionJob::new("Walt Disney Animation Studios", DISNEY),
            ]);

        let summary = sequence.execute_all().await.unwrap();

        assert_eq!(library.resolve_calls().await.len(), 8);
        assert_eq!(summary.unidentified.len(), 1);
    }

    #[tokio::test]
    async fn test_stop_policy_skips_remaining_jobs() {
        let library = library();
        let sequence = SyncSequence::new(library.clone(), lists()).with_jobs([
            CollectionJob::new("Broken", BROKEN),
            CollectionJob::new("IMDb Top 250", TOP),
        ]);

        let summary = sequence.execute_all().await.unwrap();

        assert!(!summary.is_success());
        assert_eq!(summary.failures[0].collection, "Broken");
        assert!(summary.failures[0].message.contains(BROKEN));
        assert_eq!(summary.worst_severity(), Some(ErrorSeverity::High));
        assert_eq!(summary.skipped, vec!["IMDb Top 250"]);
        assert!(summary.collections.is_empty());
        assert!(library.mutations().await.is_empty());
    }

    #[tokio::test]
    async fn test_continue_policy_proceeds_after_failure() {
        let sequence = SyncSequence::new(library(), lists())
            .with_failure_policy(FailurePolicy::Continue)
            .with_jobs([
                CollectionJob::new("Broken", BROKEN),
                CollectionJob::new("IMDb Top 250", TOP),
            ]);

        let summary = sequence.execute_all().await.unwrap();

        assert_eq!(summary.failures.len(), 1);
        assert!(summary.skipped.is_empty());
        assert_eq!(summary.collections.len(), 1);
        assert_eq!(summary.collections[0].collection, "IMDb Top 250");
    }

    #[tokio::test]
    async fn test_index_failure_aborts_run() {
        let library = Arc::new(
            MemoryLibrary::new()
                .with_item(Item::new("1", "Alpha", None), Some("tt1"))
                .failing_on("resolve_external_id", "1"),
        );
        let sequence = SyncSequence::new(library, lists())
            .with_jobs([CollectionJob::new("IMDb Top 250", TOP)]);

        assert!(sequence.execute_all().await.is_err());
    }

    #[tokio::test]
    async fn test_dry_run_leaves_library_untouched() {
        let library = library();
        let sequence = SyncSequence::new(DryRunLibrary::new(library.clone()), lists())
            .with_dry_run(true)
            .with_jobs([CollectionJob::new("IMDb Top 250", TOP)]);

        let summary = sequence.execute_all().await.unwrap();

        assert!(summary.collections[0].dry_run);
        assert_eq!(summary.total_added(), 1);
        assert_eq!(summary.total_removed(), 1);
        assert!(library.mutations().await.is_empty());
        assert_eq!(library.grouping("IMDb Top 250").await, grouping(&["11", "12"]));
    }

    #[tokio::test]
    async fn test_rendered_output_matches_console_layout() {
        let sequence = SyncSequence::new(library(), lists()).with_jobs([
            CollectionJob::new("IMDb Top 250", TOP),
            CollectionJob::new("Walt Disney Animation Studios", DISNEY),
        ]);
        let summary = sequence.execute_all().await.unwrap();

        let top = render_collection(&summary.collections[0]);
        assert!(top.contains("Updating 'IMDb Top 250' collection"));
        assert!(top.contains("2 movies are currently in the collection"));
        assert!(top.contains("  Added The Shawshank Redemption (1994)"));
        assert!(top.contains("  Removed Pinocchio (1940)"));
        assert!(top.contains("Missing 1 movies:"));
        assert!(top.contains("  The Godfather Part II (1974)"));

        let disney = render_collection(&summary.collections[1]);
        assert!(disney
            .contains("The 'Walt Disney Animation Studios' collection does not exist on Plex"));
        assert!(disney.contains("Congrats! Your collection is complete!"));

        let full = render_summary(&summary);
        assert!(full.contains("Missing IMDb id for Family Vacation 2019"));
        assert!(full.contains("Found 3 movies in the Plex library"));
        assert!(full.contains("2 added, 1 removed, 1 missing"));
    }
}
