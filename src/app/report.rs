use crate::app::sequence::{CollectionReport, ReportedItem, RunSummary};
use crate::utils::error::Result;
use std::fmt::Write;
use std::path::Path;

const RULE: &str = "===================================================================";

fn item_label(item: &ReportedItem) -> String {
    match item.year {
        Some(year) => format!("{} ({})", item.title, year),
        None => item.title.clone(),
    }
}

/// Console block for one collection.
pub fn render_collection(report: &CollectionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Updating '{}' collection", report.collection);
    if report.dry_run {
        let _ = writeln!(out, "(dry run, no changes applied)");
    }
    let _ = writeln!(out, "{}", RULE);

    if report.existed {
        let _ = writeln!(
            out,
            "{} movies are currently in the collection\n",
            report.members_before
        );
    } else {
        let _ = writeln!(
            out,
            "The '{}' collection does not exist on Plex\n",
            report.collection
        );
    }

    for item in &report.added {
        let _ = writeln!(out, "  Added {}", item_label(item));
    }
    if !report.added.is_empty() {
        let _ = writeln!(out, "\nAdded {} movies to the collection\n", report.added.len());
    }

    for item in &report.removed {
        let _ = writeln!(out, "  Removed {}", item_label(item));
    }
    if !report.removed.is_empty() {
        let _ = writeln!(
            out,
            "\nRemoved {} movies from the collection\n",
            report.removed.len()
        );
    }

    if report.missing.is_empty() {
        let _ = writeln!(out, "Congrats! Your collection is complete!");
    } else {
        let _ = writeln!(out, "Missing {} movies:\n", report.missing.len());
        for entry in &report.missing {
            let _ = writeln!(out, "  {}", entry.display_name());
        }
    }

    out
}

/// Full run output: one block per collection followed by the totals.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    for entry in &summary.unidentified {
        match entry.year {
            Some(year) => {
                let _ = writeln!(out, "Missing IMDb id for {} ({})", entry.title, year);
            }
            None => {
                let _ = writeln!(out, "Missing IMDb id for {}", entry.title);
            }
        }
    }
    let _ = writeln!(
        out,
        "\nFound {} movies in the Plex library\n",
        summary.indexed_items
    );

    for report in &summary.collections {
        out.push_str(&render_collection(report));
        out.push('\n');
    }

    for failure in &summary.failures {
        let _ = writeln!(out, "❌ {}", failure.message);
        let _ = writeln!(out, "💡 {}", failure.suggestion);
    }
    for name in &summary.skipped {
        let _ = writeln!(out, "⏭️ Skipped '{}'", name);
    }

    let _ = writeln!(
        out,
        "Synced {} collections: {} added, {} removed, {} missing",
        summary.collections.len(),
        summary.total_added(),
        summary.total_removed(),
        summary.total_missing()
    );
    out
}

pub fn write_summary_json<P: AsRef<Path>>(summary: &RunSummary, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    tracing::debug!("Run summary written to {}", path.display());
    Ok(())
}
