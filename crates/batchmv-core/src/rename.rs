//! Bulk rename engine.
//!
//! Renames every node of an authenticated drive session to
//! `<base>_<idx>` (1-based, original extension preserved). Only the initial
//! listing is fail-fast; each per-item rename failure is recorded and the
//! batch moves on. Already-renamed items are not rolled back.

use std::fmt;

use crate::storage::{RemoteItem, StorageSession};

/// One recorded failure from a rename run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameFailure {
    /// Node id of the failed item; `None` when the listing itself failed.
    pub item_id: Option<String>,
    pub reason: String,
}

/// Aggregate outcome of one rename run.
///
/// Returned to the caller and discarded; nothing about a run is persisted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenameReport {
    pub renamed: usize,
    pub failed: usize,
    pub errors: Vec<RenameFailure>,
}

impl RenameReport {
    fn list_failure(&self) -> Option<&RenameFailure> {
        self.errors.iter().find(|failure| failure.item_id.is_none())
    }
}

impl fmt::Display for RenameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(failure) = self.list_failure() {
            return write!(f, "Could not list drive contents: {}.", failure.reason);
        }

        write!(
            f,
            "Rename complete. Renamed: {}. Failed: {}.",
            self.renamed, self.failed
        )?;
        for failure in self.errors.iter().take(5) {
            let id = failure.item_id.as_deref().unwrap_or("?");
            write!(f, "\n- {}: {}", id, failure.reason)?;
        }
        if self.errors.len() > 5 {
            write!(f, "\n- … and {} more", self.errors.len() - 5)?;
        }
        Ok(())
    }
}

/// Renames every item the session can list to `<base_name>_<idx>`.
///
/// Items are processed in listing order. The counter advances for every item
/// considered, so target names stay distinct even when some renames fail.
/// A rename rejected under the node id is retried once addressed by the
/// current display name; older backends only know the latter.
pub async fn run_rename<S: StorageSession>(session: &S, base_name: &str) -> RenameReport {
    let items = match session.list().await {
        Ok(items) => items,
        Err(err) => {
            return RenameReport {
                renamed: 0,
                failed: 0,
                errors: vec![RenameFailure {
                    item_id: None,
                    reason: err.to_string(),
                }],
            };
        }
    };

    let mut report = RenameReport::default();
    for (position, item) in items.iter().enumerate() {
        let target = target_name(base_name, position + 1, item.name.as_deref());

        let outcome = match session.rename_by_id(&item.id, &target).await {
            Ok(()) => Ok(()),
            Err(_) => session.rename_by_name(&display_name(item), &target).await,
        };

        match outcome {
            Ok(()) => report.renamed += 1,
            Err(err) => {
                report.failed += 1;
                report.errors.push(RenameFailure {
                    item_id: Some(item.id.clone()),
                    reason: err.to_string(),
                });
            }
        }
    }

    report
}

/// Display name of an item, substituting an extension-less placeholder for
/// nodes the backend stored without one.
fn display_name(item: &RemoteItem) -> String {
    item.name
        .clone()
        .unwrap_or_else(|| format!("item-{}", item.id))
}

/// Computes the target name for one item.
///
/// The extension (text after the last `.` of the recorded name) survives the
/// rename; unnamed items get none, since their placeholder carries none.
fn target_name(base_name: &str, idx: usize, name: Option<&str>) -> String {
    match name.and_then(extension) {
        Some(ext) => format!("{base_name}_{idx}.{ext}"),
        None => format!("{base_name}_{idx}"),
    }
}

/// Extension of a file name, if it has one.
///
/// Mirrors the path-component convention of the storage layer: a leading-dot
/// name like `.env` and a trailing dot both count as extension-less.
fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .map(|(_, ext)| ext)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::storage::mock::MockSession;

    fn item(id: &str, name: Option<&str>) -> RemoteItem {
        RemoteItem {
            id: id.to_string(),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn target_names_keep_the_last_extension_only() {
        assert_eq!(target_name("x", 1, Some("a.txt")), "x_1.txt");
        assert_eq!(target_name("x", 2, Some("archive.tar.gz")), "x_2.gz");
        assert_eq!(target_name("x", 3, Some("b")), "x_3");
        assert_eq!(target_name("x", 4, Some(".env")), "x_4");
        assert_eq!(target_name("x", 5, Some("trailing.")), "x_5");
        assert_eq!(target_name("x", 6, None), "x_6");
    }

    #[tokio::test]
    async fn run_assigns_sequential_names_in_listing_order() {
        let session = MockSession::with_items(vec![
            item("n1", Some("a.txt")),
            item("n2", Some("b")),
            item("n3", None),
        ]);

        let report = run_rename(&session, "x").await;

        assert_eq!(report.renamed, 3);
        assert_eq!(report.failed, 0);
        assert!(report.errors.is_empty());

        let calls = session.calls.lock().unwrap();
        let targets: Vec<&str> = calls.by_id.iter().map(|(_, to)| to.as_str()).collect();
        assert_eq!(targets, vec!["x_1.txt", "x_2", "x_3"]);
    }

    #[tokio::test]
    async fn assigned_names_are_distinct() {
        let items: Vec<RemoteItem> = (0..12)
            .map(|n| item(&format!("n{n}"), Some("photo.jpg")))
            .collect();
        let session = MockSession::with_items(items);

        let report = run_rename(&session, "holiday").await;
        assert_eq!(report.renamed, 12);

        let calls = session.calls.lock().unwrap();
        let targets: HashSet<&str> = calls.by_id.iter().map(|(_, to)| to.as_str()).collect();
        assert_eq!(targets.len(), 12);
        assert!(targets.contains("holiday_1.jpg"));
        assert!(targets.contains("holiday_12.jpg"));
    }

    #[tokio::test]
    async fn listing_failure_aborts_without_rename_calls() {
        let session = MockSession::failing_list();

        let report = run_rename(&session, "x").await;

        assert_eq!(report.renamed, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].item_id.is_none());
        assert_eq!(session.rename_calls(), 0);

        let text = report.to_string();
        assert!(text.contains("Could not list drive contents"));
    }

    #[tokio::test]
    async fn rejected_id_falls_back_to_renaming_by_name() {
        let session =
            MockSession::with_items(vec![item("n1", Some("a.txt")), item("n2", Some("b.txt"))])
                .fail_id("n2");

        let report = run_rename(&session, "x").await;

        assert_eq!(report.renamed, 2);
        assert_eq!(report.failed, 0);

        let calls = session.calls.lock().unwrap();
        assert_eq!(calls.by_name, vec![("b.txt".to_string(), "x_2.txt".to_string())]);
    }

    #[tokio::test]
    async fn fallback_for_unnamed_items_uses_the_placeholder() {
        let session = MockSession::with_items(vec![item("abc", None)]).fail_id("abc");

        run_rename(&session, "x").await;

        let calls = session.calls.lock().unwrap();
        assert_eq!(calls.by_name, vec![("item-abc".to_string(), "x_1".to_string())]);
    }

    #[tokio::test]
    async fn per_item_failure_is_isolated_and_keeps_the_counter_moving() {
        let session = MockSession::with_items(vec![
            item("n1", Some("a.txt")),
            item("n2", Some("b.txt")),
            item("n3", Some("c.txt")),
        ])
        .fail_id("n2")
        .fail_name("b.txt");

        let report = run_rename(&session, "x").await;

        assert_eq!(report.renamed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].item_id.as_deref(), Some("n2"));

        // The failed item still consumed index 2.
        let calls = session.calls.lock().unwrap();
        assert_eq!(calls.by_id[2], ("n3".to_string(), "x_3.txt".to_string()));
    }

    #[tokio::test]
    async fn rerunning_renames_again_instead_of_erroring() {
        let session = MockSession::with_items(vec![item("n1", Some("a.txt")), item("n2", Some("b"))]);
        let first = run_rename(&session, "x").await;
        assert_eq!(first.renamed, 2);

        // Second run over the already-renamed listing: same names are
        // assigned again, no error.
        let renamed_items = {
            let calls = session.calls.lock().unwrap();
            calls
                .by_id
                .iter()
                .enumerate()
                .map(|(n, (_, to))| item(&format!("n{}", n + 1), Some(to.as_str())))
                .collect::<Vec<_>>()
        };
        let session = MockSession::with_items(renamed_items);
        let second = run_rename(&session, "x").await;

        assert_eq!(second.renamed, 2);
        assert_eq!(second.failed, 0);
        let calls = session.calls.lock().unwrap();
        let targets: Vec<&str> = calls.by_id.iter().map(|(_, to)| to.as_str()).collect();
        assert_eq!(targets, vec!["x_1.txt", "x_2"]);
    }

    #[tokio::test]
    async fn empty_listing_is_a_successful_noop() {
        let session = MockSession::with_items(Vec::new());

        let report = run_rename(&session, "x").await;

        assert_eq!(report.renamed, 0);
        assert_eq!(report.failed, 0);
        assert!(report.errors.is_empty());
    }
}
