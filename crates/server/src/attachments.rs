//! Best-effort cleanup of attachment files after their rows are deleted.

/// Removes the given files, logging and moving on when one fails. Called
/// after the database commit: a failure here leaves an orphan file, never an
/// inconsistent ledger.
pub(crate) fn cleanup(paths: &[String]) {
    for path in paths {
        if let Err(err) = std::fs::remove_file(path) {
            tracing::warn!("failed to remove attachment {path}: {err}");
        }
    }
}
