use std::{io, path::PathBuf};
use thiserror::Error;

/// Per-archive failures during a registry scan. Recoverable: the offending
/// file is skipped with a warning so one bad archive cannot block the rest
/// of the mod list.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("unreadable archive {}", .path.display())]
    ArchiveUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed metadata.json in {}", .path.display())]
    MetadataCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
