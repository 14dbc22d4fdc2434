use crate::{error::ScanError, filename, pak};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Archive entry holding the structured metadata record. Exact and
/// case-sensitive; nothing else in the archive is ever read.
pub const METADATA_ENTRY: &str = "metadata.json";

/// Game build assumed for archives that do not declare one.
pub const DEFAULT_GAME_BUILD: &str = "1.13.129.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Client,
    Server,
    ServerClient,
}

impl SyncMode {
    pub fn label(self) -> &'static str {
        match self {
            SyncMode::Client => "client",
            SyncMode::Server => "server",
            SyncMode::ServerClient => "serverclient",
        }
    }
}

/// On-disk schema of the `metadata.json` entry. Every field is optional;
/// defaults are applied once, in [`ModMetadata::resolve`].
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawMetadata {
    pub mod_id: Option<String>,
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub astro_build: Option<String>,
    pub priority: Option<String>,
    pub sync: Option<SyncMode>,
    pub homepage: Option<String>,
    pub download: Option<Map<String, Value>>,
    pub linked_actor_components: Option<Vec<String>>,
}

/// Fully-defaulted metadata for one archive file.
#[derive(Debug, Clone, Serialize)]
pub struct ModMetadata {
    pub mod_id: String,
    pub name: String,
    pub author: String,
    pub description: String,
    pub version: String,
    pub astro_build: String,
    pub priority: String,
    pub sync: SyncMode,
    pub homepage: String,
    pub download: Map<String, Value>,
    pub linked_actor_components: Vec<String>,
}

impl ModMetadata {
    /// Apply per-field defaults, falling back to the filename convention
    /// for identity fields. `raw = None` means the archive carried no
    /// metadata entry at all, which also flips the sync default:
    /// metadata-less community paks are client-side by convention, while a
    /// record that merely omits `sync` is treated as serverclient.
    pub fn resolve(raw: Option<RawMetadata>, archive_name: &str) -> Self {
        let parts = filename::parse(archive_name);
        let default_sync = match raw {
            None => SyncMode::Client,
            Some(_) => SyncMode::ServerClient,
        };
        let raw = raw.unwrap_or_default();

        Self {
            mod_id: raw.mod_id.unwrap_or(parts.mod_id),
            name: raw.name.unwrap_or_else(|| archive_name.to_string()),
            author: raw.author.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            version: raw.version.unwrap_or(parts.version),
            astro_build: raw
                .astro_build
                .unwrap_or_else(|| DEFAULT_GAME_BUILD.to_string()),
            priority: raw.priority.unwrap_or(parts.priority),
            sync: raw.sync.unwrap_or(default_sync),
            homepage: raw.homepage.unwrap_or_default(),
            download: raw.download.unwrap_or_default(),
            linked_actor_components: raw.linked_actor_components.unwrap_or_default(),
        }
    }

    /// Mods declaring engine-hook linkage must pass through the external
    /// integrator before the game can load them.
    pub fn is_linked(&self) -> bool {
        !self.linked_actor_components.is_empty()
    }
}

/// Read and parse the structured metadata record, `None` when the archive
/// has no `metadata.json` entry. A present-but-malformed record is an
/// error, not a silent default.
pub fn read_archive_metadata(archive: &Path) -> Result<Option<RawMetadata>, ScanError> {
    let Some(bytes) = pak::read_entry(archive, METADATA_ENTRY)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| ScanError::MetadataCorrupt {
            path: archive.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, io::Write};

    #[test]
    fn metadata_less_archive_defaults_to_client() {
        let meta = ModMetadata::resolve(None, "001-Foo_bar.pak");
        assert_eq!(meta.mod_id, "Foo");
        assert_eq!(meta.name, "001-Foo_bar.pak");
        assert_eq!(meta.version, filename::UNKNOWN_VERSION);
        assert_eq!(meta.priority, "001");
        assert_eq!(meta.sync, SyncMode::Client);
        assert_eq!(meta.astro_build, DEFAULT_GAME_BUILD);
        assert!(!meta.is_linked());
    }

    #[test]
    fn partial_record_defaults_to_serverclient() {
        let raw: RawMetadata =
            serde_json::from_str(r#"{"mod_id":"Foo","version":"2.0"}"#).unwrap();
        let meta = ModMetadata::resolve(Some(raw), "050-Ignored-9.9_P.pak");
        assert_eq!(meta.mod_id, "Foo");
        assert_eq!(meta.version, "2.0");
        assert_eq!(meta.sync, SyncMode::ServerClient);
    }

    #[test]
    fn declared_fields_win_over_filename() {
        let raw: RawMetadata = serde_json::from_str(
            r#"{
                "mod_id": "CoordGun",
                "name": "Coordinate Gun",
                "author": "someone",
                "sync": "server",
                "linked_actor_components": ["/Game/Gun.Gun_C"]
            }"#,
        )
        .unwrap();
        let meta = ModMetadata::resolve(Some(raw), "900-CoordGun-0.3_P.pak");
        assert_eq!(meta.name, "Coordinate Gun");
        assert_eq!(meta.sync, SyncMode::Server);
        assert_eq!(meta.version, "0.3");
        assert!(meta.is_linked());
    }

    #[test]
    fn malformed_record_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("001-Bad_P.pak");
        let file = fs::File::create(&archive).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(METADATA_ENTRY, options).unwrap();
        zip.write_all(b"{not json").unwrap();
        zip.finish().unwrap();

        let err = read_archive_metadata(&archive).unwrap_err();
        assert!(matches!(err, ScanError::MetadataCorrupt { .. }));
    }
}
