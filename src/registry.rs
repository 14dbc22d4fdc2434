use crate::{
    config::ModConfig,
    metadata::{self, ModMetadata},
    pak,
};
use anyhow::{Context, Result};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};
use tracing::warn;

/// One logical mod, aggregated from every archive file sharing its id.
#[derive(Debug, Clone)]
pub struct ModRecord {
    /// Metadata of the most recently scanned archive for this id, which is
    /// not necessarily the version that ends up active.
    pub metadata: ModMetadata,
    /// version string -> archive filename
    pub versions: BTreeMap<String, String>,
    /// For active mods, the version found in the install directory. For
    /// inactive mods this is a display default only.
    pub installed_version: String,
    pub active: bool,
    pub auto_update: bool,
}

impl ModRecord {
    fn new(metadata: ModMetadata) -> Self {
        Self {
            metadata,
            versions: BTreeMap::new(),
            installed_version: String::new(),
            active: false,
            auto_update: true,
        }
    }

    pub fn mod_id(&self) -> &str {
        &self.metadata.mod_id
    }

    /// Lexicographically greatest version string. Version strings are not
    /// assumed semantically ordered; this is the documented tie-break for
    /// default activation and display.
    pub fn default_version(&self) -> Option<&str> {
        self.versions.keys().next_back().map(String::as_str)
    }

    pub fn installed_filename(&self) -> Option<&str> {
        self.versions.get(&self.installed_version).map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub mods: BTreeMap<String, ModRecord>,
    pub warnings: Vec<String>,
}

impl ScanOutcome {
    fn skip(&mut self, filename: &str, reason: impl std::fmt::Display) {
        warn!("skipping {filename}: {reason}");
        self.warnings.push(format!("skipped {filename}: {reason}"));
    }
}

/// Build the registry from both directories. Discovery order is the sorted
/// union of filenames; the download cache is the system of record, so any
/// archive found only in the install directory is copied into the cache
/// before it is read.
pub fn scan(download_dir: &Path, install_dir: &Path, prior: &ModConfig) -> Result<ScanOutcome> {
    let download_paks = pak::list_pak_files(download_dir)?;
    let install_paks = pak::list_pak_files(install_dir)?;

    let installed: BTreeSet<&str> = install_paks.iter().map(String::as_str).collect();
    let mut filenames: BTreeSet<String> = download_paks.into_iter().collect();
    filenames.extend(install_paks.iter().cloned());

    let mut outcome = ScanOutcome::default();

    for filename in &filenames {
        let cache_path = download_dir.join(filename);
        if !cache_path.is_file() {
            fs::copy(install_dir.join(filename), &cache_path)
                .with_context(|| format!("copy {filename} into download cache"))?;
        }

        let raw = match metadata::read_archive_metadata(&cache_path) {
            Ok(raw) => raw,
            Err(err) => {
                outcome.skip(filename, err);
                continue;
            }
        };

        let meta = ModMetadata::resolve(raw, filename);
        if meta.mod_id.is_empty() {
            outcome.skip(filename, "no mod id in metadata or filename");
            continue;
        }

        let record = outcome
            .mods
            .entry(meta.mod_id.clone())
            .or_insert_with(|| ModRecord::new(meta.clone()));
        record.versions.insert(meta.version.clone(), filename.clone());
        if installed.contains(filename.as_str()) {
            record.installed_version = meta.version.clone();
            record.active = true;
        }
        // Last-scanned archive wins every scalar field.
        record.metadata = meta;
    }

    for record in outcome.mods.values_mut() {
        let update = prior.update_flag(record.mod_id());
        record.auto_update = update;
        if !record.active {
            let display = record.default_version().map(str::to_string);
            if let Some(version) = display {
                record.installed_version = version;
            }
        }
    }

    Ok(outcome)
}
