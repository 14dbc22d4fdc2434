use crate::{
    astro,
    config::{self, ModConfig, ModFlags},
    deploy::{self, ApplyReport},
    integrate::{CommandIntegrator, Integrator},
    metadata::SyncMode,
    registry::{self, ModRecord},
    resolve,
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub download_dir: PathBuf,
    pub install_dir: PathBuf,
    pub config_path: PathBuf,
}

impl AppPaths {
    pub fn new(download_dir: PathBuf, install_dir: PathBuf) -> Self {
        let config_path = download_dir.join(config::CONFIG_FILE);
        Self {
            download_dir,
            install_dir,
            config_path,
        }
    }

    pub fn detect() -> Result<Self> {
        Ok(Self::new(
            astro::default_download_dir()?,
            astro::detect_install_dir()?,
        ))
    }
}

/// The reconciliation engine: prior config plus the registry of every mod
/// seen in either directory. Scanned once at startup; command handlers
/// mutate the records in place and activation state is never re-derived
/// from the filesystem mid-pass.
pub struct App {
    pub paths: AppPaths,
    pub config: ModConfig,
    pub mods: BTreeMap<String, ModRecord>,
    pub warnings: Vec<String>,
}

impl App {
    pub fn initialize() -> Result<Self> {
        Self::with_paths(AppPaths::detect()?)
    }

    pub fn with_paths(paths: AppPaths) -> Result<Self> {
        fs::create_dir_all(&paths.download_dir).context("create download cache")?;
        fs::create_dir_all(&paths.install_dir).context("create install dir")?;

        let config = ModConfig::load_or_create(&paths.config_path)?;
        let outcome = registry::scan(&paths.download_dir, &paths.install_dir, &config)?;

        Ok(Self {
            paths,
            config,
            mods: outcome.mods,
            warnings: outcome.warnings,
        })
    }

    /// Mark a mod for installation. With no explicit version the
    /// lexicographically greatest version string is chosen.
    pub fn activate(&mut self, mod_id: &str, version: Option<&str>) -> Result<()> {
        let record = record_mut(&mut self.mods, mod_id)?;
        let version = match version {
            Some(version) => {
                if !record.versions.contains_key(version) {
                    bail!("mod {mod_id} has no version {version}");
                }
                version.to_string()
            }
            None => record
                .default_version()
                .map(str::to_string)
                .with_context(|| format!("mod {mod_id} has no versions"))?,
        };
        record.installed_version = version;
        record.active = true;
        self.persist()
    }

    pub fn deactivate(&mut self, mod_id: &str) -> Result<()> {
        let record = record_mut(&mut self.mods, mod_id)?;
        record.active = false;
        let display = record.default_version().map(str::to_string);
        if let Some(version) = display {
            record.installed_version = version;
        }
        self.persist()
    }

    pub fn set_auto_update(&mut self, mod_id: &str, enabled: bool) -> Result<()> {
        record_mut(&mut self.mods, mod_id)?.auto_update = enabled;
        self.persist()
    }

    pub fn set_game_path(&mut self, path: &Path) -> Result<()> {
        if !astro::looks_like_game_root(path) {
            bail!(
                "{} does not look like an {} install (missing Astro/Content/Paks)",
                path.display(),
                astro::GAME_NAME
            );
        }
        self.config.game_path = path.display().to_string();
        self.persist()
    }

    pub fn game_path(&self) -> Option<PathBuf> {
        if self.config.game_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.config.game_path))
        }
    }

    pub fn list_mods(&self) -> Vec<ModSnapshot> {
        self.mods.values().map(ModSnapshot::from_record).collect()
    }

    /// One full reconciliation pass: resolve the plan from the in-memory
    /// registry, apply it to the install directory, persist the desired
    /// state.
    pub fn reconcile(&mut self) -> Result<ApplyReport> {
        self.reconcile_with(&CommandIntegrator::from_env())
    }

    pub fn reconcile_with(&mut self, integrator: &dyn Integrator) -> Result<ApplyReport> {
        let plan = resolve::build_plan(&self.mods);
        let game_path = self.game_path();
        let report = deploy::apply(
            &plan,
            &self.paths.download_dir,
            &self.paths.install_dir,
            game_path.as_deref(),
            integrator,
        )?;
        self.persist()?;
        Ok(report)
    }

    /// Regenerate the persisted desired state in full from the registry;
    /// the config on disk is never patched partially.
    fn persist(&mut self) -> Result<()> {
        self.config.mods = self
            .mods
            .values()
            .map(|record| {
                (
                    record.mod_id().to_string(),
                    ModFlags {
                        update: record.auto_update,
                    },
                )
            })
            .collect();
        self.config.save(&self.paths.config_path)
    }
}

fn record_mut<'a>(
    mods: &'a mut BTreeMap<String, ModRecord>,
    mod_id: &str,
) -> Result<&'a mut ModRecord> {
    match mods.get_mut(mod_id) {
        Some(record) => Ok(record),
        None => bail!("unknown mod id: {mod_id}"),
    }
}

/// Immutable view of one registry record, for display and JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct ModSnapshot {
    pub mod_id: String,
    pub name: String,
    pub version: String,
    pub author: String,
    pub active: bool,
    pub auto_update: bool,
    pub sync: SyncMode,
    pub linked: bool,
}

impl ModSnapshot {
    fn from_record(record: &ModRecord) -> Self {
        Self {
            mod_id: record.mod_id().to_string(),
            name: record.metadata.name.clone(),
            version: record.installed_version.clone(),
            author: record.metadata.author.clone(),
            active: record.active,
            auto_update: record.auto_update,
            sync: record.metadata.sync,
            linked: record.metadata.is_linked(),
        }
    }
}
