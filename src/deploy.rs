use crate::{astro, integrate::Integrator, pak, resolve::InstallPlan};
use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs, path::Path};
use tracing::{info, warn};

#[derive(Debug, Default, Serialize)]
pub struct ApplyReport {
    /// Filenames now present in the install directory.
    pub installed: Vec<String>,
    /// Name of the merged patch archive, when integration ran.
    pub integrated: Option<String>,
    pub warnings: Vec<String>,
}

impl ApplyReport {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// Make the install directory match the plan. The directory is disposable
/// scratch owned by this tool: every archive not in the plan is removed,
/// then the chosen version of each planned mod is copied back in from the
/// download cache.
pub fn apply(
    plan: &InstallPlan,
    download_dir: &Path,
    install_dir: &Path,
    game_path: Option<&Path>,
    integrator: &dyn Integrator,
) -> Result<ApplyReport> {
    let mut report = ApplyReport::default();

    for stale in pak::list_pak_files(install_dir)? {
        fs::remove_file(install_dir.join(&stale))
            .with_context(|| format!("remove stale archive {stale}"))?;
    }

    let mut install_linked = false;
    if plan.has_linked() {
        match game_path {
            Some(game_root) => {
                install_linked = true;
                match integrate_linked(plan, download_dir, install_dir, game_root, integrator) {
                    Ok(output) => report.integrated = Some(output),
                    Err(err) => report.warn(format!("mod integration failed: {err:#}")),
                }
            }
            None => {
                let skipped = plan.linked_entries().count();
                report.warn(format!(
                    "game path not set; {skipped} linked mod(s) not installed"
                ));
            }
        }
    }

    // A merged patch from an earlier pass survives only while linked mods
    // are still part of the plan.
    let reserved = install_dir.join(astro::INTEGRATOR_OUTPUT);
    if !plan.has_linked() && reserved.exists() {
        fs::remove_file(&reserved).context("remove stale integrator output")?;
    }

    for entry in &plan.entries {
        if entry.linked && !install_linked {
            continue;
        }
        fs::copy(
            download_dir.join(&entry.filename),
            install_dir.join(&entry.filename),
        )
        .with_context(|| format!("install {} from download cache", entry.filename))?;
        report.installed.push(entry.filename.clone());
    }

    if let Some(output) = &report.integrated {
        report.installed.push(output.clone());
    }

    info!(
        "installed {} archive(s) into {}",
        report.installed.len(),
        install_dir.display()
    );
    Ok(report)
}

fn integrate_linked(
    plan: &InstallPlan,
    download_dir: &Path,
    install_dir: &Path,
    game_root: &Path,
    integrator: &dyn Integrator,
) -> Result<String> {
    // Dropping `staging` removes the directory again, failure paths
    // included.
    let staging = tempfile::Builder::new()
        .prefix("integrate-")
        .tempdir_in(download_dir)
        .context("create integration staging dir")?;

    for entry in plan.linked_entries() {
        fs::copy(
            download_dir.join(&entry.filename),
            staging.path().join(&entry.filename),
        )
        .with_context(|| format!("stage {}", entry.filename))?;
    }

    let game_paks = astro::game_paks_dir(game_root);
    let merged = integrator
        .integrate(staging.path(), &game_paks)
        .context("run mod integrator")?;

    fs::copy(&merged, install_dir.join(astro::INTEGRATOR_OUTPUT))
        .context("install merged integrator output")?;
    Ok(astro::INTEGRATOR_OUTPUT.to_string())
}
