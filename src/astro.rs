use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

pub const GAME_NAME: &str = "Astroneer";

/// The only archive extension the game picks up, matched case-sensitively.
pub const PAK_EXTENSION: &str = "pak";

/// Output of the external mod integrator. Reserved: never treated as a mod
/// archive and never listed by a scan.
pub const INTEGRATOR_OUTPUT: &str = "999-AstroModIntegrator_P.pak";

pub fn detect_install_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base
        .data_local_dir()
        .join("Astro")
        .join("Saved")
        .join("Paks"))
}

/// Download cache under our own data dir, the system of record for every
/// archive the user has ever had installed.
pub fn default_download_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base.data_local_dir().join("astrosmith").join("mods"))
}

pub fn game_paks_dir(game_root: &Path) -> PathBuf {
    game_root.join("Astro").join("Content").join("Paks")
}

pub fn looks_like_game_root(path: &Path) -> bool {
    game_paks_dir(path).is_dir()
}
