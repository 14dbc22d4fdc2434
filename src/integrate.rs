use crate::astro;
use std::{
    env, io,
    path::{Path, PathBuf},
    process::Command,
};
use thiserror::Error;

/// Overrides the integrator binary; otherwise it is resolved from PATH.
pub const INTEGRATOR_ENV: &str = "ASTROSMITH_INTEGRATOR";
pub const INTEGRATOR_PROGRAM: &str = "AstroModIntegrator";

#[derive(Debug, Error)]
pub enum IntegrateError {
    #[error("integrator exited with {0}")]
    Failed(std::process::ExitStatus),

    #[error("integrator produced no {0}")]
    MissingOutput(String),

    #[error("run integrator")]
    Io(#[from] io::Error),
}

/// Merges the staged linked-mod archives against the game's own content
/// paks into a single patch archive. Runs out of process; on failure it
/// must leave the install directory untouched.
pub trait Integrator {
    fn integrate(
        &self,
        staging_dir: &Path,
        game_paks_dir: &Path,
    ) -> Result<PathBuf, IntegrateError>;
}

/// Spawns the external integrator binary with the staging directory and
/// the game's Paks directory as arguments.
#[derive(Debug, Clone)]
pub struct CommandIntegrator {
    program: PathBuf,
}

impl CommandIntegrator {
    pub fn from_env() -> Self {
        let program = env::var_os(INTEGRATOR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(INTEGRATOR_PROGRAM));
        Self { program }
    }
}

impl Integrator for CommandIntegrator {
    fn integrate(
        &self,
        staging_dir: &Path,
        game_paks_dir: &Path,
    ) -> Result<PathBuf, IntegrateError> {
        let status = Command::new(&self.program)
            .arg(staging_dir)
            .arg(game_paks_dir)
            .status()?;
        if !status.success() {
            return Err(IntegrateError::Failed(status));
        }

        let output = staging_dir.join(astro::INTEGRATOR_OUTPUT);
        if !output.is_file() {
            return Err(IntegrateError::MissingOutput(
                astro::INTEGRATOR_OUTPUT.to_string(),
            ));
        }
        Ok(output)
    }
}
