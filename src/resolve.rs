use crate::registry::ModRecord;
use std::collections::BTreeMap;
use tracing::warn;

/// What the synchronizer should make true on disk. Inactive mods are
/// absent entirely; there is no installed-but-disabled state.
#[derive(Debug, Clone, Default)]
pub struct InstallPlan {
    pub entries: Vec<PlanEntry>,
}

#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub mod_id: String,
    pub filename: String,
    /// Declares engine-hook components, so the archive must also pass
    /// through the external integrator.
    pub linked: bool,
}

impl InstallPlan {
    pub fn linked_entries(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|entry| entry.linked)
    }

    pub fn has_linked(&self) -> bool {
        self.entries.iter().any(|entry| entry.linked)
    }
}

/// Resolve the registry's activation state into a plan: one entry per
/// active mod, naming the archive of its installed version.
pub fn build_plan(mods: &BTreeMap<String, ModRecord>) -> InstallPlan {
    let mut plan = InstallPlan::default();
    for (mod_id, record) in mods {
        if !record.active {
            continue;
        }
        let Some(filename) = record.installed_filename() else {
            warn!("active mod {mod_id} has no archive for version {}", record.installed_version);
            continue;
        };
        plan.entries.push(PlanEntry {
            mod_id: mod_id.clone(),
            filename: filename.to_string(),
            linked: record.metadata.is_linked(),
        });
    }
    plan
}
