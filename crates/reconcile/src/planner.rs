//! Reconciliation planner - compares desired and installed state

use crate::types::{DesiredState, InstalledSet, SyncPlan};
use wingetkit::{Backend, PackageDefinition, Result};

/// Build a plan without consulting the catalog.
///
/// Every absent, non-removal entry becomes an install candidate.
pub fn plan(desired: &DesiredState, installed: &InstalledSet) -> SyncPlan {
    // A lookup that always succeeds cannot fail
    build(desired, installed, |_| Ok(true)).unwrap_or_default()
}

/// Build a plan, moving install candidates unknown to the catalog into
/// `not_found`.
///
/// A failed lookup keeps the entry in `to_install` so the install attempt
/// records the real error. Cancellation propagates.
pub fn plan_with_catalog(
    desired: &DesiredState,
    installed: &InstalledSet,
    backend: &dyn Backend,
) -> Result<SyncPlan> {
    build(desired, installed, |definition| {
        match backend.exists_in_catalog(&definition.id) {
            Ok(found) => Ok(found),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                log::warn!("catalog lookup for {} failed: {}", definition.id, e);
                Ok(true)
            }
        }
    })
}

fn build(
    desired: &DesiredState,
    installed: &InstalledSet,
    mut in_catalog: impl FnMut(&PackageDefinition) -> Result<bool>,
) -> Result<SyncPlan> {
    let mut plan = SyncPlan::default();

    for definition in desired.iter() {
        let present = installed.contains(&definition.id);

        if definition.uninstall {
            if present {
                log::debug!("{}: installed, marked for removal", definition.id);
                plan.to_uninstall.push(definition.clone());
            }
            continue;
        }

        if present {
            plan.already_installed.push(definition.clone());
        } else if in_catalog(definition)? {
            log::debug!("{}: missing, will install", definition.id);
            plan.to_install.push(definition.clone());
        } else {
            log::debug!("{}: not in catalog", definition.id);
            plan.not_found.push(definition.clone());
        }
    }

    Ok(plan)
}
