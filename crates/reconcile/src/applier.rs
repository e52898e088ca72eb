//! Apply engine - runs a plan against a backend, one operation at a time

use crate::context::{Action, ProgressCallback};
use crate::error::Interrupted;
use crate::types::{SyncPlan, SyncResult};
use wingetkit::{Backend, Outcome, PackageDefinition};

/// Apply a plan: every uninstall, then every install, in plan order.
///
/// A failed operation is recorded in the result and the run continues. A
/// fatal error stops the run and comes back as [`Interrupted`] carrying what
/// completed so far; the interrupted operation is listed as failed, so the
/// partial result never reads as a success.
pub fn apply(
    plan: &SyncPlan,
    backend: &dyn Backend,
    progress: &mut dyn ProgressCallback,
) -> Result<SyncResult, Interrupted> {
    let mut result = SyncResult::default();
    progress.on_start(plan.total_count());
    log::debug!(
        "applying {} uninstall(s), {} install(s) with {} backend",
        plan.to_uninstall.len(),
        plan.to_install.len(),
        backend.name()
    );

    let steps = plan
        .to_uninstall
        .iter()
        .map(|def| (Action::Uninstall, def))
        .chain(plan.to_install.iter().map(|def| (Action::Install, def)));

    for (action, definition) in steps {
        if let Err(source) = step(action, definition, backend, progress, &mut result) {
            result.finalize();
            progress.on_finish();
            return Err(Interrupted {
                partial: result,
                source,
            });
        }
    }

    result.finalize();
    progress.on_finish();
    Ok(result)
}

/// Run one operation and fold its outcome into `result`.
///
/// Only a fatal error is returned.
fn step(
    action: Action,
    definition: &PackageDefinition,
    backend: &dyn Backend,
    progress: &mut dyn ProgressCallback,
    result: &mut SyncResult,
) -> Result<(), wingetkit::Error> {
    let id = &definition.id;
    progress.on_operation_start(action, id);

    let outcome = match action {
        Action::Install => backend.install(definition),
        Action::Uninstall => backend.uninstall(id),
    };

    match outcome {
        Ok(Outcome { reboot_required }) => {
            log::info!("{action} {id}: ok");
            match action {
                Action::Install => result.installed.push(id.clone()),
                Action::Uninstall => result.uninstalled.push(id.clone()),
            }
            result.reboot_required |= reboot_required;
            progress.on_operation_complete(action, id, Ok(Outcome { reboot_required }));
            Ok(())
        }
        Err(e) if e.is_fatal() => {
            let message = format!("{action} {id} interrupted: {e}");
            log::warn!("{message}");
            result.failed.push(id.clone());
            result.errors.push(message);
            let reason = e.to_string();
            progress.on_operation_complete(action, id, Err(reason.as_str()));
            Err(e)
        }
        Err(e) => {
            let message = format!("{action} {id} failed: {e}");
            log::info!("{message}");
            result.failed.push(id.clone());
            result.errors.push(message);
            let reason = e.to_string();
            progress.on_operation_complete(action, id, Err(reason.as_str()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoProgress;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use wingetkit::{CancelToken, Error, InstalledPackage, PackageId, Result};

    /// Backend that records calls and fails, reboots or cancels on chosen ids.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<String>>,
        fail: HashSet<&'static str>,
        reboot: HashSet<&'static str>,
        cancel_on: Option<&'static str>,
        cancel: CancelToken,
    }

    impl FakeBackend {
        fn record(&self, action: &str, id: &PackageId) -> Result<Outcome> {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            self.calls.lock().unwrap().push(format!("{action} {id}"));
            if self.cancel_on == Some(id.as_str()) {
                self.cancel.cancel();
                return Err(Error::Cancelled);
            }
            if self.fail.contains(id.as_str()) {
                return Err(Error::OperationFailed {
                    operation: "install",
                    id: id.to_string(),
                    exit_code: 1603,
                    message: "installer failed".into(),
                });
            }
            if self.reboot.contains(id.as_str()) {
                return Ok(Outcome::reboot());
            }
            Ok(Outcome::done())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Backend for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
            Ok(Vec::new())
        }

        fn exists_in_catalog(&self, _id: &PackageId) -> Result<bool> {
            Ok(true)
        }

        fn install(&self, package: &PackageDefinition) -> Result<Outcome> {
            self.record("install", &package.id)
        }

        fn uninstall(&self, id: &PackageId) -> Result<Outcome> {
            self.record("uninstall", id)
        }

        fn upgrade(&self, id: &PackageId) -> Result<Outcome> {
            self.record("upgrade", id)
        }

        fn run_passthrough(&self, _args: &[String]) -> Result<i32> {
            Ok(0)
        }
    }

    /// Progress callback that keeps an event log.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ProgressCallback for Recorder {
        fn on_start(&mut self, total: usize) {
            self.events.push(format!("start {total}"));
        }

        fn on_operation_start(&mut self, action: Action, id: &PackageId) {
            self.events.push(format!("begin {action} {id}"));
        }

        fn on_operation_complete(
            &mut self,
            action: Action,
            id: &PackageId,
            result: std::result::Result<Outcome, &str>,
        ) {
            let status = if result.is_ok() { "ok" } else { "err" };
            self.events.push(format!("end {action} {id} {status}"));
        }

        fn on_finish(&mut self) {
            self.events.push("finish".into());
        }
    }

    fn plan_of(install: &[&str], uninstall: &[&str]) -> SyncPlan {
        SyncPlan {
            to_install: install.iter().map(|id| PackageDefinition::new(*id)).collect(),
            to_uninstall: uninstall
                .iter()
                .map(|id| PackageDefinition::removal(*id))
                .collect(),
            ..SyncPlan::default()
        }
    }

    fn id_list(ids: &[PackageId]) -> Vec<&str> {
        ids.iter().map(PackageId::as_str).collect()
    }

    #[test]
    fn test_uninstalls_run_before_installs() {
        let backend = FakeBackend::default();
        let result = apply(&plan_of(&["A", "B"], &["X"]), &backend, &mut NoProgress).unwrap();

        assert_eq!(backend.calls(), vec!["uninstall X", "install A", "install B"]);
        assert_eq!(id_list(&result.installed), vec!["A", "B"]);
        assert_eq!(id_list(&result.uninstalled), vec!["X"]);
        assert!(result.is_success());
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn test_partial_failure_continues() {
        let backend = FakeBackend {
            fail: HashSet::from(["Second"]),
            ..FakeBackend::default()
        };
        let plan = plan_of(&["First", "Second", "Third"], &[]);
        let result = apply(&plan, &backend, &mut NoProgress).unwrap();

        assert_eq!(backend.calls().len(), 3);
        assert_eq!(id_list(&result.installed), vec!["First", "Third"]);
        assert_eq!(id_list(&result.failed), vec!["Second"]);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("install Second failed: "));
        assert!(result.errors[0].contains("installer failed"));
        assert_eq!(result.exit_code, 1);
        assert!(!result.is_success());
    }

    #[test]
    fn test_reboot_is_sticky_and_does_not_stop() {
        let backend = FakeBackend {
            reboot: HashSet::from(["Driver"]),
            ..FakeBackend::default()
        };
        let plan = plan_of(&["Driver", "After"], &[]);
        let result = apply(&plan, &backend, &mut NoProgress).unwrap();

        assert!(result.reboot_required);
        assert_eq!(id_list(&result.installed), vec!["Driver", "After"]);
        assert!(result.is_success());
    }

    #[test]
    fn test_cancellation_returns_partial_result() {
        let backend = FakeBackend {
            fail: HashSet::from(["Broken"]),
            cancel_on: Some("Stop"),
            ..FakeBackend::default()
        };
        let plan = plan_of(&["Done", "Broken", "Stop", "Never"], &[]);
        let err = apply(&plan, &backend, &mut NoProgress).unwrap_err();

        assert!(matches!(err.source, Error::Cancelled));
        assert_eq!(id_list(&err.partial.installed), vec!["Done"]);
        assert_eq!(id_list(&err.partial.failed), vec!["Broken", "Stop"]);
        assert_eq!(err.partial.exit_code, 1);
        assert!(!backend.calls().iter().any(|c| c.contains("Never")));
    }

    #[test]
    fn test_cancellation_before_any_failure_is_not_success() {
        let backend = FakeBackend {
            cancel_on: Some("First"),
            ..FakeBackend::default()
        };
        let plan = plan_of(&["First", "Second"], &[]);
        let err = apply(&plan, &backend, &mut NoProgress).unwrap_err();

        let partial = err.partial;
        assert!(!partial.is_success());
        assert_eq!(partial.exit_code, 1);
        assert!(partial.installed.is_empty());
        assert_eq!(id_list(&partial.failed), vec!["First"]);
        assert_eq!(partial.errors.len(), 1);
        assert!(partial.errors[0].starts_with("install First interrupted"));
    }

    #[test]
    fn test_empty_plan_makes_no_calls() {
        let backend = FakeBackend::default();
        let result = apply(&SyncPlan::default(), &backend, &mut NoProgress).unwrap();
        assert!(backend.calls().is_empty());
        assert!(result.is_success());
        assert_eq!(result.total_changes(), 0);
    }

    #[test]
    fn test_progress_events() {
        let backend = FakeBackend {
            fail: HashSet::from(["B"]),
            ..FakeBackend::default()
        };
        let mut recorder = Recorder::default();
        apply(&plan_of(&["B"], &["A"]), &backend, &mut recorder).unwrap();

        assert_eq!(
            recorder.events,
            vec![
                "start 2",
                "begin uninstall A",
                "end uninstall A ok",
                "begin install B",
                "end install B err",
                "finish",
            ]
        );
    }
}
