//! Containment for a child process and everything it starts.
//!
//! winget hands work off to installer processes. Killing only the direct
//! child would leave those running and holding the output pipes open, so a
//! cancelled run kills the whole tree: the child's process group on Unix, a
//! job object on Windows.

use std::process::{Child, Command};

/// Handle to the processes started by one child.
pub(crate) struct ProcessTree {
    #[cfg(unix)]
    group: Option<libc::pid_t>,
    #[cfg(windows)]
    job: Option<windows::Win32::Foundation::HANDLE>,
}

impl ProcessTree {
    /// Prepare a command before spawning.
    ///
    /// With `own_group` the child leads a new process group on Unix. Passthrough
    /// runs stay in the terminal's foreground group so interactive prompts can
    /// still read the terminal.
    pub(crate) fn prepare(cmd: &mut Command, own_group: bool) {
        #[cfg(unix)]
        if own_group {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        #[cfg(not(unix))]
        let _ = (cmd, own_group);
    }

    /// Track a freshly spawned child.
    #[cfg(unix)]
    pub(crate) fn attach(child: &Child, own_group: bool) -> Self {
        Self {
            group: own_group.then(|| child.id() as libc::pid_t),
        }
    }

    /// Track a freshly spawned child.
    #[cfg(windows)]
    pub(crate) fn attach(child: &Child, _own_group: bool) -> Self {
        Self {
            job: windows_job::assign(child),
        }
    }

    #[cfg(not(any(unix, windows)))]
    pub(crate) fn attach(_child: &Child, _own_group: bool) -> Self {
        Self {}
    }

    /// Kill the child and, where tracked, every process it started.
    #[allow(unsafe_code)]
    pub(crate) fn kill(&mut self, child: &mut Child) {
        #[cfg(unix)]
        if let Some(group) = self.group.take() {
            // SAFETY: kill(2) with a negative pid signals the process group we
            // created for this child; it touches no memory.
            let rc = unsafe { libc::kill(-group, libc::SIGKILL) };
            if rc != 0 {
                log::debug!("killing process group {group} failed: {}", std::io::Error::last_os_error());
            }
        }

        #[cfg(windows)]
        if let Some(job) = self.job.take() {
            windows_job::terminate(job);
        }

        let _ = child.kill();
    }
}

#[cfg(windows)]
impl Drop for ProcessTree {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            windows_job::close(job);
        }
    }
}

#[cfg(windows)]
#[allow(unsafe_code)]
mod windows_job {
    use std::os::windows::io::AsRawHandle;
    use std::process::Child;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::System::JobObjects::{
        AssignProcessToJobObject, CreateJobObjectW, TerminateJobObject,
    };

    /// Exit code given to processes terminated by a cancelled run.
    const CANCELLED_EXIT_CODE: u32 = 1;

    /// Put the child into a new job object. Processes it starts afterwards
    /// join the same job.
    pub(super) fn assign(child: &Child) -> Option<HANDLE> {
        // SAFETY: both handles are valid for the duration of the calls; the
        // process handle stays owned by `child`.
        unsafe {
            let job = match CreateJobObjectW(None, None) {
                Ok(job) => job,
                Err(e) => {
                    log::warn!("could not create job object: {e}");
                    return None;
                }
            };
            let process = HANDLE(child.as_raw_handle());
            if let Err(e) = AssignProcessToJobObject(job, process) {
                log::warn!("could not assign process {} to job object: {e}", child.id());
                let _ = CloseHandle(job);
                return None;
            }
            Some(job)
        }
    }

    pub(super) fn terminate(job: HANDLE) {
        // SAFETY: `job` came from `assign` and is closed exactly once here.
        unsafe {
            if let Err(e) = TerminateJobObject(job, CANCELLED_EXIT_CODE) {
                log::debug!("terminating job object failed: {e}");
            }
            let _ = CloseHandle(job);
        }
    }

    pub(super) fn close(job: HANDLE) {
        // SAFETY: `job` came from `assign` and is closed exactly once here.
        unsafe {
            let _ = CloseHandle(job);
        }
    }
}
