use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};

/// Lifecycle of the backend process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Terminating,
    Stopped,
}

/// The one backend process of a session.
///
/// `shutdown` consumes the handle, so the process is stopped at most once.
/// A handle dropped without `shutdown` still kills the child (`kill_on_drop`).
#[derive(Debug)]
pub struct SessionHandle {
    child: Option<Child>,
    pid: Option<u32>,
    state: ProcessState,
    drains: Vec<JoinHandle<()>>,
}

impl SessionHandle {
    pub(crate) fn spawned(child: Child, drains: Vec<JoinHandle<()>>) -> Self {
        Self {
            pid: child.id(),
            child: Some(child),
            state: ProcessState::Running,
            drains,
        }
    }

    /// A handle with no process behind it, for sessions run without a backend
    pub fn detached() -> Self {
        Self {
            child: None,
            pid: None,
            state: ProcessState::Running,
            drains: Vec::new(),
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn is_detached(&self) -> bool {
        self.child.is_none()
    }

    /// Exit status if the process has already ended
    pub(crate) fn try_exit_status(&mut self) -> io::Result<Option<ExitStatus>> {
        match self.child.as_mut() {
            Some(child) => child.try_wait(),
            None => Ok(None),
        }
    }

    /// Ask the process to exit, then force it after `grace`. Never fails.
    pub async fn shutdown(mut self, grace: Duration) -> ProcessState {
        if let Some(mut child) = self.child.take() {
            self.state = ProcessState::Terminating;

            if let Err(e) = request_terminate(&mut child) {
                warn!("Failed to signal backend: {}", e);
            }

            match timeout(grace, child.wait()).await {
                Ok(Ok(status)) => info!("Backend exited ({})", status),
                Ok(Err(e)) => warn!("Failed waiting for backend to exit: {}", e),
                Err(_) => {
                    warn!(
                        "Backend did not exit within {}s; killing it",
                        grace.as_secs_f32()
                    );
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill backend: {}", e);
                    }
                }
            }
        }

        for drain in self.drains.drain(..) {
            drain.abort();
        }

        self.state = ProcessState::Stopped;
        self.state
    }
}

#[cfg(unix)]
fn request_terminate(child: &mut Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        // already reaped
        return Ok(());
    };

    // SAFETY: plain kill(2) on a pid we spawned and have not yet reaped
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn request_terminate(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_detached_handle_stops_without_a_process() {
        let handle = SessionHandle::detached();
        assert!(handle.is_detached());
        assert_eq!(handle.state(), ProcessState::Running);
        assert_eq!(
            handle.shutdown(Duration::from_millis(10)).await,
            ProcessState::Stopped
        );
    }
}
