use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Notify;
use tokio::time::{sleep, timeout, Instant};
use tracing::{info, warn};

use super::handle::SessionHandle;
use super::readiness::{is_healthy, probe_client, spawn_drain, Readiness};
use crate::app::BackendConfig;
use crate::constants::HEALTH_PROBE_INTERVAL_MS;
use crate::utils::StartupError;

/// Starts and stops the calendar backend.
///
/// Calling `start` twice without `stop` leaves two processes; callers own that.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Supervisor: Send {
    /// Launch the backend and wait until it looks ready
    async fn start(&mut self) -> Result<SessionHandle, StartupError>;

    /// Stop the backend, waiting up to `grace` before forcing it. Never fails.
    async fn stop(&mut self, handle: SessionHandle, grace: Duration);
}

/// Runs the backend as a child process
pub struct ProcessSupervisor {
    config: BackendConfig,
}

impl ProcessSupervisor {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    fn command_line(&self) -> String {
        self.config.command.join(" ")
    }

    async fn wait_until_ready(
        &self,
        handle: &mut SessionHandle,
        readiness: &Readiness,
        ready: &Notify,
    ) -> Result<(), StartupError> {
        let limit = Duration::from_secs(self.config.startup_timeout_secs);
        let deadline = Instant::now() + limit;
        let interval = Duration::from_millis(HEALTH_PROBE_INTERVAL_MS);

        match readiness {
            Readiness::Settle(delay) => {
                sleep(*delay).await;
                ensure_alive(handle)
            }
            Readiness::LogLine(pattern) => {
                info!("Waiting for backend output containing {:?}", pattern);
                loop {
                    if timeout(interval, ready.notified()).await.is_ok() {
                        return Ok(());
                    }
                    ensure_alive(handle)?;
                    if Instant::now() >= deadline {
                        return Err(StartupError::NotReady(limit.as_secs()));
                    }
                }
            }
            Readiness::Health(url) => {
                info!("Waiting for backend health check at {}", url);
                let client = probe_client();
                loop {
                    if is_healthy(&client, url).await {
                        return Ok(());
                    }
                    ensure_alive(handle)?;
                    if Instant::now() >= deadline {
                        return Err(StartupError::NotReady(limit.as_secs()));
                    }
                    sleep(interval).await;
                }
            }
        }
    }
}

fn ensure_alive(handle: &mut SessionHandle) -> Result<(), StartupError> {
    match handle.try_exit_status() {
        Ok(Some(status)) => Err(StartupError::ExitedEarly(status)),
        Ok(None) => Ok(()),
        Err(e) => {
            warn!("Could not poll backend status: {}", e);
            Ok(())
        }
    }
}

#[async_trait]
impl Supervisor for ProcessSupervisor {
    async fn start(&mut self) -> Result<SessionHandle, StartupError> {
        if !self.config.enabled {
            info!("Calendar backend disabled; running without it");
            return Ok(SessionHandle::detached());
        }

        let (program, args) = self
            .config
            .command
            .split_first()
            .ok_or(StartupError::EmptyCommand)?;

        if !self.config.working_dir.is_dir() {
            return Err(StartupError::MissingWorkingDir(self.config.working_dir.clone()));
        }

        info!(
            "Starting calendar backend: {} (in {})",
            self.command_line(),
            self.config.working_dir.display()
        );

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| StartupError::Spawn {
                command: self.command_line(),
                source,
            })?;

        let readiness = Readiness::from_config(&self.config);
        let pattern = match &readiness {
            Readiness::LogLine(pattern) => Some(pattern.clone()),
            _ => None,
        };

        let ready = Arc::new(Notify::new());
        let mut drains = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            drains.push(spawn_drain(stdout, "stdout", pattern.clone(), ready.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            drains.push(spawn_drain(stderr, "stderr", pattern, ready.clone()));
        }

        let mut handle = SessionHandle::spawned(child, drains);

        match self.wait_until_ready(&mut handle, &readiness, &ready).await {
            Ok(()) => {
                info!("Calendar backend ready (pid {:?})", handle.pid());
                Ok(handle)
            }
            Err(e) => {
                handle.shutdown(self.config.shutdown_grace()).await;
                Err(e)
            }
        }
    }

    async fn stop(&mut self, handle: SessionHandle, grace: Duration) {
        if !handle.is_detached() {
            info!("Stopping calendar backend (pid {:?})", handle.pid());
        }
        handle.shutdown(grace).await;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::backend::ProcessState;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn config(dir: &TempDir, script: &str) -> BackendConfig {
        BackendConfig {
            command: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            working_dir: dir.path().to_path_buf(),
            settle_delay_secs: 0,
            startup_timeout_secs: 5,
            shutdown_grace_secs: 2,
            ..BackendConfig::default()
        }
    }

    fn is_alive(pid: u32) -> bool {
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }

    #[tokio::test]
    async fn test_log_line_readiness_and_graceful_stop() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, "echo booting; echo 'server ready'; sleep 30");
        cfg.ready_log_pattern = Some("ready".to_string());

        let mut supervisor = ProcessSupervisor::new(cfg);
        let handle = supervisor.start().await.unwrap();
        assert_eq!(handle.state(), ProcessState::Running);
        let pid = handle.pid().unwrap();
        assert!(is_alive(pid));

        supervisor.stop(handle, Duration::from_secs(2)).await;
        assert!(!is_alive(pid));
    }

    #[tokio::test]
    async fn test_stubborn_process_is_force_killed() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, "trap '' TERM; echo ready; sleep 5");
        cfg.ready_log_pattern = Some("ready".to_string());

        let mut supervisor = ProcessSupervisor::new(cfg);
        let handle = supervisor.start().await.unwrap();
        let pid = handle.pid().unwrap();

        let started = std::time::Instant::now();
        let state = handle.shutdown(Duration::from_millis(300)).await;
        assert_eq!(state, ProcessState::Stopped);
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(!is_alive(pid));
    }

    #[tokio::test]
    async fn test_settle_delay_startup() {
        let dir = TempDir::new().unwrap();
        let mut supervisor = ProcessSupervisor::new(config(&dir, "sleep 30"));
        let handle = supervisor.start().await.unwrap();
        assert!(!handle.is_detached());
        supervisor.stop(handle, Duration::from_secs(2)).await;
    }

    #[tokio::test]
    async fn test_health_probe_readiness() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/health", listener.local_addr().unwrap());
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                    .await;
            }
        });

        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, "sleep 30");
        cfg.health_url = Some(url);

        let mut supervisor = ProcessSupervisor::new(cfg);
        let handle = supervisor.start().await.unwrap();
        supervisor.stop(handle, Duration::from_secs(2)).await;
    }

    #[tokio::test]
    async fn test_early_exit_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, "echo starting; exit 3");
        cfg.ready_log_pattern = Some("never printed".to_string());

        let err = ProcessSupervisor::new(cfg).start().await.unwrap_err();
        assert!(matches!(err, StartupError::ExitedEarly(status) if status.code() == Some(3)));
    }

    #[tokio::test]
    async fn test_not_ready_within_timeout() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, "sleep 30");
        cfg.ready_log_pattern = Some("never printed".to_string());
        cfg.startup_timeout_secs = 1;

        let err = ProcessSupervisor::new(cfg).start().await.unwrap_err();
        assert!(matches!(err, StartupError::NotReady(1)));
    }

    #[tokio::test]
    async fn test_launch_failures() {
        let dir = TempDir::new().unwrap();

        let mut cfg = config(&dir, "true");
        cfg.command.clear();
        assert!(matches!(
            ProcessSupervisor::new(cfg).start().await,
            Err(StartupError::EmptyCommand)
        ));

        let mut cfg = config(&dir, "true");
        cfg.working_dir = dir.path().join("missing");
        assert!(matches!(
            ProcessSupervisor::new(cfg).start().await,
            Err(StartupError::MissingWorkingDir(_))
        ));

        let mut cfg = config(&dir, "true");
        cfg.command = vec!["definitely-not-a-real-binary-4242".to_string()];
        assert!(matches!(
            ProcessSupervisor::new(cfg).start().await,
            Err(StartupError::Spawn { .. })
        ));
    }

    #[tokio::test]
    async fn test_disabled_backend_is_detached() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, "sleep 30");
        cfg.enabled = false;

        let mut supervisor = ProcessSupervisor::new(cfg);
        let handle = supervisor.start().await.unwrap();
        assert!(handle.is_detached());
        assert_eq!(handle.pid(), None);
        supervisor.stop(handle, Duration::from_secs(1)).await;
    }
}
