use tracing::{info, warn};

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Process signals that end a session: Ctrl-C everywhere, SIGTERM and SIGHUP on unix.
///
/// Handlers are registered in `install`, so a signal that arrives before
/// `recv` is polled is not lost and does not kill the process.
pub struct ShutdownSignal {
    #[cfg(unix)]
    terminate: Option<Signal>,
    #[cfg(unix)]
    hangup: Option<Signal>,
}

impl ShutdownSignal {
    /// Register the handlers. Must be called inside a tokio runtime.
    pub fn install() -> Self {
        Self {
            #[cfg(unix)]
            terminate: register(SignalKind::terminate(), "SIGTERM"),
            #[cfg(unix)]
            hangup: register(SignalKind::hangup(), "SIGHUP"),
        }
    }

    /// Resolves when the first shutdown signal arrives
    pub async fn recv(self) {
        #[cfg(unix)]
        {
            let Self { terminate, hangup } = self;
            tokio::select! {
                _ = ctrl_c() => {}
                _ = wait_for(terminate) => info!("Received SIGTERM"),
                _ = wait_for(hangup) => info!("Received SIGHUP"),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = self;
            ctrl_c().await;
        }
    }
}

/// Never resolves if the handler cannot be installed
async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C"),
        Err(e) => {
            warn!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(unix)]
fn register(kind: SignalKind, name: &str) -> Option<Signal> {
    match signal(kind) {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!("Could not listen for {}: {}", name, e);
            None
        }
    }
}

#[cfg(unix)]
async fn wait_for(stream: Option<Signal>) {
    match stream {
        Some(mut stream) => {
            if stream.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::agents::{Dispatcher, StubCalendar};
    use crate::app::CalendarConfig;
    use crate::backend::{MockSupervisor, SessionHandle};
    use crate::models::MockModel;
    use crate::runtime::{run_session, Agent, SessionEnd};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sigterm_tears_session_down() {
        let signal = ShutdownSignal::install();

        let stops = Arc::new(AtomicUsize::new(0));
        let counter = stops.clone();
        let mut supervisor = MockSupervisor::new();
        supervisor
            .expect_start()
            .times(1)
            .returning(|| Ok(SessionHandle::detached()));
        supervisor
            .expect_stop()
            .times(1)
            .returning(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let mut agent = Agent::new(
            MockModel::new(),
            Dispatcher::new(StubCalendar, CalendarConfig::default()),
        );
        // reader that never yields a line
        let (reader, _writer) = tokio::io::duplex(64);
        let mut output = Vec::new();

        tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            // SAFETY: signalling our own pid; the handler above consumes it
            unsafe {
                libc::kill(libc::getpid(), libc::SIGTERM);
            }
        });

        let end = tokio::time::timeout(
            Duration::from_secs(5),
            run_session(
                &mut supervisor,
                &mut agent,
                tokio::io::BufReader::new(reader),
                &mut output,
                signal.recv(),
                Duration::from_millis(50),
            ),
        )
        .await
        .expect("SIGTERM should end the session")
        .unwrap();

        assert_eq!(end, SessionEnd::Interrupted);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
