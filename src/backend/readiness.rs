use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::app::BackendConfig;
use crate::constants::HEALTH_PROBE_TIMEOUT_MS;

/// How to tell that the backend is ready to serve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Poll a URL until it answers 2xx
    Health(String),
    /// Wait for an output line containing the pattern
    LogLine(String),
    /// Wait a fixed delay and hope
    Settle(Duration),
}

impl Readiness {
    pub fn from_config(config: &BackendConfig) -> Self {
        if let Some(url) = &config.health_url {
            Readiness::Health(url.clone())
        } else if let Some(pattern) = &config.ready_log_pattern {
            Readiness::LogLine(pattern.clone())
        } else {
            Readiness::Settle(Duration::from_secs(config.settle_delay_secs))
        }
    }
}

/// Check whether a health URL answers with success
pub async fn is_healthy(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

/// Client with a short timeout for readiness probes
pub fn probe_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(HEALTH_PROBE_TIMEOUT_MS))
        .build()
        .unwrap_or_default()
}

/// Forward one output stream of the backend into the log, line by line.
///
/// Keeps the pipe from filling and the console clean. When `pattern` is set,
/// `ready` is notified on the first line containing it.
pub fn spawn_drain<R>(
    reader: R,
    stream: &'static str,
    pattern: Option<String>,
    ready: Arc<Notify>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut signalled = false;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(target: "backend", stream, "read failed: {}", e);
                    break;
                }
            }

            // backends print progress bars and other non-UTF-8 bytes
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            debug!(target: "backend", stream, "{}", line);

            if !signalled {
                if let Some(pattern) = pattern.as_deref() {
                    if line.contains(pattern) {
                        signalled = true;
                        ready.notify_one();
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_probe_priority() {
        let mut config = BackendConfig::default();
        assert_eq!(
            Readiness::from_config(&config),
            Readiness::Settle(Duration::from_secs(2))
        );

        config.ready_log_pattern = Some("listening".to_string());
        assert_eq!(
            Readiness::from_config(&config),
            Readiness::LogLine("listening".to_string())
        );

        config.health_url = Some("http://localhost:3000/health".to_string());
        assert_eq!(
            Readiness::from_config(&config),
            Readiness::Health("http://localhost:3000/health".to_string())
        );
    }

    #[tokio::test]
    async fn test_drain_signals_on_pattern() {
        let ready = Arc::new(Notify::new());
        let output: &[u8] = b"compiling\nserver listening on 3000\nmore\n";

        let drain = spawn_drain(output, "stdout", Some("listening".to_string()), ready.clone());
        drain.await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), ready.notified())
            .await
            .expect("pattern line should notify");
    }

    #[tokio::test]
    async fn test_drain_survives_invalid_utf8() {
        let ready = Arc::new(Notify::new());
        let output: &[u8] = b"npm \xff\xfe progress\r\nserver listening on 3000\n";

        let drain = spawn_drain(output, "stderr", Some("listening".to_string()), ready.clone());
        drain.await.unwrap();

        tokio::time::timeout(Duration::from_millis(500), ready.notified())
            .await
            .expect("ready line after a non-UTF-8 line should notify");
    }

    #[tokio::test]
    async fn test_drain_reads_to_end_of_stream() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let ready = Arc::new(Notify::new());
        let drain = spawn_drain(reader, "stdout", Some("ready".to_string()), ready.clone());

        writer.write_all(b"\xc3\x28 garbage\n").await.unwrap();
        writer.write_all(b"still going\nready").await.unwrap();
        drop(writer);

        drain.await.unwrap();
        tokio::time::timeout(Duration::from_millis(500), ready.notified())
            .await
            .expect("unterminated last line is still read");
    }

    #[tokio::test]
    async fn test_unreachable_health_url() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/health", listener.local_addr().unwrap());
        drop(listener);

        assert!(!is_healthy(&probe_client(), &url).await);
    }
}
