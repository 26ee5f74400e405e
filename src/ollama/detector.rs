use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::constants::{HEALTH_PROBE_TIMEOUT_MS, OLLAMA_TAGS_PATH};

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Check if Ollama is installed on the system
pub fn is_installed() -> bool {
    which::which("ollama").is_ok()
}

/// Get the models an Ollama server has pulled
pub async fn list_models(base_url: &str) -> Result<Vec<String>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(HEALTH_PROBE_TIMEOUT_MS * 4))
        .build()?;

    let url = format!("{}{}", base_url.trim_end_matches('/'), OLLAMA_TAGS_PATH);
    let tags: TagsResponse = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Ollama not reachable at {}", base_url))?
        .error_for_status()?
        .json()
        .await
        .context("Unexpected response from Ollama")?;

    Ok(tags.models.into_iter().map(|m| m.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(reply.as_bytes()).await;
        });
        base
    }

    #[tokio::test]
    async fn test_list_models() {
        let base = serve_once(r#"{"models":[{"name":"llama3:latest","size":1},{"name":"mistral:7b"}]}"#).await;
        let models = list_models(&base).await.unwrap();
        assert_eq!(models, vec!["llama3:latest", "mistral:7b"]);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        // bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        assert!(list_models(&base).await.is_err());
    }
}
