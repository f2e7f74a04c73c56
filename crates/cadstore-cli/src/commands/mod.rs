//! CLI commands implementation

use anyhow::{anyhow, Context, Result};
use reqwest::{multipart, Response, Url};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// API client for communicating with the daemon
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of a single model, with the name percent-encoded as one path segment
    pub fn model_url(&self, name: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url("/models"))
            .with_context(|| format!("Invalid API address: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("API address cannot be a base: {}", self.base_url))?
            .push(name);
        Ok(url)
    }
}

/// Upload response from API
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

/// Models listing from API
#[derive(Debug, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

/// Error body from API
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Extract the server's error message from a failed response body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => err.error,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

async fn fail(action: &str, response: Response) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    anyhow!("Failed to {}: {} ({})", action, error_message(&body), status)
}

/// Upload a model file
pub async fn upload(client: &ApiClient, path: PathBuf) -> Result<()> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Not a file: {}", path.display()))?;
    let content = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    debug!(filename = %filename, size = content.len(), "Uploading model");

    let part = multipart::Part::bytes(content).file_name(filename);
    let form = multipart::Form::new().part("file", part);

    let response = client
        .client
        .post(client.url("/upload"))
        .multipart(form)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(fail("upload model", response).await);
    }

    let uploaded: UploadResponse = response.json().await?;
    println!("{}: {}", uploaded.message, uploaded.filename);

    Ok(())
}

/// List stored models
pub async fn list(client: &ApiClient) -> Result<()> {
    let response = client.client.get(client.url("/models")).send().await?;

    if !response.status().is_success() {
        return Err(fail("list models", response).await);
    }

    let listing: ModelsResponse = response.json().await?;
    if listing.models.is_empty() {
        println!("No models found");
    } else {
        for name in listing.models {
            println!("{}", name);
        }
    }

    Ok(())
}

/// Default download path: the last component of the model name, in the current directory
fn default_output(name: &str) -> Result<PathBuf> {
    Path::new(name)
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("Cannot derive an output path from '{}', use --output", name))
}

/// Download a stored model
pub async fn get(client: &ApiClient, name: String, output: Option<PathBuf>) -> Result<()> {
    let output = match output {
        Some(path) => path,
        None => default_output(&name)?,
    };

    let response = client.client.get(client.model_url(&name)?).send().await?;

    if !response.status().is_success() {
        return Err(fail(&format!("get model '{}'", name), response).await);
    }

    let bytes = response.bytes().await?;
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Saved {} ({} bytes) to {}", name, bytes.len(), output.display());

    Ok(())
}
