use std::hash::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use statickit_core::ImageAnalysis;

use crate::contracts::AnalyzeRequest;
use crate::contracts::AnalyzeResponse;
use crate::contracts::GenerateRequest;
use crate::contracts::GenerateResponse;
use crate::contracts::ResizeRequest;
use crate::contracts::ResizeResponse;
use crate::error::ServiceError;

/// The remote collaborator that turns requests into images.
#[async_trait::async_trait]
pub trait ImageService: Send + Sync {
    /// Returns the URL of the generated image.
    async fn generate(&self, request: GenerateRequest) -> Result<String, ServiceError>;

    async fn analyze(&self, request: AnalyzeRequest) -> Result<ImageAnalysis, ServiceError>;

    /// Returns the URL of the resized image.
    async fn resize(&self, request: ResizeRequest) -> Result<String, ServiceError>;
}

pub const SIMULATED_FAILURE_MARKER: &str = "[fail]";

/// Offline stand-in. URLs are derived from the request, so the same input
/// always produces the same image.
#[derive(Debug, Default)]
pub struct SimulatedImageService {
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl SimulatedImageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn begin(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn fingerprint(parts: &[&str]) -> u64 {
    let mut hasher = DefaultHasher::new();
    parts.hash(&mut hasher);
    hasher.finish()
}

fn simulated_failure(text: &str) -> Result<(), ServiceError> {
    if text.contains(SIMULATED_FAILURE_MARKER) {
        return Err(ServiceError::Status {
            status: 500,
            message: "simulated failure".to_string(),
        });
    }
    Ok(())
}

#[async_trait::async_trait]
impl ImageService for SimulatedImageService {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ServiceError> {
        self.begin().await;
        simulated_failure(&request.prompt)?;
        let id = fingerprint(&[request.image.as_str(), request.prompt.as_str(), request.model.as_str()]);
        Ok(format!("https://simulated.statickit/generate/{id:016x}.png"))
    }

    async fn analyze(&self, request: AnalyzeRequest) -> Result<ImageAnalysis, ServiceError> {
        self.begin().await;
        Ok(ImageAnalysis {
            description: format!("Simulated analysis of a {}-character image source", request.image.len()),
            tags: vec!["simulated".to_string()],
        })
    }

    async fn resize(&self, request: ResizeRequest) -> Result<String, ServiceError> {
        self.begin().await;
        simulated_failure(&request.image)?;
        let id = fingerprint(&[request.image.as_str()]);
        Ok(format!(
            "https://simulated.statickit/resize/{}x{}/{id:016x}.png",
            request.width, request.height
        ))
    }
}

/// JSON over HTTP against a StaticKit-compatible API.
#[derive(Debug, Clone)]
pub struct HttpImageService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpImageService {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "image service rejected request");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<R>().await?)
    }
}

fn image_or_error(image: Option<String>, error: Option<String>) -> Result<String, ServiceError> {
    match (image, error) {
        (Some(image), _) if !image.is_empty() => Ok(image),
        (_, Some(error)) => Err(ServiceError::Reported(error)),
        _ => Err(ServiceError::MissingImage),
    }
}

#[async_trait::async_trait]
impl ImageService for HttpImageService {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ServiceError> {
        let response: GenerateResponse = self.post("api/generate", &request).await?;
        image_or_error(response.image, response.error)
    }

    async fn analyze(&self, request: AnalyzeRequest) -> Result<ImageAnalysis, ServiceError> {
        let response: AnalyzeResponse = self.post("api/analyze", &request).await?;
        Ok(ImageAnalysis {
            description: response.description,
            tags: response.tags,
        })
    }

    async fn resize(&self, request: ResizeRequest) -> Result<String, ServiceError> {
        let response: ResizeResponse = self.post("api/resize", &request).await?;
        image_or_error(response.image, response.error)
    }
}
