mod schemas;

pub use schemas::{ErrorBody, GenerateResponse, ImagineRequest, ImagineResponse};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zk_core::error::GenerationError;
use zk_core::request::{GenerationRequest, UploadPolicy};
use zk_core::{AssetReference, StagedFile};

use crate::config::BackendConfig;
use crate::error::AppError;

pub const GENERATE_PATH: &str = "generate-3d-model/";

/// Anything that can turn a request into a downloadable model
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> &str;

    /// One attempt, no retries. Returns `Cancelled` as soon as `cancel` fires.
    async fn generate(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
    ) -> Result<AssetReference, GenerationError>;
}

/// HTTP client for the generation service
pub struct GenBackend {
    client: Client,
    base_url: Url,
    timeout: Option<Duration>,
    upload_policy: UploadPolicy,
}

impl GenBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: Client::new(),
            base_url: parse_base_url(&config.base_url)?,
            timeout: config.request_timeout,
            upload_policy: config.upload_policy,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self) -> Url {
        // The base always ends in '/', so joining a relative path cannot fail
        self.base_url
            .join(GENERATE_PATH)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    /// Absolute URL for a reference the backend handed back
    pub fn resolve_reference(&self, raw: &str) -> Result<String, GenerationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(GenerationError::MalformedResponse("empty asset reference".into()));
        }

        match Url::parse(raw) {
            Ok(url) => Ok(url.to_string()),
            Err(_) => self
                .base_url
                .join(raw)
                .map(|url| url.to_string())
                .map_err(|e| GenerationError::MalformedResponse(format!("bad asset reference '{raw}': {e}"))),
        }
    }

    fn build_form(&self, request: &GenerationRequest) -> Form {
        let held_back = request.held_back(self.upload_policy);
        if held_back > 0 {
            warn!(
                "Upload policy '{}' sends 1 of {} staged images; {} held back",
                self.upload_policy,
                request.images.len(),
                held_back
            );
        }

        request
            .uploads(self.upload_policy)
            .iter()
            .fold(Form::new().text("text", request.text.clone()), |form, file| {
                form.part("images", image_part(file))
            })
    }

    async fn send(&self, request: &GenerationRequest) -> Result<AssetReference, GenerationError> {
        let url = self.endpoint();
        info!("POST {}", url);

        let mut builder = self.client.post(url).multipart(self.build_form(request));
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            debug!("Backend error body: {}", body);
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message: ErrorBody::parse(&body),
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let mut asset = AssetReference::new(self.resolve_reference(&parsed.glb_download)?);
        if let Some(obj) = parsed.obj_download.as_deref() {
            asset = asset.with_obj(self.resolve_reference(obj)?);
        }
        if let Some(thumbnail) = parsed.thumbnail_url.as_deref() {
            asset = asset.with_thumbnail(self.resolve_reference(thumbnail)?);
        }

        Ok(asset)
    }

    fn map_transport(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.timeout.map(|t| t.as_secs()).unwrap_or_default())
        } else if e.is_connect() {
            GenerationError::Network(format!("Failed to connect to {}", self.base_url))
        } else {
            GenerationError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl GenerationBackend for GenBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
    ) -> Result<AssetReference, GenerationError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerationError::Cancelled),
            result = self.send(&request) => result,
        }
    }
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let normalized = format!("{}/", raw.trim().trim_end_matches('/'));
    Url::parse(&normalized).map_err(|e| AppError::Config(format!("invalid backend URL '{raw}': {e}")))
}

fn image_part(file: &StagedFile) -> Part {
    let part = || Part::bytes(file.bytes().to_vec()).file_name(file.filename().to_string());
    part().mime_str(file.mime_type()).unwrap_or_else(|_| part())
}
