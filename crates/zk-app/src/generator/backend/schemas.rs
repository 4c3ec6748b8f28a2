use serde::{Deserialize, Serialize};

/// Body of a successful `POST /generate-3d-model/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    pub glb_download: String,
    #[serde(default)]
    pub obj_download: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Error bodies seen in the wild: FastAPI's `detail` or a plain `message`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed.message.or_else(|| match parsed.detail? {
            serde_json::Value::String(detail) => Some(detail),
            other => Some(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagineRequest<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagineResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}
