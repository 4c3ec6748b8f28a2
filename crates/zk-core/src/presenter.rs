use crate::session::{GenerationSession, Phase, FALLBACK_FAILURE};
use crate::{AssetFormat, AssetReference};

pub const PLACEHOLDER_HEADLINE: &str = "Your 3D model will appear here";
pub const PLACEHOLDER_HINT: &str = "Add text description or upload an image to get started";

/// What the UI should show for the current session
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Placeholder {
        headline: &'static str,
        hint: &'static str,
        notice: Option<String>,
    },
    Progress {
        percent: u8,
        message: String,
    },
    Model {
        asset: AssetReference,
        elapsed_secs: Option<i64>,
        download: DownloadAction,
    },
    Error {
        message: String,
    },
}

/// Save the generated asset under a fixed name, whatever the server calls it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAction {
    pub url: String,
    pub filename: String,
}

impl DownloadAction {
    pub fn for_asset(asset: &AssetReference) -> Self {
        Self {
            url: asset.glb_url.clone(),
            filename: AssetFormat::Glb.default_filename(),
        }
    }
}

pub fn present(session: &GenerationSession) -> View {
    match session.phase() {
        Phase::Idle => View::Placeholder {
            headline: PLACEHOLDER_HEADLINE,
            hint: PLACEHOLDER_HINT,
            notice: session.notice().map(str::to_string),
        },
        Phase::InFlight => {
            let progress = session.progress_estimate();
            View::Progress {
                percent: progress.round().clamp(0.0, 100.0) as u8,
                message: session
                    .status_message()
                    .unwrap_or_else(|| stage_message(progress))
                    .to_string(),
            }
        }
        Phase::Completed => match session.result() {
            Some(asset) => View::Model {
                asset: asset.clone(),
                elapsed_secs: session.elapsed().map(|d| d.num_seconds()),
                download: DownloadAction::for_asset(asset),
            },
            None => View::Error {
                message: FALLBACK_FAILURE.to_string(),
            },
        },
        Phase::Failed => View::Error {
            message: session.failure().unwrap_or(FALLBACK_FAILURE).to_string(),
        },
    }
}

/// Stage caption for an estimate that has no explicit status message
pub fn stage_message(progress: f32) -> &'static str {
    match progress {
        p if p < 10.0 => "Initializing generation...",
        p if p < 25.0 => "Processing your input...",
        p if p < 40.0 => "Understanding the description...",
        p if p < 60.0 => "Analyzing reference images...",
        p if p < 80.0 => "Generating 3D geometry...",
        p if p < 95.0 => "Adding textures and materials...",
        _ => "Finalizing your model...",
    }
}
