use std::fmt;
use std::str::FromStr;

use crate::StagedFile;

/// Which staged images go over the wire.
///
/// The reference backend only reads the first image, so `FirstOnly` is the default.
/// Anything held back is reported, never dropped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPolicy {
    #[default]
    FirstOnly,
    All,
}

impl FromStr for UploadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first-only" | "first_only" => Ok(Self::FirstOnly),
            "all" => Ok(Self::All),
            other => Err(format!("unknown upload policy '{other}' (expected 'first' or 'all')")),
        }
    }
}

impl fmt::Display for UploadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstOnly => f.write_str("first"),
            Self::All => f.write_str("all"),
        }
    }
}

/// Snapshot of the inputs taken at submission time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub text: String,
    pub images: Vec<StagedFile>,
}

impl GenerationRequest {
    pub fn new(text: impl Into<String>, images: Vec<StagedFile>) -> Self {
        Self {
            text: text.into(),
            images,
        }
    }

    /// At least one of non-blank text or an image
    pub fn is_submittable(&self) -> bool {
        !self.text.trim().is_empty() || !self.images.is_empty()
    }

    /// The images a client following `policy` transmits
    pub fn uploads(&self, policy: UploadPolicy) -> &[StagedFile] {
        match policy {
            UploadPolicy::FirstOnly => &self.images[..self.images.len().min(1)],
            UploadPolicy::All => &self.images,
        }
    }

    pub fn held_back(&self, policy: UploadPolicy) -> usize {
        self.images.len() - self.uploads(policy).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str, n: usize) -> GenerationRequest {
        let images = (0..n)
            .map(|i| StagedFile::new(format!("{i}.png"), "image/png", vec![i as u8]))
            .collect();
        GenerationRequest::new(text, images)
    }

    #[test]
    fn test_submittable() {
        assert!(!request("", 0).is_submittable());
        assert!(!request("   \n", 0).is_submittable());
        assert!(request("a red sports car", 0).is_submittable());
        assert!(request("", 1).is_submittable());
    }

    #[test]
    fn test_upload_policy() {
        let req = request("", 3);
        assert_eq!(req.uploads(UploadPolicy::FirstOnly).len(), 1);
        assert_eq!(req.uploads(UploadPolicy::FirstOnly)[0].filename(), "0.png");
        assert_eq!(req.held_back(UploadPolicy::FirstOnly), 2);
        assert_eq!(req.uploads(UploadPolicy::All).len(), 3);
        assert_eq!(req.held_back(UploadPolicy::All), 0);

        let empty = request("text only", 0);
        assert!(empty.uploads(UploadPolicy::FirstOnly).is_empty());
        assert_eq!(empty.held_back(UploadPolicy::FirstOnly), 0);
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("first".parse::<UploadPolicy>(), Ok(UploadPolicy::FirstOnly));
        assert_eq!(" ALL ".parse::<UploadPolicy>(), Ok(UploadPolicy::All));
        assert!("some".parse::<UploadPolicy>().is_err());
    }
}
