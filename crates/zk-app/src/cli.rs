use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use zk_core::request::UploadPolicy;

use crate::config::AppConfig;

/// zk - generate 3D models from a text description and reference images
#[derive(Parser, Debug)]
#[command(name = "zk")]
#[command(about = "Generate 3D models from text and images", long_about = None)]
pub struct Cli {
    /// Generation backend base URL (overrides ZK_BACKEND_URL)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Give up on the backend after this many seconds (overrides ZK_REQUEST_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit text and/or images and wait for the model
    Generate {
        /// Description of the object, e.g. "a red sports car"
        #[arg(short, long, default_value = "")]
        text: String,

        /// Reference image; repeat for several
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,

        /// Where the finished model is saved
        #[arg(short, long, default_value = "outputs")]
        out: PathBuf,

        /// Print the asset links without downloading
        #[arg(long)]
        no_download: bool,

        /// Upload every staged image instead of only the first
        #[arg(long)]
        all_images: bool,
    },

    /// Check images against the upload rules without submitting
    Validate {
        #[arg(short, long = "image", required = true)]
        images: Vec<PathBuf>,
    },

    /// Generate a reference image from a prompt
    Imagine {
        #[arg(short, long)]
        prompt: String,
    },
}

impl Cli {
    /// Flags win over environment and `.env`
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(backend) = &self.backend {
            config.backend.base_url = backend.clone();
        }
        if let Some(secs) = self.timeout {
            config.backend.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Commands::Generate { all_images: true, .. } = self.command {
            config.backend.upload_policy = UploadPolicy::All;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "zk", "generate", "--text", "a red sports car", "-i", "a.png", "-i", "b.png", "--no-download",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate { text, images, out, no_download, all_images } => {
                assert_eq!(text, "a red sports car");
                assert_eq!(images, vec![PathBuf::from("a.png"), PathBuf::from("b.png")]);
                assert_eq!(out, PathBuf::from("outputs"));
                assert!(no_download);
                assert!(!all_images);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_validate_requires_images() {
        assert!(Cli::try_parse_from(["zk", "validate"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "zk", "--backend", "http://gpu-box:9000", "--timeout", "30", "generate", "-t", "a mug", "--all-images",
        ])
        .unwrap();
        let mut config = AppConfig::from_lookup(|_| None).unwrap();

        cli.apply_overrides(&mut config);

        assert_eq!(config.backend.base_url, "http://gpu-box:9000");
        assert_eq!(config.backend.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.backend.upload_policy, UploadPolicy::All);
    }
}
