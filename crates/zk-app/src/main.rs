mod cli;
mod config;
mod error;
mod events;
mod generator;
mod ui;
#[cfg(test)]
mod test_support;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zk_core::error::SessionError;
use zk_core::presenter::{present, View};
use zk_core::session::{GenerationSession, Phase};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::generator::backend::GenBackend;
use crate::generator::download::download_or_cancel;
use crate::generator::text_to_image::TextToImageClient;
use crate::generator::Generator;
use crate::ui::UiState;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    cli.apply_overrides(&mut config);

    match cli.command {
        Commands::Generate { text, images, out, no_download, .. } => {
            let backend = GenBackend::new(&config.backend)?;
            info!("Using generation backend at {}", backend.base_url());
            let generator = Generator::new(
                Arc::new(backend),
                zk_core::validator::InputValidator::new(config.validator.clone()),
                config.expected_generation,
            );
            let mut ui = UiState::terminal();

            let mut session = GenerationSession::with_text_limit(config.max_text_chars);

            // Rejected input is shown as a notice rather than returned as an error
            if session.set_text(text).is_err() {
                ui.draw(present(&session));
                return Ok(ExitCode::FAILURE);
            }
            if let Err(e) = generator.stage_paths(&mut session, &images) {
                if e.downcast_ref::<SessionError>().is_none() {
                    return Err(e);
                }
                ui.draw(present(&session));
                return Ok(ExitCode::FAILURE);
            }

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            let signal_task = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            let phase = match generator.run(&mut session, &mut ui, cancel.clone()).await {
                Ok(phase) => phase,
                Err(_) => return Ok(ExitCode::FAILURE),
            };

            let exit = match (phase, present(&session)) {
                (Phase::Completed, View::Model { download, .. }) if !no_download => {
                    let client = reqwest::Client::new();
                    let timeout = config.backend.request_timeout;
                    match download_or_cancel(&client, &download, &out, timeout, &cancel).await? {
                        Some(path) => {
                            println!("Saved to {}", path.display());
                            ExitCode::SUCCESS
                        }
                        None => ExitCode::from(130),
                    }
                }
                (Phase::Completed, _) => ExitCode::SUCCESS,
                (Phase::Idle, _) => {
                    info!("Cancelled; nothing was saved");
                    ExitCode::from(130)
                }
                _ => ExitCode::FAILURE,
            };

            signal_task.abort();
            Ok(exit)
        }
        Commands::Validate { images } => {
            let validator = zk_core::validator::InputValidator::new(config.validator.clone());
            let mut session = GenerationSession::new();
            let files = images
                .iter()
                .map(zk_core::StagedFile::from_path)
                .collect::<std::io::Result<Vec<_>>>()?;

            match session.stage_files(&validator, files) {
                Ok(_) => {
                    for (index, file) in session.staged().iter().enumerate() {
                        println!("{index}: {} ({}, {} bytes)", file.filename(), file.mime_type(), file.size());
                    }
                    println!(
                        "{} of {} file(s) staged, {} bytes total",
                        session.staged().len(),
                        validator.config().max_file_count,
                        session.staged().total_bytes()
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Imagine { prompt } => {
            let client = TextToImageClient::new(&config.text_to_image)?;
            let url = client.generate_image(&prompt).await.map_err(AppError::from)?;
            println!("{url}");
            Ok(ExitCode::SUCCESS)
        }
    }
}
