use std::io::{self, Write};

use zk_core::presenter::View;
use zk_core::AssetFormat;

use crate::ui::UiComponent;

/// Result area: placeholder, finished model, or error. Stands in for the 3D viewport.
pub struct CentralPanel {
    out: Box<dyn Write + Send>,
}

impl CentralPanel {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    fn render(&mut self, view: &View) -> io::Result<()> {
        match view {
            View::Placeholder { headline, hint, notice } => {
                writeln!(self.out, "{headline}")?;
                writeln!(self.out, "  {hint}")?;
                if let Some(notice) = notice {
                    writeln!(self.out, "⚠ {notice}")?;
                }
            }
            // The progress panel owns the terminal while generating
            View::Progress { .. } => {}
            View::Model { asset, elapsed_secs, download } => {
                writeln!(self.out, "✅ Your 3D model is ready!")?;
                for format in AssetFormat::all() {
                    if let Some(url) = asset.url_for(format) {
                        writeln!(self.out, "  {}: {url}", format.name())?;
                    }
                }
                if let Some(thumbnail) = &asset.thumbnail_url {
                    writeln!(self.out, "  Preview: {thumbnail}")?;
                }
                if let Some(secs) = elapsed_secs {
                    writeln!(self.out, "  Completed in {secs}s")?;
                }
                writeln!(self.out, "  Download as {}", download.filename)?;
            }
            View::Error { message } => {
                writeln!(self.out, "❌ {message}")?;
            }
        }
        self.out.flush()
    }
}

impl UiComponent for CentralPanel {
    fn show(&mut self, view: &View) {
        if let Err(e) = self.render(view) {
            tracing::warn!("Failed to write output: {}", e);
        }
    }
}
