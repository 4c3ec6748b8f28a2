use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use zk_core::presenter::View;

use crate::ui::UiComponent;

/// Spinner and bar while a generation is in flight
#[derive(Default)]
pub struct ProgressPanel {
    bar: Option<ProgressBar>,
}

impl ProgressPanel {
    fn bar(&mut self) -> &ProgressBar {
        self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(100);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} Creating your 3D model [{bar:30.cyan/blue}] {pos:>3}% {msg}")
            {
                bar.set_style(style.progress_chars("=> ").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        })
    }
}

impl UiComponent for ProgressPanel {
    fn show(&mut self, view: &View) {
        match view {
            View::Progress { percent, message } => {
                let bar = self.bar();
                bar.set_position(u64::from(*percent));
                bar.set_message(message.clone());
            }
            _ => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
            }
        }
    }
}
