mod central_panel;
mod progress_panel;

pub use central_panel::CentralPanel;
pub use progress_panel::ProgressPanel;

use zk_core::presenter::View;

/// A piece of terminal output that reacts to the current [`View`]
pub trait UiComponent: Send {
    fn show(&mut self, view: &View);
}

#[derive(Default)]
pub struct UiState {
    components: Vec<Box<dyn UiComponent>>,
    last_view: Option<View>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress bar plus result area on stdout
    pub fn terminal() -> Self {
        let mut ui = Self::new();
        ui.add_component(Box::new(ProgressPanel::default()));
        ui.add_component(Box::new(CentralPanel::stdout()));
        ui
    }

    pub fn add_component(&mut self, component: Box<dyn UiComponent>) {
        self.components.push(component);
    }

    /// Hand `view` to every component, unless it is what they were last shown
    pub fn draw(&mut self, view: View) {
        if self.last_view.as_ref() == Some(&view) {
            return;
        }

        for component in self.components.iter_mut() {
            component.show(&view);
        }
        self.last_view = Some(view);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Recorder;
    use super::*;

    #[test]
    fn test_identical_views_drawn_once() {
        let recorder = Recorder::default();
        let mut ui = UiState::new();
        ui.add_component(Box::new(recorder.clone()));

        let view = View::Progress { percent: 10, message: "Processing your input...".into() };
        ui.draw(view.clone());
        ui.draw(view.clone());
        ui.draw(View::Progress { percent: 11, message: "Processing your input...".into() });

        assert_eq!(recorder.views().len(), 2);
    }
}
