use std::cell::RefCell;

use indicatif::{ProgressBar, ProgressStyle};
use solarcal_core::pipeline::{CalibrationStage, ProgressReporter};

/// Progress reporter that drives one indicatif bar per stage.
#[derive(Default)]
pub struct BarReporter {
    bar: RefCell<Option<ProgressBar>>,
}

impl BarReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: CalibrationStage, total_items: Option<usize>) {
        let bar = match total_items {
            Some(total) => {
                let bar = ProgressBar::new(total as u64);
                let template = format!("{stage:<22} [{{bar:40}}] {{pos}}/{{len}}");
                if let Ok(style) = ProgressStyle::default_bar().template(&template) {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_message(stage.to_string());
                bar
            }
        };
        if let Some(previous) = self.bar.replace(Some(bar)) {
            previous.finish_and_clear();
        }
    }

    fn advance(&self, items_done: usize) {
        if let Some(bar) = self.bar.borrow().as_ref() {
            bar.set_position(items_done as u64);
        }
    }

    fn finish_stage(&self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}
