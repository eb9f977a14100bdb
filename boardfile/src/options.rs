//! Load options and the caller-supplied decision points.

use serde::{Deserialize, Serialize};

/// What to do with items that sit on a layer the file never defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedLayerAction {
    /// Move them to `Cmts.User` (vias: to the outer copper layers).
    #[default]
    Rescue,
    /// Remove them from the board.
    Delete,
    /// Abort the load.
    Abort,
}

/// Progress snapshot handed to [`LoadPolicy::progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub line: usize,
    pub total_lines: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total_lines == 0 {
            1.0
        } else {
            (self.line as f64 / self.total_lines as f64).min(1.0)
        }
    }
}

/// Decisions the loader cannot make on its own.
pub trait LoadPolicy {
    /// Items were found on the listed undefined layer names.
    fn undefined_layers(&mut self, layer_names: &[String]) -> UndefinedLayerAction;

    /// A legacy zone uses segment fill. Returning `false` cancels the load.
    /// Asked at most once per load.
    fn convert_segment_fill(&mut self) -> bool;

    /// Called periodically. Returning `false` cancels the load.
    fn progress(&mut self, _progress: Progress) -> bool {
        true
    }

    /// Number of legacy lines between progress calls.
    fn progress_interval(&self) -> usize {
        500
    }
}

/// Non-interactive [`LoadPolicy`] driven by fixed answers.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub undefined_layers: UndefinedLayerAction,
    pub convert_segment_fills: bool,
    pub progress_interval: usize,
    /// Cancel once the reader passes this line. Mostly for tests and tooling.
    pub cancel_after: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            undefined_layers: UndefinedLayerAction::Rescue,
            convert_segment_fills: true,
            progress_interval: 500,
            cancel_after: None,
        }
    }
}

impl LoadPolicy for LoadOptions {
    fn undefined_layers(&mut self, _layer_names: &[String]) -> UndefinedLayerAction {
        self.undefined_layers
    }

    fn convert_segment_fill(&mut self) -> bool {
        self.convert_segment_fills
    }

    fn progress(&mut self, progress: Progress) -> bool {
        match self.cancel_after {
            Some(limit) => progress.line < limit,
            None => true,
        }
    }

    fn progress_interval(&self) -> usize {
        self.progress_interval.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = LoadOptions::default();
        assert_eq!(options.undefined_layers, UndefinedLayerAction::Rescue);
        assert!(options.convert_segment_fills);
        assert_eq!(options.progress_interval(), 500);
    }

    #[test]
    fn test_cancel_after() {
        let mut options = LoadOptions {
            cancel_after: Some(10),
            ..Default::default()
        };
        assert!(options.progress(Progress { line: 9, total_lines: 20 }));
        assert!(!options.progress(Progress { line: 10, total_lines: 20 }));
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(Progress { line: 5, total_lines: 10 }.fraction(), 0.5);
        assert_eq!(Progress { line: 0, total_lines: 0 }.fraction(), 1.0);
    }
}
