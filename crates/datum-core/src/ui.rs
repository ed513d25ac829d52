use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;

const BAR_TEMPLATE: &str =
    "{spinner:.blue} {prefix:>20.cyan} {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.blue} {prefix:>20.cyan} {bytes} ({bytes_per_sec})";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";
const BAR_CHARS: &str = "█▓▒░  ";

static BAR_STYLE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .ok()
        .map(|s| s.tick_chars(TICK).progress_chars(BAR_CHARS))
});

static SPINNER_STYLE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(SPINNER_TEMPLATE)
        .ok()
        .map(|s| s.tick_chars(TICK))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
    Plain,
}

/// Output configuration threaded explicitly through the pipeline.
///
/// Carries the quiet flag and output mode as a value instead of
/// process-wide state, so pipeline behavior is fully determined by its
/// inputs. JSON mode suppresses all decoration; callers emit the JSON
/// payload themselves.
pub struct Reporter {
    mode: OutputMode,
    quiet: bool,
    progress: MultiProgress,
}

impl Reporter {
    pub fn new(mode: OutputMode, quiet: bool) -> Self {
        let progress = if quiet || mode == OutputMode::Json {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self {
            mode,
            quiet,
            progress,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    fn decorated(&self) -> bool {
        !self.quiet && self.mode != OutputMode::Json
    }

    /// A free-form status line, suppressed in quiet and JSON modes.
    pub fn note(&self, line: &str) {
        if self.decorated() {
            println!("{line}");
        }
    }

    pub fn file_skipped(&self, name: &str) {
        if self.decorated() {
            println!("  {}  {}", style("skipped").dim(), name);
        }
    }

    pub fn file_cached(&self, name: &str) {
        if self.decorated() {
            println!("  {}  {}", style("cached").dim(), name);
        }
    }

    /// Progress bar for one transfer, hidden in quiet/JSON modes.
    pub fn transfer_bar(&self, name: &str, len: Option<u64>) -> ProgressBar {
        let bar = match len {
            Some(len) => {
                let bar = ProgressBar::new(len);
                if let Some(s) = BAR_STYLE.as_ref() {
                    bar.set_style(s.clone());
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Some(s) = SPINNER_STYLE.as_ref() {
                    bar.set_style(s.clone());
                }
                bar
            }
        };
        bar.set_prefix(name.to_string());
        self.progress.add(bar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_mode_hides_decoration() {
        let reporter = Reporter::new(OutputMode::Json, false);
        assert!(!reporter.decorated());
    }

    #[test]
    fn test_quiet_hides_decoration() {
        let reporter = Reporter::new(OutputMode::Table, true);
        assert!(!reporter.decorated());
    }

    #[test]
    fn test_table_mode_is_decorated() {
        let reporter = Reporter::new(OutputMode::Table, false);
        assert!(reporter.decorated());
    }
}
