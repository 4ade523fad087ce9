//! Progress bar and run summary on stderr.

use std::path::Path;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use pagesmith_core::{PipelineError, PipelineObserver, RunStats, WorkItem};

/// Feeds an `indicatif` bar from pipeline events.
///
/// The length grows as items are queued, so the bar also works for watch
/// runs where the total is never known.
pub struct ProgressObserver {
    bar: ProgressBar,
    started: Instant,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self::with_bar(create_progress_bar())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            started: Instant::now(),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineObserver for ProgressObserver {
    fn item_queued(&self, _item: &WorkItem) {
        self.bar.inc_length(1);
    }

    fn item_finished(&self, _filename: &str, _result: Result<&Path, &PipelineError>) {
        self.bar.inc(1);
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.bar
                .set_message(format!("{:.1} pages/sec", self.bar.position() as f64 / elapsed));
        }
    }
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    // The template is a constant, so parsing only fails on a typo here
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after a run.
pub fn print_summary(stats: &RunStats, output: Option<&Path>) {
    for line in summary_lines(stats, output) {
        eprintln!("{line}");
    }
}

fn summary_lines(stats: &RunStats, output: Option<&Path>) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "  ====================================".to_string(),
        "               Summary".to_string(),
        "  ====================================".to_string(),
        format!("    Succeeded:    {:>8}", stats.succeeded),
    ];
    if stats.failed > 0 {
        lines.push(format!("    Failed:       {:>8}", stats.failed));
    }
    lines.push("  ------------------------------------".to_string());
    lines.push(format!("    Total:        {:>8}", stats.queued));
    lines.push(format!("    Duration:     {:>7.1}s", stats.duration.as_secs_f64()));
    lines.push(format!("    Rate:         {:>7.1} pages/sec", stats.rate()));
    if let Some(path) = output {
        lines.push(format!("    Output:       {}", path.display()));
    }
    lines.push("  ====================================".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_summary_hides_zero_failures() {
        let stats = RunStats {
            queued: 4,
            succeeded: 4,
            failed: 0,
            duration: Duration::from_secs(2),
        };
        let lines = summary_lines(&stats, None);
        assert!(lines.iter().any(|l| l.contains("Succeeded:") && l.ends_with('4')));
        assert!(!lines.iter().any(|l| l.contains("Failed:")));
        assert!(lines.iter().any(|l| l.contains("2.0 pages/sec")));
    }

    #[test]
    fn test_summary_shows_failures_and_output() {
        let stats = RunStats {
            queued: 3,
            succeeded: 2,
            failed: 1,
            duration: Duration::ZERO,
        };
        let lines = summary_lines(&stats, Some(Path::new("/out/book.pdf")));
        assert!(lines.iter().any(|l| l.contains("Failed:") && l.ends_with('1')));
        assert!(lines.iter().any(|l| l.ends_with("/out/book.pdf")));
    }

    #[test]
    fn test_observer_counts_finished_items() {
        let observer = ProgressObserver::with_bar(ProgressBar::hidden());
        let err = PipelineError::Worker("x".into());
        observer.item_finished("a.png", Ok(Path::new("/out/a.jpg")));
        observer.item_finished("b.png", Err(&err));
        assert_eq!(observer.bar.position(), 2);
    }
}
