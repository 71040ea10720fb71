use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use yearstat::StatsProgress;

/// Interactive progress reporter using indicatif.
///
/// Shows a spinner while the repository list is fetched, then a bar that
/// advances once per finished repository.
pub struct InteractiveReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    pub fn handle(&self, event: StatsProgress) {
        let mut bar = self.bar.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            StatsProgress::ListingRepos { account } => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(Self::spinner_style());
                pb.set_prefix(account);
                pb.set_message("listing repositories");
                pb.enable_steady_tick(Duration::from_millis(100));
                *bar = Some(pb);
            }

            StatsProgress::ReposListed { count, .. } => {
                if let Some(pb) = bar.as_ref() {
                    pb.disable_steady_tick();
                    pb.set_style(Self::bar_style());
                    pb.set_length(count as u64);
                    pb.set_position(0);
                    pb.set_message("");
                }
            }

            StatsProgress::ListingFailed { error, .. } => {
                if let Some(pb) = bar.take() {
                    pb.abandon_with_message(format!("could not list repositories: {error}"));
                }
            }

            StatsProgress::MetricFailed {
                repo,
                metric,
                error,
            } => {
                if let Some(pb) = bar.as_ref() {
                    pb.println(format!("  {repo}: {metric} counted as zero ({error})"));
                }
            }

            StatsProgress::RepoCompleted { repo, .. } => {
                if let Some(pb) = bar.as_ref() {
                    pb.set_message(repo);
                    pb.inc(1);
                }
            }

            StatsProgress::AggregationComplete { .. } => {
                if let Some(pb) = bar.take() {
                    pb.finish_and_clear();
                }
            }

            _ => {}
        }
    }

    pub fn finish(&self) {
        let mut bar = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = bar.take()
            && !pb.is_finished()
        {
            pb.finish_and_clear();
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
