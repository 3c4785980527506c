//! Build progress reporting.

use super::executor::Outcome;
use super::feedback::FeedbackAnalyzer;
use super::job::{CompileJob, Invocation};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;

/// Lifecycle of one target inside a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Pending,
    DirectoriesReady,
    /// Wave `wave` (0-based) of `size` jobs has launched.
    Compiling { wave: usize, size: usize },
    Linked,
    Failed,
}

/// Receives build events. `compiled` is called from worker threads.
pub trait BuildObserver: Sync {
    fn target_state(&self, _target: &str, _state: TargetState) {}

    /// Called once per target before the first wave with the number of
    /// compile jobs and waves it will need.
    fn planned(&self, _target: &str, _jobs: usize, _waves: usize) {}

    /// Called before each compiler or linker invocation.
    fn command(&self, _invocation: &Invocation) {}

    fn compiled(&self, _job: &CompileJob, _outcome: &Outcome) {}

    fn linked(&self, _output: &Path, _outcome: &Outcome) {}
}

/// What a compiler or linker printed, stdout before stderr.
fn tool_output(outcome: &Outcome) -> String {
    [outcome.stdout.trim_end(), outcome.stderr.trim_end()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ignores every event.
pub struct Silent;

impl BuildObserver for Silent {}

/// Terminal reporter: status lines, a progress bar while compiling, and
/// compiler diagnostics echoed above the bar.
pub struct ConsoleReporter {
    verbose: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            bar: Mutex::new(None),
        }
    }

    fn bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok()?.clone()
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok()?.take()
    }

    /// Prints above the progress bar when one is drawn.
    fn say(&self, line: String) {
        match self.bar() {
            Some(bar) if !bar.is_hidden() => bar.println(line),
            _ => println!("{line}"),
        }
    }

    fn hint(&self, output: &str) {
        if let Some(hint) = FeedbackAnalyzer::analyze(output) {
            self.say(format!("{} {}", "help:".bold().cyan(), hint));
        }
    }
}

impl BuildObserver for ConsoleReporter {
    fn target_state(&self, target: &str, state: TargetState) {
        match state {
            TargetState::Pending => {
                println!("{} Building {}", "→".cyan(), target.bold());
            }
            TargetState::DirectoriesReady => {}
            TargetState::Compiling { wave, size } => {
                if let Some(bar) = self.bar() {
                    bar.set_message(format!("wave {} ({} files)", wave + 1, size));
                }
            }
            TargetState::Linked => {
                if let Some(bar) = self.take_bar() {
                    bar.finish_and_clear();
                }
                println!("{} {} linked", "✓".green(), target);
            }
            TargetState::Failed => {
                if let Some(bar) = self.take_bar() {
                    bar.abandon();
                }
                println!("{} {} failed", "x".red(), target);
            }
        }
    }

    fn planned(&self, _target: &str, jobs: usize, waves: usize) {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        let bar = ProgressBar::new(jobs as u64);
        bar.set_style(style);
        bar.set_message(format!("{waves} waves"));

        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn command(&self, invocation: &Invocation) {
        if self.verbose {
            self.say(format!("   {} {}", "$".dimmed(), invocation));
        }
    }

    fn compiled(&self, job: &CompileJob, outcome: &Outcome) {
        if let Some(bar) = self.bar() {
            bar.inc(1);
        }

        let text = tool_output(outcome);
        if !outcome.success {
            self.say(format!(
                "{} Error compiling {}:\n{}",
                "x".red(),
                job.source,
                text
            ));
            self.hint(&text);
        } else if !text.is_empty() {
            self.say(format!("{} Warning in {}:\n{}", "!".yellow(), job.source, text));
        }
    }

    fn linked(&self, output: &Path, outcome: &Outcome) {
        let text = tool_output(outcome);
        if outcome.success {
            if !text.is_empty() {
                self.say(format!(
                    "{} Warning linking {}:\n{}",
                    "!".yellow(),
                    output.display(),
                    text
                ));
            }
            return;
        }
        if !text.is_empty() {
            self.say(text.clone());
        }
        self.say(format!("{} Linking {} failed", "x".red(), output.display()));
        self.hint(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_tracks_bar_lifecycle() {
        let reporter = ConsoleReporter::new(false);
        assert!(reporter.bar().is_none());

        reporter.planned("app", 3, 2);
        assert_eq!(reporter.bar().and_then(|b| b.length()), Some(3));

        reporter.target_state("app", TargetState::Linked);
        assert!(reporter.bar().is_none());
    }

    #[test]
    fn test_tool_output_keeps_stdout() {
        let mut outcome = Outcome::failed(1, "a.c:1:1: error: boom\n");
        outcome.stdout = "note from stdout\n".into();
        assert_eq!(tool_output(&outcome), "note from stdout\na.c:1:1: error: boom");

        let quiet = Outcome {
            stdout: "only stdout".into(),
            ..Outcome::ok()
        };
        assert_eq!(tool_output(&quiet), "only stdout");
        assert_eq!(tool_output(&Outcome::ok()), "");
    }
}
