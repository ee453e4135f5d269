//! Progress indicators and prompts for the itemctl CLI.
//!
//! Terminal implementations of the executor callbacks: an indicatif bar for
//! progress and a dialoguer prompt for confirmation.

use colored::Colorize;
use declarative::{ApplyResult, ConfirmCallback, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Finish a spinner with a success line
pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    println!("{} {}", "✓".green(), msg);
}

/// Finish a spinner with an error line
pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    eprintln!("{} {}", "✗".red(), msg);
}

/// Progress bar over a batch of changes
pub struct BarProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }

    fn print(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&mut self, count: usize) {
        if self.quiet {
            return;
        }
        let bar = ProgressBar::new(count as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        self.bar = Some(bar);
    }

    fn on_resource_start(&mut self, address: &str, description: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{description} {address}"));
        }
    }

    fn on_resource_complete(&mut self, address: &str, result: &ApplyResult) {
        let line = match result {
            ApplyResult::Created => format!("  {} {address} created", "+".green()),
            ApplyResult::Modified => format!("  {} {address} updated", "~".yellow()),
            ApplyResult::Removed => format!("  {} {address} removed", "-".red()),
            ApplyResult::Failed { error } => {
                format!("  {} {address} {}", "✗".red(), error.dimmed())
            }
            ApplyResult::Skipped { reason } => {
                format!("  {} {address} skipped ({reason})", "○".dimmed())
            }
            ApplyResult::NoChange => return,
        };
        if !self.quiet || matches!(result, ApplyResult::Failed { .. }) {
            self.print(line);
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn on_batch_complete(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Asks on the terminal before any write
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        match dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                log::warn!("Could not read confirmation ({e}), treating as no");
                false
            }
        }
    }
}
