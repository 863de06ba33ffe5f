//! Progress indicators for nodefleet CLI.

use colored::Colorize;
use fleet::{DispatchProgress, Host};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for a single blocking step (e.g. fetching releases)
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    println!("{} {}", "✓".green(), msg);
}

pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    eprintln!("{} {}", "✗".red(), msg);
}

/// Counts hosts as a dispatch round completes them
pub struct HostProgress {
    bar: ProgressBar,
}

impl HostProgress {
    /// Bar over `hosts` hosts; hidden when `quiet`
    pub fn new(hosts: usize, msg: &str, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(hosts as u64)
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_message(msg.to_string());
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl DispatchProgress for HostProgress {
    fn on_host_complete(&self, host: &Host, success: bool) {
        if !success {
            self.bar
                .suspend(|| println!("  {} {}", "✗".red(), host.id));
        }
        self.bar.inc(1);
    }
}
