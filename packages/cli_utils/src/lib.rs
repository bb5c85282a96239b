#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the crime dashboard toolchain.
//!
//! [`IndicatifProgress`] renders fetcher progress in the terminal and
//! [`init_logger`] keeps log output from tearing those bars.

use std::sync::Arc;
use std::time::Duration;

use boston_crime_source::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Download progress rendered with `indicatif`.
///
/// Starts as a spinner because the number of files is only known once the
/// fetcher has resolved the year range.
pub struct IndicatifProgress {
    bar: ProgressBar,
    counted: ProgressStyle,
}

impl IndicatifProgress {
    /// Adds a download indicator to `multi`.
    #[must_use]
    pub fn download_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(120));
        Arc::new(Self::with_bar(bar, message))
    }

    fn with_bar(bar: ProgressBar, message: &str) -> Self {
        let spinner = ProgressStyle::with_template("{spinner:.blue} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner);
        bar.set_message(message.to_string());

        let counted = ProgressStyle::with_template("{bar:30.blue/white} {pos:>2}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");

        Self { bar, counted }
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_style(self.counted.clone());
        self.bar.set_length(total);
        self.bar.reset();
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Installs `pretty_env_logger` (configured by `RUST_LOG`) behind
/// `indicatif-log-bridge`, so log lines are printed above any active
/// progress bars instead of through them.
///
/// Bars must be added to the returned [`MultiProgress`].
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();
    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let max_level = logger.filter();

    // A logger may already be installed, e.g. when several tests call this.
    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(max_level);
    }

    multi
}
