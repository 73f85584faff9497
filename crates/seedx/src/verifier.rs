//! 🔍 Verifier: after the bulk insert, take a breath, then count.
//!
//! Elasticsearch is near-real-time. Documents accepted by `_bulk` become
//! countable after the next refresh, which by default is about a second
//! away. So we nap for the settle interval, then ask `_count`.
//!
//! In `informational` mode the number is logged and reported, nothing more.
//! In `exact` mode it must equal the count taken just before loading plus
//! what the loader says was accepted. A slow refresh can fail an exact
//! check; that is the price of strictness.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engines::SearchEngine;
use crate::errors::SeedError;

/// 🎯 How seriously to take the final count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountCheck {
    /// 📊 Log it, report it, move on.
    #[default]
    Informational,
    /// 🔒 Must be `baseline + accepted`, or the run fails.
    Exact,
}

/// 📊 What the count said, and what we hoped it would say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CountVerdict {
    pub(crate) document_count: u64,
    pub(crate) expected: Option<u64>,
}

#[derive(Debug, Clone)]
pub(crate) struct Verifier {
    settle: Duration,
    count_check: CountCheck,
}

impl Verifier {
    pub(crate) fn new(settle: Duration, count_check: CountCheck) -> Self {
        Self { settle, count_check }
    }

    /// 📏 The count before loading, needed only when the check is exact.
    pub(crate) async fn baseline<E: SearchEngine + ?Sized>(
        &self,
        engine: &E,
        index: &str,
    ) -> Result<Option<u64>, SeedError> {
        match self.count_check {
            CountCheck::Informational => Ok(None),
            CountCheck::Exact => {
                let baseline = engine.count(index).await?;
                debug!("📏 Baseline for '{index}': {baseline} documents");
                Ok(Some(baseline))
            }
        }
    }

    /// 🔍 Sleep, count, judge. `baseline` comes from [`Verifier::baseline`].
    pub(crate) async fn verify<E: SearchEngine + ?Sized>(
        &self,
        engine: &E,
        index: &str,
        baseline: Option<u64>,
        accepted: usize,
    ) -> Result<CountVerdict, SeedError> {
        self.settle().await;

        let document_count = engine.count(index).await?;
        info!("🔢 Documents in '{index}': {document_count}");

        let expected = baseline.map(|baseline| baseline + accepted as u64);
        if let Some(expected) = expected.filter(|expected| *expected != document_count) {
            return Err(SeedError::verification(format!(
                "💀 '{index}' holds {document_count} documents, expected exactly {expected} \
                 ({} before loading + {accepted} accepted). Refresh too slow, or someone else is writing.",
                expected - accepted as u64
            )));
        }
        Ok(CountVerdict {
            document_count,
            expected,
        })
    }

    async fn settle(&self) {
        if self.settle.is_zero() {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("⏳ Letting the index refresh ({} ms)", self.settle.as_millis()));
        spinner.enable_steady_tick(Duration::from_millis(100));
        tokio::time::sleep(self.settle).await;
        spinner.finish_and_clear();
    }
}
