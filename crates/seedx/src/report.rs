//! 📊 The receipt. What we provisioned, what we sent, what the engine counted.
//!
//! Rendered as a borderless comfy-table because a wall of `info!` lines is
//! not a summary, it is a scavenger hunt.

use std::time::Duration;

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use serde::Serialize;

use crate::provisioner::ProvisionOutcome;

/// 🧾 Everything a seeding run has to say for itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedReport {
    pub index: String,
    pub provisioned: ProvisionOutcome,
    /// 📦 Records handed to the bulk loader.
    pub submitted: usize,
    /// ✅ Records the loader reports as accepted. Equal to `submitted` on success.
    pub accepted: usize,
    /// 🔢 What `_count` said after the settle interval.
    pub document_count: u64,
    /// 🔒 Only set when the exact count check ran (and passed).
    pub expected_count: Option<u64>,
    pub dry_run: bool,
    pub elapsed: Duration,
}

/// 🔢 "1000000" → "1,000,000". Eyes, you're welcome.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ MM:SS.mmm, because most seeding runs are over before a whole second ticks by twice.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    format!(
        "{:02}:{:02}.{:03}",
        total_secs / 60,
        total_secs % 60,
        duration.subsec_millis()
    )
}

impl SeedReport {
    /// 🍽️ Two columns, label left, value right, no borders.
    pub fn summary_table(&self) -> Table {
        let count_verdict = match self.expected_count {
            Some(expected) => format!("{} (exact ✅ expected {})", format_number(self.document_count), format_number(expected)),
            None => format!("{} (informational)", format_number(self.document_count)),
        };
        let target = if self.dry_run {
            format!("{} (dry run 🧪)", self.index)
        } else {
            self.index.clone()
        };

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        let rows = [
            ("🎯 index", target),
            ("🏗️ provisioning", self.provisioned.to_string()),
            ("📦 submitted", format_number(self.submitted as u64)),
            ("✅ accepted", format_number(self.accepted as u64)),
            ("🔢 document count", count_verdict),
            ("⏱️ elapsed", format_duration(self.elapsed)),
        ];
        for (label, value) in rows {
            table.add_row(vec![
                Cell::new(label),
                Cell::new(value).set_alignment(CellAlignment::Right),
            ]);
        }
        table
    }
}
