//! Rendering of simulation results.

use serde::Serialize;
use tally_core::{Economy, Snapshot};

/// Output format of `tally run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RunFormat {
    /// One `item = amount` line per item.
    Text,
    /// One JSON object per run.
    Json,
}

/// Output format of `tally generate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    /// YAML, loadable with `tally run --config`.
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Balances at the end of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// One-based run number.
    pub run: u64,
    /// Simulated time the run stopped at.
    pub time: u64,
    /// Item balances by name.
    pub items: Snapshot,
}

impl RunReport {
    /// Capture the current state of `economy`.
    pub fn capture(run: u64, economy: &Economy) -> Self {
        Self {
            run,
            time: economy.time(),
            items: economy.result(),
        }
    }

    /// Render the report in `format`.
    pub fn render(&self, format: RunFormat) -> Result<String, serde_json::Error> {
        match format {
            RunFormat::Text => Ok(self.to_text()),
            RunFormat::Json => serde_json::to_string(self),
        }
    }

    fn to_text(&self) -> String {
        let width = self
            .items
            .keys()
            .map(String::len)
            .max()
            .unwrap_or_default();
        std::iter::once(format!("run {} (t={})", self.run, self.time))
            .chain(
                self.items
                    .iter()
                    .map(|(name, amount)| format!("  {name:<width$} = {amount}")),
            )
            .collect::<Vec<_>>()
            .join("\n")
    }
}
