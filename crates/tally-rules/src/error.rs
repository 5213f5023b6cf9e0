//! Error types for the `tally-rules` crate.

/// Errors that can occur while loading rules or generating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    /// Failed to read the rules file from disk.
    #[error("failed to read rules file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML (or JSON) content.
    #[error("failed to parse rules: {source}")]
    Yaml {
        /// The underlying parse error.
        source: serde_yml::Error,
    },

    /// A story sub-level has no per-level multiplier.
    #[error("story sub-level {sub_level} has no multiplier entry")]
    MissingMultiplier {
        /// Index into `story.first`.
        sub_level: usize,
    },

    /// A story sub-level win has no per-level multiplier.
    #[error("story sub-level {sub_level} has no multiplier for win {item}")]
    MissingWinMultiplier {
        /// Index into `story.first`.
        sub_level: usize,
        /// The win item without a multiplier.
        item: String,
    },

    /// A theft probability is not a percentage.
    #[error("theft probability #{index} is {prob}, expected at most 100")]
    ProbabilityOutOfRange {
        /// Index into `theft.probs`.
        index: usize,
        /// The offending probability.
        prob: u64,
    },

    /// A theft probability has no poker outcome to hand out its ticket.
    #[error("theft probability #{index} has no matching poker outcome")]
    TheftWithoutPokerOutcome {
        /// Index into `theft.probs`.
        index: usize,
    },

    /// A scaled story value or level index does not fit.
    #[error("story values overflow at level {level}")]
    Overflow {
        /// The level being generated.
        level: u32,
    },
}

impl From<serde_yml::Error> for RulesError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}
