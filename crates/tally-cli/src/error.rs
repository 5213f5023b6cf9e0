//! Error types for the `tally` binary.
//!
//! [`CliError`] wraps every failure mode of loading, generating and
//! simulating so that `main` can propagate with `?`.

/// Top-level error for the `tally` binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Economy configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tally_core::ConfigError,
    },

    /// Rule loading or generation failed.
    #[error("rules error: {source}")]
    Rules {
        /// The underlying rules error.
        #[from]
        source: tally_rules::RulesError,
    },

    /// The configuration was rejected while building the economy.
    #[error("invalid economy: {source}")]
    Verification {
        /// The underlying verification error.
        #[from]
        source: tally_core::VerificationError,
    },

    /// The simulation aborted.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: tally_core::SimulationError,
    },

    /// JSON output could not be produced.
    #[error("JSON output error: {source}")]
    Json {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// Neither an economy configuration nor rules were given.
    #[error("either --config or --rules is required")]
    MissingInput,
}
