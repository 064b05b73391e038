use thiserror::Error;

/// Failures while loading inputs. Scoring itself never fails.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    ConfigParse(String),

    #[error("unsupported config version {found} (supported: {supported})")]
    UnsupportedConfigVersion { found: u32, supported: u32 },

    #[error("invalid scenario {path}: {message}")]
    Scenario { path: String, message: String },

    #[error("invalid trace {path}: {message}")]
    Trace { path: String, message: String },
}
