/// Errors of the load and render stages; none of them is recoverable.
#[derive(Debug, thiserror::Error)]
pub enum PressureError {
    /// The data file cannot be opened or read, or holds no record table
    #[error("data source {origin} unavailable: {reason}")]
    SourceUnavailable { origin: String, reason: String },

    /// A record (or the header, at line 1) lacks a usable field
    #[error("malformed record at line {line}, field `{field}`: {reason}")]
    MalformedRecord {
        line: u64,
        field: String,
        reason: String,
    },

    /// The charting backend could not produce a chart
    #[error("could not render chart `{chart}`: {reason}")]
    RenderFailure { chart: String, reason: String },
}

impl PressureError {
    /// The stage that failed, for the user facing message.
    pub fn stage(&self) -> &'static str {
        match self {
            PressureError::SourceUnavailable { .. } | PressureError::MalformedRecord { .. } => {
                "load"
            }
            PressureError::RenderFailure { .. } => "render",
        }
    }

    pub(crate) fn render<C: Into<String>, R: ToString>(chart: C, reason: R) -> PressureError {
        PressureError::RenderFailure {
            chart: chart.into(),
            reason: reason.to_string(),
        }
    }
}
