/// Classification of one HTTP attempt, before it's folded into an
/// [`webhook_types::Attempt`] record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A 2xx response was received.
    Success {
        /// The actual status code.
        status_code: u16,
    },
    /// The attempt failed but another attempt may still be made.
    Retryable {
        /// Present when a response was received at all (non-2xx).
        status_code: Option<u16>,
        /// Short error tag.
        error: String,
    },
    /// The attempt failed in a way no retry could fix (TLS certificate
    /// verification). Remaining retries are skipped.
    Fatal {
        /// Short error tag.
        error: String,
    },
}

impl AttemptOutcome {
    /// Splits this outcome into the `(status_code, error)` pair an
    /// [`webhook_types::Attempt`] stores.
    pub fn into_parts(self) -> (Option<u16>, Option<String>) {
        match self {
            AttemptOutcome::Success { status_code } => (Some(status_code), None),
            AttemptOutcome::Retryable { status_code, error } => (status_code, Some(error)),
            AttemptOutcome::Fatal { error } => (None, Some(error)),
        }
    }
}
