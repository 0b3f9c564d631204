use crate::remote::RemoteError;

/// How the retry loop reacts to a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The service asked us to slow down; retried without limit
    SoftThrottle,

    /// The service is actively blocking us; cooldown, then retried without limit
    HardThrottle,

    /// A request the service rejected for its own reasons; never retried
    Fatal,

    /// Connectivity or server hiccup; retried a bounded number of times
    Transient,
}

/// Classifies a remote failure
///
/// Structured status codes are checked first; message fragments are the
/// fallback because the service reports throttling inconsistently (Canvas
/// answers "403 Forbidden (Rate Limit Exceeded)" for its own limiter).
///
/// | Signal | Kind |
/// |--------|------|
/// | 429, or message mentions "rate limit" | SoftThrottle |
/// | 403, or message mentions "captcha" | HardThrottle |
/// | 5xx | Transient |
/// | any other status | Fatal |
/// | network fault / undecodable body | Transient |
pub fn classify(error: &RemoteError) -> FailureKind {
    match error {
        RemoteError::Api { status, message } => {
            let message = message.to_lowercase();

            if *status == 429 || message.contains("rate limit") {
                FailureKind::SoftThrottle
            } else if *status == 403 || message.contains("captcha") {
                FailureKind::HardThrottle
            } else if (500..600).contains(status) {
                FailureKind::Transient
            } else {
                FailureKind::Fatal
            }
        }
        RemoteError::Network(_) | RemoteError::Decode(_) => FailureKind::Transient,
    }
}
