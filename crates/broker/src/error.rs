#![forbid(unsafe_code)]

/// Broker failures. "No match" is never an error here; commands queue and
/// waits block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrokerError {
    WaitTimeout { waited_ms: u64 },
    WaitCancelled { reason: &'static str },
    InvalidInput(&'static str),
}

impl BrokerError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WaitTimeout { .. } => "WAIT_TIMEOUT",
            Self::WaitCancelled { .. } => "WAIT_CANCELLED",
            Self::InvalidInput(_) => "VALIDATION",
        }
    }
}

impl std::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitTimeout { waited_ms } => {
                write!(f, "wait timed out after {waited_ms} ms")
            }
            Self::WaitCancelled { reason } => write!(f, "wait cancelled: {reason}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
        }
    }
}

impl std::error::Error for BrokerError {}
