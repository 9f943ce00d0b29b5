use erx_wire::{Operation, WireError};

/// Errors surfaced by the gateway façade.
///
/// Every failure is returned to the caller; nothing is retried or recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum ErxError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("{operation} returned HTTP {status}")]
    UnexpectedStatus { operation: Operation, status: u16 },

    #[error("failed to decode {operation} reply: {source}")]
    Decode {
        operation: Operation,
        #[source]
        source: WireError,
    },

    #[error("{operation} rejected with {code}: {description}")]
    Remote {
        operation: Operation,
        code: String,
        description: String,
    },

    #[error("remote patient record diverges from the local record on {field}")]
    MirrorDivergence { field: String },

    #[error("call cancelled before the reply arrived")]
    Cancelled,

    #[error("stub expectation not met: {0}")]
    StubMismatch(String),
}

impl ErxError {
    /// Classify a wire-level failure for `operation`. SOAP faults are the remote's own
    /// rejections and surface as [`ErxError::Remote`].
    pub fn from_wire(operation: Operation, source: WireError) -> Self {
        match source {
            WireError::Fault { code, message } => ErxError::Remote {
                operation,
                code,
                description: message,
            },
            source => ErxError::Decode { operation, source },
        }
    }

    pub(crate) fn divergence(field: &str) -> Self {
        ErxError::MirrorDivergence {
            field: field.to_owned(),
        }
    }
}

pub type ErxResult<T> = std::result::Result<T, ErxError>;
