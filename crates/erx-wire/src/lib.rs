//! Wire/boundary support for the e-prescribing network.
//!
//! This crate provides the **wire models** and **format/translation helpers** for the SOAP
//! protocol spoken by the remote prescribing network:
//! - an owned XML element tree ([`xml::Element`]) used to build requests and read replies
//! - the SOAP 1.1 envelope codec ([`envelope`])
//! - per-call single-sign-on credentials ([`sso::SingleSignOn`])
//! - the operation catalogue ([`Operation`]) and typed request/reply shapes ([`messages`])
//!
//! Nothing in here performs I/O. Transport, telemetry and the mapping onto local domain
//! objects live in `erx-core`.

pub mod constants;
pub mod date;
pub mod envelope;
pub mod messages;
pub mod operation;
pub mod shapes;
pub mod sso;
pub mod xml;

pub use envelope::{decode_reply, encode_request};
pub use operation::Operation;
pub use shapes::ResultStatus;
pub use sso::SingleSignOn;
pub use xml::Element;

/// A typed request for one remote operation.
///
/// The envelope codec wraps [`WireRequest::body`] in an element named after
/// [`WireRequest::OPERATION`].
pub trait WireRequest {
    /// The reply shape the remote answers this request with.
    type Reply: WireReply;

    /// The operation this request performs.
    const OPERATION: Operation;

    /// Child elements of the operation element, in schema order.
    fn body(&self) -> Vec<Element>;
}

/// A typed reply decoded from the single element inside a reply envelope.
pub trait WireReply: Sized {
    /// Decode the reply from its element.
    fn from_element(element: &Element) -> WireResult<Self>;

    /// The `Result` block every reply carries.
    fn status(&self) -> &ResultStatus;
}

/// Errors returned by the `erx-wire` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("malformed envelope: {0}")]
    Envelope(String),

    #[error("missing element: {0}")]
    MissingElement(String),

    #[error("invalid value for {field}: '{value}'")]
    InvalidValue { field: String, value: String },

    #[error("SOAP fault {code}: {message}")]
    Fault { code: String, message: String },
}

/// Type alias for Results that can fail with a [`WireError`].
pub type WireResult<T> = Result<T, WireError>;
