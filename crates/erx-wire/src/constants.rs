//! Protocol constants for the remote prescribing network.

/// Namespace every operation element lives in.
pub const OPERATION_NAMESPACE: &str = "http://www.dosespot.com/API/11/";

/// SOAP 1.1 envelope namespace.
pub const SOAP_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// XML Schema instance namespace (carries `xsi:nil`).
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML Schema namespace.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Declaration that precedes every request envelope.
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Result code the remote uses for success, both per envelope and per batch item.
pub const RESULT_OK: &str = "OK";

/// Refill amount meaning "as needed".
pub const PRN: &str = "PRN";

/// Number of random characters in an SSO phrase.
pub const PHRASE_LENGTH: usize = 32;

/// Leading phrase characters mixed into the user verification hash.
pub const USER_VERIFY_PHRASE_PREFIX: usize = 22;

/// Source tag for pharmacies resolved through the remote network.
pub const PHARMACY_SOURCE_SURESCRIPTS: &str = "surescripts";
