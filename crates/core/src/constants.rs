//! Constants used throughout the gateway core crate.

/// Environment variable holding the clinic's shared SSO key.
pub const ENV_CLINIC_KEY: &str = "DOSESPOT_CLINIC_KEY";

/// Environment variable holding the clinic id.
pub const ENV_CLINIC_ID: &str = "DOSESPOT_CLINIC_ID";

/// Environment variable holding the default acting clinician id.
pub const ENV_USER_ID: &str = "DOSESPOT_USER_ID";

/// Environment variable holding the SOAP endpoint URL requests are posted to.
pub const ENV_SOAP_ENDPOINT: &str = "DOSESPOT_SOAP_ENDPOINT";

/// Environment variable holding the namespace base used in the SOAP action header.
pub const ENV_API_ENDPOINT: &str = "DOSESPOT_API_ENDPOINT";

/// Content type of every request.
pub const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Header naming the operation being invoked.
pub const SOAP_ACTION_HEADER: &str = "SOAPAction";

/// Metric name prefixes; the operation tag is appended.
pub const METRIC_LATENCY_PREFIX: &str = "requests/latency/";
pub const METRIC_TOTAL_PREFIX: &str = "requests/total/";
pub const METRIC_FAILED_PREFIX: &str = "requests/failed/";

/// Samples retained per latency histogram.
pub const HISTOGRAM_RESERVOIR_SIZE: usize = 1028;

/// Local phone slots that map onto the remote's fixed phone fields.
pub const MAX_PATIENT_PHONES: usize = 3;

/// Refill count standing for "as needed".
pub const PRN_REFILLS: i64 = -1;
