//! Gateway runtime configuration.
//!
//! Configuration is resolved once at process startup and then handed to the gateway. Request
//! handling never reads process-wide environment variables.
//!
//! When the caller supplies a zero clinic id, the identity triple (clinic key, clinic id, user
//! id) is taken from the environment instead. That lookup is split out into
//! [`identity_from_env_values`], a pure function over the raw values, so it can be exercised
//! without touching the process environment.

use crate::constants::{
    ENV_API_ENDPOINT, ENV_CLINIC_ID, ENV_CLINIC_KEY, ENV_SOAP_ENDPOINT, ENV_USER_ID,
};
use crate::{ErxError, ErxResult};
use erx_types::{ClinicKey, NonEmptyText};
use reqwest::Url;
use std::time::Duration;

/// The identity the gateway acts as on the remote network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClinicIdentity {
    pub clinic_id: i64,
    pub user_id: i64,
    pub clinic_key: ClinicKey,
}

/// Gateway configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    identity: ClinicIdentity,
    soap_endpoint: Url,
    api_endpoint: NonEmptyText,
    request_timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Create a new `GatewayConfig`.
    ///
    /// A `clinic_id` of zero means "not configured here": the identity triple is then read from
    /// `DOSESPOT_CLINIC_KEY`, `DOSESPOT_CLINIC_ID` and `DOSESPOT_USER_ID`.
    pub fn new(
        clinic_id: i64,
        user_id: i64,
        clinic_key: &str,
        soap_endpoint: &str,
        api_endpoint: &str,
    ) -> ErxResult<Self> {
        let identity = if clinic_id == 0 {
            identity_from_env_values(
                std::env::var(ENV_CLINIC_KEY).ok(),
                std::env::var(ENV_CLINIC_ID).ok(),
                std::env::var(ENV_USER_ID).ok(),
            )?
        } else {
            ClinicIdentity {
                clinic_id,
                user_id,
                clinic_key: parse_clinic_key(clinic_key)?,
            }
        };

        Self::from_parts(identity, soap_endpoint, api_endpoint)
    }

    /// Resolve the whole configuration from the process environment.
    pub fn from_env() -> ErxResult<Self> {
        let identity = identity_from_env_values(
            std::env::var(ENV_CLINIC_KEY).ok(),
            std::env::var(ENV_CLINIC_ID).ok(),
            std::env::var(ENV_USER_ID).ok(),
        )?;
        let soap_endpoint = std::env::var(ENV_SOAP_ENDPOINT)
            .map_err(|_| ErxError::Config(format!("{ENV_SOAP_ENDPOINT} is not set")))?;
        let api_endpoint = std::env::var(ENV_API_ENDPOINT)
            .map_err(|_| ErxError::Config(format!("{ENV_API_ENDPOINT} is not set")))?;

        Self::from_parts(identity, &soap_endpoint, &api_endpoint)
    }

    /// Build from an already-resolved identity.
    pub fn from_parts(
        identity: ClinicIdentity,
        soap_endpoint: &str,
        api_endpoint: &str,
    ) -> ErxResult<Self> {
        if identity.clinic_id == 0 {
            return Err(ErxError::Config("clinic id is not configured".into()));
        }

        let soap_endpoint = Url::parse(soap_endpoint.trim())
            .map_err(|e| ErxError::Config(format!("SOAP endpoint is not a valid URL: {e}")))?;
        if !matches!(soap_endpoint.scheme(), "http" | "https") {
            return Err(ErxError::Config(format!(
                "SOAP endpoint must be http or https, got {}",
                soap_endpoint.scheme()
            )));
        }

        let api_endpoint = NonEmptyText::new(api_endpoint)
            .map_err(|_| ErxError::Config("API endpoint cannot be empty".into()))?;

        Ok(Self {
            identity,
            soap_endpoint,
            api_endpoint,
            request_timeout: None,
        })
    }

    /// Apply a client-wide request timeout on top of any per-call deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn identity(&self) -> &ClinicIdentity {
        &self.identity
    }

    pub fn clinic_id(&self) -> i64 {
        self.identity.clinic_id
    }

    pub fn user_id(&self) -> i64 {
        self.identity.user_id
    }

    pub fn clinic_key(&self) -> &ClinicKey {
        &self.identity.clinic_key
    }

    pub fn soap_endpoint(&self) -> &Url {
        &self.soap_endpoint
    }

    pub fn api_endpoint(&self) -> &str {
        self.api_endpoint.as_str()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

/// Parse the identity triple from optional raw environment values.
///
/// The clinic key is required. Ids must be integers when present; a missing user id reads as
/// zero.
pub fn identity_from_env_values(
    clinic_key: Option<String>,
    clinic_id: Option<String>,
    user_id: Option<String>,
) -> ErxResult<ClinicIdentity> {
    let clinic_key = clinic_key
        .ok_or_else(|| ErxError::Config(format!("{ENV_CLINIC_KEY} is not set")))
        .and_then(|key| parse_clinic_key(&key))?;

    Ok(ClinicIdentity {
        clinic_id: parse_id(ENV_CLINIC_ID, clinic_id)?,
        user_id: parse_id(ENV_USER_ID, user_id)?,
        clinic_key,
    })
}

fn parse_clinic_key(raw: &str) -> ErxResult<ClinicKey> {
    ClinicKey::new(raw).map_err(|_| ErxError::Config("clinic key cannot be empty".into()))
}

fn parse_id(name: &str, value: Option<String>) -> ErxResult<i64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    match value {
        None => Ok(0),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ErxError::Config(format!("{name} must be an integer, got '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOAP: &str = "https://my.staging.example.com/api/11/api.asmx";
    const API: &str = "http://www.dosespot.com/API/11/";

    #[test]
    fn explicit_identity_is_used_as_given() {
        let config = GatewayConfig::new(123, 456, "secret", SOAP, API).unwrap();
        assert_eq!(config.clinic_id(), 123);
        assert_eq!(config.user_id(), 456);
        assert_eq!(config.clinic_key().expose(), "secret");
        assert_eq!(config.api_endpoint(), API);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = GatewayConfig::new(123, 456, "secret-key-value", SOAP, API).unwrap();
        assert!(!format!("{config:?}").contains("secret-key-value"));
    }

    #[test]
    fn rejects_missing_key_and_bad_endpoints() {
        assert!(matches!(
            GatewayConfig::new(1, 1, "  ", SOAP, API),
            Err(ErxError::Config(_))
        ));
        assert!(matches!(
            GatewayConfig::new(1, 1, "k", "not a url", API),
            Err(ErxError::Config(_))
        ));
        assert!(matches!(
            GatewayConfig::new(1, 1, "k", "ftp://example.com/api", API),
            Err(ErxError::Config(_))
        ));
        assert!(matches!(
            GatewayConfig::new(1, 1, "k", SOAP, " "),
            Err(ErxError::Config(_))
        ));
    }

    #[test]
    fn env_values_resolve_identity() {
        let identity = identity_from_env_values(
            Some("secret".into()),
            Some(" 123 ".into()),
            Some("456".into()),
        )
        .unwrap();

        assert_eq!(identity.clinic_id, 123);
        assert_eq!(identity.user_id, 456);
        assert_eq!(identity.clinic_key.expose(), "secret");
    }

    #[test]
    fn env_values_require_key_and_numeric_ids() {
        assert!(matches!(
            identity_from_env_values(None, Some("1".into()), None),
            Err(ErxError::Config(_))
        ));
        assert!(matches!(
            identity_from_env_values(Some("k".into()), Some("abc".into()), None),
            Err(ErxError::Config(_))
        ));
        assert_eq!(
            identity_from_env_values(Some("k".into()), Some("9".into()), None)
                .unwrap()
                .user_id,
            0
        );
    }

    #[test]
    fn zero_clinic_id_after_resolution_is_rejected() {
        let identity = identity_from_env_values(Some("k".into()), None, None).unwrap();
        assert!(matches!(
            GatewayConfig::from_parts(identity, SOAP, API),
            Err(ErxError::Config(_))
        ));
    }

    #[test]
    fn request_timeout_is_recorded() {
        let config = GatewayConfig::new(1, 1, "k", SOAP, API)
            .unwrap()
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
    }
}
