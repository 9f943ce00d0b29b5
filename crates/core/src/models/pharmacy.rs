use erx_types::StateCode;
use serde::{Deserialize, Serialize};

/// A pharmacy as known to the remote network.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PharmacyData {
    /// Remote pharmacy id.
    pub source_id: i64,
    /// Directory the id belongs to.
    pub source: String,
    pub name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal: String,
    pub phone: String,
    pub fax: String,
    #[serde(default)]
    pub pharmacy_types: Vec<String>,
}

/// Pharmacy search criteria. Blank criteria are not sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PharmacySearch {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: Option<StateCode>,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub pharmacy_types: Vec<String>,
}

impl PharmacySearch {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
            && self.city.trim().is_empty()
            && self.state.is_none()
            && self.zip_code.trim().is_empty()
    }
}
