use super::pharmacy::PharmacyData;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub number: String,
    #[serde(rename = "type")]
    pub phone_type: String,
}

/// A local patient record, as mirrored on the remote network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    /// Set once the patient has been mirrored remotely; never changes afterwards.
    #[serde(default)]
    pub remote_patient_id: Option<i64>,
    #[serde(default)]
    pub prefix: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub last_name: String,
    #[serde(default)]
    pub suffix: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: Option<Address>,
    /// Up to three numbers; the first is the primary.
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default)]
    pub preferred_pharmacy_id: Option<i64>,
}

/// A patient read back from the remote network, with its primary pharmacy if it has one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatientDetails {
    pub patient: Patient,
    pub pharmacy: Option<PharmacyData>,
}
