use crate::{ErxError, ErxResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Namespaces of the remote drug catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrugDbKey {
    LexiGenProductId,
    LexiDrugSynId,
    LexiSynonymTypeId,
    Ndc,
}

impl DrugDbKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            DrugDbKey::LexiGenProductId => "lexi_gen_product_id",
            DrugDbKey::LexiDrugSynId => "lexi_drug_syn_id",
            DrugDbKey::LexiSynonymTypeId => "lexi_synonym_type_id",
            DrugDbKey::Ndc => "ndc",
        }
    }
}

/// Drug catalogue identifiers of a treatment.
///
/// Values are opaque and round-tripped byte for byte; they are only interpreted when matching
/// a treatment against a remote medication.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrugDbIds(BTreeMap<DrugDbKey, String>);

impl DrugDbIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// The identifier under `key`, or `""`.
    pub fn get(&self, key: DrugDbKey) -> &str {
        self.0.get(&key).map(String::as_str).unwrap_or("")
    }

    /// Store `value` under `key`. Empty values are not stored.
    pub fn insert(&mut self, key: DrugDbKey, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, value);
        }
    }

    pub fn with(mut self, key: DrugDbKey, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (DrugDbKey, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }
}

/// What the remote network knows about a submitted treatment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErxData {
    /// Zero until the treatment has been accepted by the remote network.
    pub remote_prescription_id: i64,
    pub erx_medication_id: i64,
    pub prescription_status: String,
    pub erx_sent_date: Option<DateTime<Utc>>,
    pub erx_last_date_filled: Option<DateTime<Utc>>,
    pub transmission_error_date: Option<DateTime<Utc>>,
    pub erx_reference_number: String,
    pub erx_pharmacy_id: i64,
    pub remote_clinician_id: i64,
}

fn substitutions_allowed_default() -> bool {
    true
}

/// A local treatment; once sent it is a prescription on the remote network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treatment {
    #[serde(default)]
    pub drug_db_ids: DrugDbIds,
    pub drug_name: String,
    #[serde(default)]
    pub dosage_strength: String,
    #[serde(default)]
    pub drug_route: String,
    #[serde(default)]
    pub dispense_value: Decimal,
    #[serde(default)]
    pub dispense_unit_id: i64,
    #[serde(default)]
    pub dispense_unit_description: String,
    #[serde(default)]
    pub number_refills: Option<i64>,
    #[serde(default)]
    pub days_supply: Option<i64>,
    #[serde(default)]
    pub patient_instructions: String,
    #[serde(default)]
    pub pharmacy_notes: String,
    #[serde(default = "substitutions_allowed_default")]
    pub substitutions_allowed: bool,
    #[serde(default)]
    pub is_controlled_substance: bool,
    #[serde(default)]
    pub status_details: String,
    #[serde(default)]
    pub erx: Option<ErxData>,
}

impl Treatment {
    pub fn new(drug_name: impl Into<String>) -> Self {
        Self {
            drug_db_ids: DrugDbIds::new(),
            drug_name: drug_name.into(),
            dosage_strength: String::new(),
            drug_route: String::new(),
            dispense_value: Decimal::ZERO,
            dispense_unit_id: 0,
            dispense_unit_description: String::new(),
            number_refills: None,
            days_supply: None,
            patient_instructions: String::new(),
            pharmacy_notes: String::new(),
            substitutions_allowed: true,
            is_controlled_substance: false,
            status_details: String::new(),
            erx: None,
        }
    }

    /// Remote prescription id, zero when never successfully submitted.
    pub fn remote_prescription_id(&self) -> i64 {
        self.erx.as_ref().map_or(0, |erx| erx.remote_prescription_id)
    }

    pub fn set_remote_prescription_id(&mut self, id: i64) {
        self.erx.get_or_insert_with(ErxData::default).remote_prescription_id = id;
    }

    pub fn erx_reference_number(&self) -> &str {
        self.erx
            .as_ref()
            .map_or("", |erx| erx.erx_reference_number.as_str())
    }
}

/// Controlled when the schedule is a positive integer.
pub fn is_controlled_schedule(schedule: &str) -> bool {
    schedule.trim().parse::<i64>().is_ok_and(|level| level > 0)
}

/// A drug chosen by name and strength, as resolved by the remote catalogue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedMedication {
    pub drug_db_ids: DrugDbIds,
    pub matched_drug_name: String,
    pub generic_product_name: String,
    pub dose_form_description: String,
    pub route_description: String,
    pub strength_description: String,
    pub dispense_unit_id: i64,
    pub dispense_unit_description: String,
    pub rxcui: String,
    pub term_type: String,
    pub otc: bool,
    pub schedule: String,
}

impl SelectedMedication {
    pub fn is_controlled_substance(&self) -> bool {
        is_controlled_schedule(&self.schedule)
    }

    /// The generic drug name, recovered from the generic product name.
    ///
    /// The product name reads "name strength route form"; the form, the route and then the
    /// strength are peeled off the end. A strength of `-` or empty is not expected in the name.
    pub fn generic_name(&self) -> ErxResult<String> {
        let name = strip_component(&self.generic_product_name, &self.dose_form_description)
            .ok_or_else(|| ErxError::InvalidInput("generic name is missing the dose form".into()))?;
        let name = strip_component(name, &self.route_description)
            .ok_or_else(|| ErxError::InvalidInput("generic name is missing the route".into()))?;

        if self.strength_description.is_empty() || self.strength_description == "-" {
            return Ok(name.to_owned());
        }

        strip_component(name, &self.strength_description)
            .map(str::to_owned)
            .ok_or_else(|| ErxError::InvalidInput("generic name is missing the strength".into()))
    }

    /// A new treatment for this drug. Dosing, refills and instructions are left for the caller.
    pub fn to_treatment(&self) -> Treatment {
        Treatment {
            drug_db_ids: self.drug_db_ids.clone(),
            dosage_strength: self.strength_description.clone(),
            drug_route: self.route_description.clone(),
            dispense_unit_id: self.dispense_unit_id,
            dispense_unit_description: self.dispense_unit_description.clone(),
            is_controlled_substance: self.is_controlled_substance(),
            ..Treatment::new(self.matched_drug_name.clone())
        }
    }
}

fn strip_component<'a>(name: &'a str, component: &str) -> Option<&'a str> {
    name.strip_suffix(component)
        .map(|rest| rest.trim_end_matches([' ', ',']))
}

/// Filters for a patient's medication list. Empty filters are sent as empty lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationListFilter {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
}

/// A treatment the remote network refused within an otherwise accepted batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedPrescription {
    pub treatment: Treatment,
    pub result_code: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(generic: &str, form: &str, route: &str, strength: &str) -> SelectedMedication {
        SelectedMedication {
            generic_product_name: generic.into(),
            dose_form_description: form.into(),
            route_description: route.into(),
            strength_description: strength.into(),
            ..SelectedMedication::default()
        }
    }

    #[test]
    fn generic_name_peels_form_route_and_strength() {
        let medication = selected("atorvastatin 10 mg oral tablet", "tablet", "oral", "10 mg");
        assert_eq!(medication.generic_name().unwrap(), "atorvastatin");
    }

    #[test]
    fn generic_name_trims_commas_and_skips_blank_strength() {
        let medication = selected("calcium carbonate, oral, chewable", "chewable", "oral", "-");
        assert_eq!(medication.generic_name().unwrap(), "calcium carbonate");
    }

    #[test]
    fn generic_name_reports_missing_component() {
        let medication = selected("tums oral tablet", "capsule", "oral", "");
        match medication.generic_name() {
            Err(ErxError::InvalidInput(message)) => assert!(message.contains("dose form")),
            other => panic!("unexpected {other:?}"),
        }

        let medication = selected("tums oral tablet", "tablet", "oral", "500 mg");
        assert!(matches!(medication.generic_name(), Err(ErxError::InvalidInput(_))));
    }

    #[test]
    fn controlled_schedule_requires_positive_integer() {
        assert!(is_controlled_schedule("2"));
        assert!(!is_controlled_schedule(""));
        assert!(!is_controlled_schedule("0"));
        assert!(!is_controlled_schedule("II"));
    }

    #[test]
    fn drug_ids_skip_empty_values_and_serialise_by_name() {
        let ids = DrugDbIds::new()
            .with(DrugDbKey::LexiDrugSynId, "19421")
            .with(DrugDbKey::Ndc, "");

        assert_eq!(ids.get(DrugDbKey::LexiDrugSynId), "19421");
        assert_eq!(ids.get(DrugDbKey::Ndc), "");
        assert_eq!(
            serde_json::to_string(&ids).unwrap(),
            r#"{"lexi_drug_syn_id":"19421"}"#
        );
    }

    #[test]
    fn selected_medication_becomes_unsent_treatment() {
        let medication = SelectedMedication {
            matched_drug_name: "Lipitor".into(),
            schedule: "2".into(),
            drug_db_ids: DrugDbIds::new().with(DrugDbKey::LexiGenProductId, "3"),
            ..SelectedMedication::default()
        };

        let treatment = medication.to_treatment();
        assert!(treatment.is_controlled_substance);
        assert_eq!(treatment.remote_prescription_id(), 0);
        assert_eq!(treatment.drug_db_ids.get(DrugDbKey::LexiGenProductId), "3");
    }

    #[test]
    fn setting_prescription_id_creates_erx_data() {
        let mut treatment = Treatment::new("Lipitor");
        treatment.set_remote_prescription_id(5504);
        assert_eq!(treatment.remote_prescription_id(), 5504);
    }
}
