//! Wire shapes shared by several operations: the result block, patients, pharmacies,
//! medications and clinicians.
//!
//! Drug database identifiers stay strings here. They are opaque to the gateway and the remote
//! sometimes pads or zero-fills them.

use crate::constants::RESULT_OK;
use crate::date::{datetime_leaf, datetime_of};
use crate::xml::Element;
use crate::WireResult;
use chrono::{DateTime, Utc};

/// The `Result` block carried by every reply and by each batch item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultStatus {
    pub code: String,
    pub description: String,
}

impl ResultStatus {
    pub fn ok() -> Self {
        Self {
            code: RESULT_OK.to_owned(),
            description: String::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == RESULT_OK
    }

    /// Reads the required `Result` child of `parent`.
    pub fn from_parent(parent: &Element) -> WireResult<Self> {
        let block = parent.require("Result")?;
        Ok(Self {
            code: block.text_of("ResultCode").to_owned(),
            description: block.text_of("ResultDescription").to_owned(),
        })
    }

    pub fn to_element(&self) -> Element {
        Element::new("Result")
            .with_child(Element::leaf("ResultCode", self.code.as_str()))
            .with_child(Element::leaf("ResultDescription", self.description.as_str()))
    }
}

fn push_text(parent: &mut Element, name: &str, value: &str) {
    parent.push(Element::leaf(name, value));
}

fn push_non_empty(parent: &mut Element, name: &str, value: &str) {
    if !value.is_empty() {
        push_text(parent, name, value);
    }
}

fn push_non_zero(parent: &mut Element, name: &str, value: i64) {
    if value != 0 {
        push_text(parent, name, &value.to_string());
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WirePatient {
    pub patient_id: i64,
    pub prefix: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub suffix: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: String,
    pub email: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub primary_phone: String,
    pub primary_phone_type: String,
    pub phone_additional1: String,
    pub phone_additional_type1: String,
    pub phone_additional2: String,
    pub phone_additional_type2: String,
}

impl WirePatient {
    pub fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            patient_id: element.int_of("PatientId")?,
            prefix: element.text_of("Prefix").to_owned(),
            first_name: element.text_of("FirstName").to_owned(),
            middle_name: element.text_of("MiddleName").to_owned(),
            last_name: element.text_of("LastName").to_owned(),
            suffix: element.text_of("Suffix").to_owned(),
            date_of_birth: datetime_of(element, "DateOfBirth")?,
            gender: element.text_of("Gender").to_owned(),
            email: element.text_of("Email").to_owned(),
            address1: element.text_of("Address1").to_owned(),
            address2: element.text_of("Address2").to_owned(),
            city: element.text_of("City").to_owned(),
            state: element.text_of("State").to_owned(),
            zip_code: element.text_of("ZipCode").to_owned(),
            primary_phone: element.text_of("PrimaryPhone").to_owned(),
            primary_phone_type: element.text_of("PrimaryPhoneType").to_owned(),
            phone_additional1: element.text_of("PhoneAdditional1").to_owned(),
            phone_additional_type1: element.text_of("PhoneAdditionalType1").to_owned(),
            phone_additional2: element.text_of("PhoneAdditional2").to_owned(),
            phone_additional_type2: element.text_of("PhoneAdditionalType2").to_owned(),
        })
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new("Patient");
        push_non_zero(&mut element, "PatientId", self.patient_id);
        push_non_empty(&mut element, "Prefix", &self.prefix);
        push_text(&mut element, "FirstName", &self.first_name);
        push_non_empty(&mut element, "MiddleName", &self.middle_name);
        push_text(&mut element, "LastName", &self.last_name);
        push_non_empty(&mut element, "Suffix", &self.suffix);
        if let Some(dob) = datetime_leaf("DateOfBirth", self.date_of_birth.as_ref()) {
            element.push(dob);
        }
        push_text(&mut element, "Gender", &self.gender);
        push_non_empty(&mut element, "Email", &self.email);
        push_text(&mut element, "Address1", &self.address1);
        push_non_empty(&mut element, "Address2", &self.address2);
        push_text(&mut element, "City", &self.city);
        push_text(&mut element, "State", &self.state);
        push_text(&mut element, "ZipCode", &self.zip_code);
        push_text(&mut element, "PrimaryPhone", &self.primary_phone);
        push_text(&mut element, "PrimaryPhoneType", &self.primary_phone_type);
        push_non_empty(&mut element, "PhoneAdditional1", &self.phone_additional1);
        push_non_empty(&mut element, "PhoneAdditionalType1", &self.phone_additional_type1);
        push_non_empty(&mut element, "PhoneAdditional2", &self.phone_additional2);
        push_non_empty(&mut element, "PhoneAdditionalType2", &self.phone_additional_type2);
        element
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WirePharmacy {
    pub pharmacy_id: i64,
    pub store_name: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub primary_phone: String,
    pub primary_phone_type: String,
    pub primary_fax: String,
    pub pharmacy_specialties: String,
}

impl WirePharmacy {
    pub fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            pharmacy_id: element.int_of("PharmacyId")?,
            store_name: element.text_of("StoreName").to_owned(),
            address1: element.text_of("Address1").to_owned(),
            address2: element.text_of("Address2").to_owned(),
            city: element.text_of("City").to_owned(),
            state: element.text_of("State").to_owned(),
            zip_code: element.text_of("ZipCode").to_owned(),
            primary_phone: element.text_of("PrimaryPhone").to_owned(),
            primary_phone_type: element.text_of("PrimaryPhoneType").to_owned(),
            primary_fax: element.text_of("PrimaryFax").to_owned(),
            pharmacy_specialties: element.text_of("PharmacySpecialties").to_owned(),
        })
    }

    pub fn to_element(&self, name: &str) -> Element {
        let mut element = Element::new(name);
        push_text(&mut element, "PharmacyId", &self.pharmacy_id.to_string());
        push_text(&mut element, "StoreName", &self.store_name);
        push_text(&mut element, "Address1", &self.address1);
        push_non_empty(&mut element, "Address2", &self.address2);
        push_text(&mut element, "City", &self.city);
        push_text(&mut element, "State", &self.state);
        push_text(&mut element, "ZipCode", &self.zip_code);
        push_text(&mut element, "PrimaryPhone", &self.primary_phone);
        push_non_empty(&mut element, "PrimaryPhoneType", &self.primary_phone_type);
        push_non_empty(&mut element, "PrimaryFax", &self.primary_fax);
        push_non_empty(&mut element, "PharmacySpecialties", &self.pharmacy_specialties);
        element
    }
}

/// A medication as the remote describes it in prescriptions, medication lists, transmission
/// errors and refill requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WireMedication {
    pub display_name: String,
    pub drug_name: String,
    pub strength: String,
    pub route: String,
    pub prescription_id: i64,
    pub lexi_gen_product_id: String,
    pub lexi_drug_syn_id: String,
    pub lexi_synonym_type_id: String,
    pub ndc: String,
    pub representative_ndc: String,
    /// Raw refill amount: a count, `PRN`, or empty.
    pub refills: String,
    pub days_supply: Option<i64>,
    pub dispense: String,
    pub dispense_unit_id: i64,
    pub dispense_unit_description: String,
    pub instructions: String,
    pub pharmacy_id: i64,
    pub pharmacy_notes: String,
    pub no_substitutions: bool,
    pub rx_reference_number: String,
    pub prescription_status: String,
    pub status: String,
    pub date_prescribed: Option<DateTime<Utc>>,
    pub last_date_filled: Option<DateTime<Utc>>,
    pub date_written: Option<DateTime<Utc>>,
    pub clinician_id: i64,
    pub clinic_id: i64,
    pub medication_id: i64,
    pub schedule: String,
}

impl WireMedication {
    pub fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            display_name: element.text_of("DisplayName").to_owned(),
            drug_name: element.text_of("DrugName").to_owned(),
            strength: element.text_of("Strength").to_owned(),
            route: element.text_of("Route").to_owned(),
            prescription_id: element.int_of("PrescriptionId")?,
            lexi_gen_product_id: element.text_of("LexiGenProductId").trim().to_owned(),
            lexi_drug_syn_id: element.text_of("LexiDrugSynId").trim().to_owned(),
            lexi_synonym_type_id: element.text_of("LexiSynonymTypeId").trim().to_owned(),
            ndc: element.text_of("NDC").trim().to_owned(),
            representative_ndc: element.text_of("RepresentativeNDC").trim().to_owned(),
            refills: element.text_of("Refills").trim().to_owned(),
            days_supply: element.optional_int_of("DaysSupply")?,
            dispense: element.text_of("Dispense").trim().to_owned(),
            dispense_unit_id: element.int_of("DispenseUnitId")?,
            dispense_unit_description: element.text_of("DispenseUnit").to_owned(),
            instructions: element.text_of("Instructions").to_owned(),
            pharmacy_id: element.int_of("PharmacyId")?,
            pharmacy_notes: element.text_of("PharmacyNotes").to_owned(),
            no_substitutions: element.bool_of("NoSubstitutions")?,
            rx_reference_number: element.text_of("RxReferenceNumber").to_owned(),
            prescription_status: element.text_of("PrescriptionStatus").to_owned(),
            status: element.text_of("Status").to_owned(),
            date_prescribed: datetime_of(element, "DatePrescribed")?,
            last_date_filled: datetime_of(element, "LastDateFilled")?,
            date_written: datetime_of(element, "DateWritten")?,
            clinician_id: element.int_of("ClinicianId")?,
            clinic_id: element.int_of("ClinicId")?,
            medication_id: element.int_of("MedicationId")?,
            schedule: element.text_of("Schedule").to_owned(),
        })
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new("Medication");
        push_non_empty(&mut element, "DisplayName", &self.display_name);
        push_non_empty(&mut element, "DrugName", &self.drug_name);
        push_non_empty(&mut element, "Strength", &self.strength);
        push_non_empty(&mut element, "Route", &self.route);
        push_non_zero(&mut element, "PrescriptionId", self.prescription_id);
        push_text(&mut element, "LexiGenProductId", &self.lexi_gen_product_id);
        push_text(&mut element, "LexiDrugSynId", &self.lexi_drug_syn_id);
        push_text(&mut element, "LexiSynonymTypeId", &self.lexi_synonym_type_id);
        push_non_empty(&mut element, "NDC", &self.ndc);
        push_non_empty(&mut element, "RepresentativeNDC", &self.representative_ndc);
        push_text(&mut element, "Refills", &self.refills);
        if let Some(days) = self.days_supply {
            push_text(&mut element, "DaysSupply", &days.to_string());
        }
        push_text(&mut element, "Dispense", &self.dispense);
        push_text(&mut element, "DispenseUnitId", &self.dispense_unit_id.to_string());
        push_non_empty(&mut element, "DispenseUnit", &self.dispense_unit_description);
        push_text(&mut element, "Instructions", &self.instructions);
        push_non_zero(&mut element, "PharmacyId", self.pharmacy_id);
        push_non_empty(&mut element, "PharmacyNotes", &self.pharmacy_notes);
        push_text(
            &mut element,
            "NoSubstitutions",
            if self.no_substitutions { "true" } else { "false" },
        );
        push_non_empty(&mut element, "RxReferenceNumber", &self.rx_reference_number);
        push_non_empty(&mut element, "PrescriptionStatus", &self.prescription_status);
        push_non_empty(&mut element, "Status", &self.status);
        for (name, value) in [
            ("DatePrescribed", &self.date_prescribed),
            ("LastDateFilled", &self.last_date_filled),
            ("DateWritten", &self.date_written),
        ] {
            if let Some(leaf) = datetime_leaf(name, value.as_ref()) {
                element.push(leaf);
            }
        }
        push_non_zero(&mut element, "ClinicianId", self.clinician_id);
        push_non_zero(&mut element, "ClinicId", self.clinic_id);
        push_non_zero(&mut element, "MedicationId", self.medication_id);
        push_non_empty(&mut element, "Schedule", &self.schedule);
        element
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WireClinician {
    pub clinician_id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl WireClinician {
    pub fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            clinician_id: element.int_of("ClinicianId")?,
            first_name: element.text_of("FirstName").to_owned(),
            last_name: element.text_of("LastName").to_owned(),
        })
    }
}

/// One patient block of a start-prescribing or patient-detail reply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientUpdate {
    pub patient: Option<WirePatient>,
    pub medications: Vec<WireMedication>,
    pub pharmacies: Vec<WirePharmacy>,
}

impl PatientUpdate {
    pub fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            patient: element
                .child("Patient")
                .map(WirePatient::from_element)
                .transpose()?,
            medications: element
                .list_items("Medications", "Medication")
                .map(WireMedication::from_element)
                .collect::<WireResult<_>>()?,
            pharmacies: element
                .list_items("Pharmacies", "Pharmacy")
                .map(WirePharmacy::from_element)
                .collect::<WireResult<_>>()?,
        })
    }

    pub fn list_from(parent: &Element) -> WireResult<Vec<Self>> {
        parent
            .list_items("PatientUpdates", "PatientUpdate")
            .map(Self::from_element)
            .collect()
    }
}

/// Optional medication child, e.g. `RequestedPrescription`, decoded under its own name.
pub fn optional_medication(parent: &Element, name: &str) -> WireResult<Option<WireMedication>> {
    match parent.child(name) {
        Some(element) if !element.is_nil() => WireMedication::from_element(element).map(Some),
        _ => Ok(None),
    }
}
