//! Translation between local domain models and wire shapes.
//!
//! Everything here is pure. Fallible mappers return [`WireResult`]: a value the remote sent
//! that cannot be represented locally is a decode failure of the reply it arrived in, and the
//! gateway classifies it against the operation that was called.

use crate::constants::{MAX_PATIENT_PHONES, PRN_REFILLS};
use crate::models::treatment::is_controlled_schedule;
use crate::models::{
    Address, DrugDbIds, DrugDbKey, ErxData, Patient, PatientDetails, PharmacyData,
    PhoneNumber, PrescriptionLog, RefillRequestItem, SelectedMedication, Treatment,
    TransmissionCounts,
};
use erx_wire::constants::{PHARMACY_SOURCE_SURESCRIPTS, PRN};
use erx_wire::date::date_to_remote;
use erx_wire::messages::drugs::MedicationSelectReply;
use erx_wire::messages::prescriptions::{
    PrescriptionLogEntry, RefillTransmissionErrorCount, TransmissionErrorDetail,
};
use erx_wire::messages::refills::RefillRequestQueueItem;
use erx_wire::shapes::{PatientUpdate, WireMedication, WirePatient, WirePharmacy};
use erx_wire::{WireError, WireResult};
use rust_decimal::Decimal;

/// Separator between specialties in a pharmacy's `PharmacySpecialties` field.
const SPECIALTY_SEPARATOR: &str = ", ";

pub fn patient_to_wire(patient: &Patient) -> WirePatient {
    let mut wire = WirePatient {
        patient_id: patient.remote_patient_id.unwrap_or(0),
        prefix: patient.prefix.clone(),
        first_name: patient.first_name.clone(),
        middle_name: patient.middle_name.clone(),
        last_name: patient.last_name.clone(),
        suffix: patient.suffix.clone(),
        date_of_birth: Some(date_to_remote(patient.date_of_birth)),
        gender: patient.gender.clone(),
        email: patient.email.clone(),
        ..WirePatient::default()
    };

    if let Some(address) = &patient.address {
        wire.address1 = address.line1.clone();
        wire.address2 = address.line2.clone();
        wire.city = address.city.clone();
        wire.state = address.state.clone();
        wire.zip_code = address.zip_code.clone();
    }

    let mut phones = patient.phone_numbers.iter().take(MAX_PATIENT_PHONES);
    if let Some(phone) = phones.next() {
        wire.primary_phone = phone.number.clone();
        wire.primary_phone_type = phone.phone_type.clone();
    }
    if let Some(phone) = phones.next() {
        wire.phone_additional1 = phone.number.clone();
        wire.phone_additional_type1 = phone.phone_type.clone();
    }
    if let Some(phone) = phones.next() {
        wire.phone_additional2 = phone.number.clone();
        wire.phone_additional_type2 = phone.phone_type.clone();
    }

    wire
}

pub fn patient_from_wire(wire: &WirePatient) -> WireResult<Patient> {
    let date_of_birth = wire
        .date_of_birth
        .map(|dob| dob.date_naive())
        .ok_or_else(|| WireError::MissingElement("Patient>DateOfBirth".into()))?;

    let has_address = [
        &wire.address1,
        &wire.address2,
        &wire.city,
        &wire.state,
        &wire.zip_code,
    ]
    .iter()
    .any(|field| !field.is_empty());

    let phone_numbers = [
        (&wire.primary_phone, &wire.primary_phone_type),
        (&wire.phone_additional1, &wire.phone_additional_type1),
        (&wire.phone_additional2, &wire.phone_additional_type2),
    ]
    .into_iter()
    .filter(|(number, _)| !number.is_empty())
    .map(|(number, phone_type)| PhoneNumber {
        number: number.clone(),
        phone_type: phone_type.clone(),
    })
    .collect();

    Ok(Patient {
        remote_patient_id: (wire.patient_id != 0).then_some(wire.patient_id),
        prefix: wire.prefix.clone(),
        first_name: wire.first_name.clone(),
        middle_name: wire.middle_name.clone(),
        last_name: wire.last_name.clone(),
        suffix: wire.suffix.clone(),
        date_of_birth,
        gender: wire.gender.clone(),
        email: wire.email.clone(),
        address: has_address.then(|| Address {
            line1: wire.address1.clone(),
            line2: wire.address2.clone(),
            city: wire.city.clone(),
            state: wire.state.clone(),
            zip_code: wire.zip_code.clone(),
        }),
        phone_numbers,
        preferred_pharmacy_id: None,
    })
}

pub fn pharmacy_from_wire(wire: &WirePharmacy) -> PharmacyData {
    PharmacyData {
        source_id: wire.pharmacy_id,
        source: PHARMACY_SOURCE_SURESCRIPTS.to_owned(),
        name: wire.store_name.clone(),
        address_line1: wire.address1.clone(),
        address_line2: wire.address2.clone(),
        city: wire.city.clone(),
        state: wire.state.clone(),
        postal: wire.zip_code.clone(),
        phone: wire.primary_phone.clone(),
        fax: wire.primary_fax.clone(),
        pharmacy_types: wire
            .pharmacy_specialties
            .split(SPECIALTY_SEPARATOR)
            .map(str::trim)
            .filter(|specialty| !specialty.is_empty())
            .map(str::to_owned)
            .collect(),
    }
}

/// The first patient of a patient-detail reply together with its first listed pharmacy.
pub fn patient_details_from_updates(updates: &[PatientUpdate]) -> WireResult<Option<PatientDetails>> {
    let Some(update) = updates.first() else {
        return Ok(None);
    };
    let Some(wire_patient) = &update.patient else {
        return Ok(None);
    };

    let pharmacy = update.pharmacies.first().map(pharmacy_from_wire);
    let mut patient = patient_from_wire(wire_patient)?;
    patient.preferred_pharmacy_id = pharmacy.as_ref().map(|p| p.source_id);

    Ok(Some(PatientDetails { patient, pharmacy }))
}

/// A treatment as a prescription to add while starting prescribing.
pub fn treatment_to_wire(treatment: &Treatment, pharmacy_id: i64) -> WireMedication {
    let ids = &treatment.drug_db_ids;
    WireMedication {
        lexi_gen_product_id: ids.get(DrugDbKey::LexiGenProductId).to_owned(),
        lexi_drug_syn_id: ids.get(DrugDbKey::LexiDrugSynId).to_owned(),
        lexi_synonym_type_id: ids.get(DrugDbKey::LexiSynonymTypeId).to_owned(),
        ndc: ids.get(DrugDbKey::Ndc).to_owned(),
        refills: treatment.number_refills.unwrap_or(0).to_string(),
        days_supply: treatment.days_supply,
        dispense: treatment.dispense_value.to_string(),
        dispense_unit_id: treatment.dispense_unit_id,
        instructions: treatment.patient_instructions.clone(),
        pharmacy_id,
        pharmacy_notes: treatment.pharmacy_notes.clone(),
        no_substitutions: !treatment.substitutions_allowed,
        rx_reference_number: treatment.erx_reference_number().to_owned(),
        ..WireMedication::default()
    }
}

/// A remote medication folded back into a treatment.
///
/// Refill and dispense amounts are read leniently: values the remote sends that do not parse
/// leave the refills unset and the dispense value at zero.
pub fn treatment_from_wire(medication: &WireMedication) -> Treatment {
    let drug_name = if medication.drug_name.is_empty() {
        medication.display_name.clone()
    } else {
        medication.drug_name.clone()
    };

    Treatment {
        drug_db_ids: drug_db_ids_of(medication),
        dosage_strength: medication.strength.clone(),
        drug_route: medication.route.clone(),
        dispense_value: medication.dispense.parse::<Decimal>().unwrap_or_default(),
        dispense_unit_id: medication.dispense_unit_id,
        dispense_unit_description: medication.dispense_unit_description.clone(),
        number_refills: medication.refills.parse::<i64>().ok(),
        days_supply: medication.days_supply,
        patient_instructions: medication.instructions.clone(),
        pharmacy_notes: medication.pharmacy_notes.clone(),
        substitutions_allowed: !medication.no_substitutions,
        is_controlled_substance: is_controlled_schedule(&medication.schedule),
        status_details: String::new(),
        erx: Some(ErxData {
            remote_prescription_id: medication.prescription_id,
            erx_medication_id: medication.medication_id,
            prescription_status: medication.prescription_status.clone(),
            erx_sent_date: medication.date_prescribed,
            erx_last_date_filled: medication.last_date_filled,
            transmission_error_date: None,
            erx_reference_number: medication.rx_reference_number.clone(),
            erx_pharmacy_id: medication.pharmacy_id,
            remote_clinician_id: medication.clinician_id,
        }),
        ..Treatment::new(drug_name)
    }
}

fn drug_db_ids_of(medication: &WireMedication) -> DrugDbIds {
    DrugDbIds::new()
        .with(DrugDbKey::LexiGenProductId, medication.lexi_gen_product_id.as_str())
        .with(DrugDbKey::LexiDrugSynId, medication.lexi_drug_syn_id.as_str())
        .with(DrugDbKey::LexiSynonymTypeId, medication.lexi_synonym_type_id.as_str())
        .with(DrugDbKey::Ndc, medication.ndc.as_str())
}

pub fn selected_medication_from_wire(reply: &MedicationSelectReply) -> SelectedMedication {
    SelectedMedication {
        drug_db_ids: DrugDbIds::new()
            .with(DrugDbKey::LexiGenProductId, reply.lexi_gen_product_id.as_str())
            .with(DrugDbKey::LexiDrugSynId, reply.lexi_drug_syn_id.as_str())
            .with(DrugDbKey::LexiSynonymTypeId, reply.lexi_synonym_type_id.as_str())
            .with(DrugDbKey::Ndc, reply.representative_ndc.as_str()),
        matched_drug_name: reply.matched_drug_name.clone(),
        generic_product_name: reply.generic_product_name.clone(),
        dose_form_description: reply.dose_form_description.clone(),
        route_description: reply.route_description.clone(),
        strength_description: reply.strength_description.clone(),
        dispense_unit_id: reply.dispense_unit_id,
        dispense_unit_description: reply.dispense_unit_description.clone(),
        rxcui: reply.rxcui.clone(),
        term_type: reply.term_type.clone(),
        otc: reply.otc,
        schedule: reply.schedule.clone(),
    }
}

pub fn log_from_wire(entry: &PrescriptionLogEntry) -> PrescriptionLog {
    PrescriptionLog {
        log_timestamp: entry.date_time_stamp,
        prescription_status: entry.status.clone(),
        additional_info: entry.additional_info.clone(),
    }
}

/// A prescription that failed to reach its pharmacy.
///
/// Unlike the lenient medication mapping, the refill count must be a number here.
pub fn transmission_error_from_wire(detail: &TransmissionErrorDetail) -> WireResult<Treatment> {
    let medication = detail.medication.clone().unwrap_or_default();
    let mut treatment = treatment_from_wire(&medication);

    treatment.number_refills = parse_count("Medication>Refills", &medication.refills)?;
    treatment.status_details = detail.error_details.clone();
    if let Some(erx) = treatment.erx.as_mut() {
        erx.transmission_error_date = detail.error_date_time_stamp;
    }

    Ok(treatment)
}

/// A refill request from the queue.
///
/// The queue item's requested amount is authoritative for both the requested and dispensed
/// prescriptions. `PRN` means refill as needed and maps to `-1`; anything else must be a count.
pub fn refill_request_from_wire(item: &RefillRequestQueueItem) -> WireResult<RefillRequestItem> {
    let refills = if item.requested_refill_amount == PRN {
        Some(PRN_REFILLS)
    } else {
        parse_count("RequestedRefillAmount", &item.requested_refill_amount)?
    };

    let with_refills = |medication: &Option<WireMedication>| {
        medication.as_ref().map(|medication| Treatment {
            number_refills: refills,
            ..treatment_from_wire(medication)
        })
    };

    Ok(RefillRequestItem {
        rx_request_queue_item_id: item.rx_request_queue_item_id,
        reference_number: item.reference_number.clone(),
        pharmacy_rx_reference_number: item.pharmacy_rx_reference_number.clone(),
        requested_drug_description: item.requested_drug_description.clone(),
        requested_refill_amount: item.requested_refill_amount.clone(),
        requested_dispense: item.requested_dispense.clone(),
        remote_patient_id: item.patient_id,
        patient_added_for_request: item.patient_added_for_request,
        request_date_stamp: item.request_date_stamp,
        clinician_id: item
            .clinician
            .as_ref()
            .map_or(0, |clinician| clinician.clinician_id),
        requested_prescription: with_refills(&item.requested_prescription),
        dispensed_prescription: with_refills(&item.dispensed_prescription),
    })
}

/// Counts for the first clinician listed; an empty list reads as nothing outstanding.
pub fn counts_from_wire(counts: &[RefillTransmissionErrorCount]) -> TransmissionCounts {
    counts
        .first()
        .map(|count| TransmissionCounts {
            refill_requests: count.refill_requests_count,
            transmission_errors: count.transaction_errors_count,
        })
        .unwrap_or_default()
}

fn parse_count(field: &str, raw: &str) -> WireResult<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| WireError::InvalidValue {
            field: field.to_owned(),
            value: raw.to_owned(),
        })
}
