//! The capability surface the rest of the application depends on.

use crate::context::CallContext;
use crate::models::{
    FailedPrescription, MedicationListFilter, Patient, PatientDetails, PharmacyData,
    PharmacySearch, PrescriptionLog, RefillRequestItem, SelectedMedication, TransmissionCounts,
    Treatment,
};
use crate::ErxResult;
use async_trait::async_trait;

/// Every e-prescribing operation, named by what it does.
///
/// Operations taking a `clinician_id` act as that clinician; zero or a negative id means the
/// configured default user. Each call completes a single exchange with the remote network and
/// is never retried.
#[async_trait]
pub trait ErxApi: Send + Sync {
    /// Drug names starting with `prefix`, as a clinician would prescribe them.
    async fn drug_names_for_clinician(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        prefix: &str,
    ) -> ErxResult<Vec<String>>;

    /// Drug names starting with `prefix`, for patients reporting their own medications.
    async fn drug_names_for_patient(&self, cx: &CallContext, prefix: &str) -> ErxResult<Vec<String>>;

    async fn search_allergy_related_medications(
        &self,
        cx: &CallContext,
        search_term: &str,
    ) -> ErxResult<Vec<String>>;

    async fn search_medication_strength(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        medication_name: &str,
    ) -> ErxResult<Vec<String>>;

    /// Resolve a drug and strength to its catalogue identity. `None` when nothing matched.
    async fn select_medication(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        medication_name: &str,
        medication_strength: &str,
    ) -> ErxResult<Option<SelectedMedication>>;

    async fn search_pharmacies(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        search: &PharmacySearch,
    ) -> ErxResult<Vec<PharmacyData>>;

    async fn pharmacy_details(
        &self,
        cx: &CallContext,
        pharmacy_id: i64,
    ) -> ErxResult<Option<PharmacyData>>;

    /// Mirror `patient` remotely and add `treatments` as unsent prescriptions.
    ///
    /// On success the patient carries its remote id and every treatment that came back carries
    /// its remote prescription id. `pharmacy_id` is added as the primary favourite when
    /// positive.
    async fn start_prescribing_patient(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        patient: &mut Patient,
        treatments: &mut [Treatment],
        pharmacy_id: i64,
    ) -> ErxResult<()>;

    /// Push the local patient record to its remote mirror.
    async fn update_patient_information(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        patient: &mut Patient,
    ) -> ErxResult<()>;

    /// Send previously added prescriptions to the pharmacy.
    ///
    /// Returns the treatments the remote refused, in input order. Treatments that were never
    /// added remotely are skipped.
    async fn send_multiple_prescriptions(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        patient: &Patient,
        treatments: &[Treatment],
    ) -> ErxResult<Vec<FailedPrescription>>;

    /// Status history of a prescription, most recent first.
    async fn prescription_status(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        prescription_id: i64,
    ) -> ErxResult<Vec<PrescriptionLog>>;

    async fn medication_list(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        remote_patient_id: i64,
        filter: &MedicationListFilter,
    ) -> ErxResult<Vec<Treatment>>;

    async fn transmission_error_details(
        &self,
        cx: &CallContext,
        clinician_id: i64,
    ) -> ErxResult<Vec<Treatment>>;

    async fn transmission_error_refill_request_counts(
        &self,
        cx: &CallContext,
        clinician_id: i64,
    ) -> ErxResult<TransmissionCounts>;

    async fn ignore_alert(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        prescription_id: i64,
    ) -> ErxResult<()>;

    async fn refill_request_queue(
        &self,
        cx: &CallContext,
        clinician_id: i64,
    ) -> ErxResult<Vec<RefillRequestItem>>;

    /// The remote mirror of a patient, or `None` when the remote has no such patient.
    async fn patient_details(
        &self,
        cx: &CallContext,
        remote_patient_id: i64,
    ) -> ErxResult<Option<PatientDetails>>;

    /// Approve a refill request. Returns the id of the new prescription.
    async fn approve_refill_request(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        rx_request_queue_item_id: i64,
        approved_refills: i64,
        comments: &str,
    ) -> ErxResult<i64>;

    /// Deny a refill request. Returns the prescription id the denial was recorded against.
    async fn deny_refill_request(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        rx_request_queue_item_id: i64,
        denial_reason: &str,
        comments: &str,
    ) -> ErxResult<i64>;
}
