//! In-process stand-in for the remote network.
//!
//! [`StubErxService`] answers every [`ErxApi`] call from its fixtures without any exchange.
//! Fixtures are plain public fields so a test can build one with struct update syntax.

use crate::api::ErxApi;
use crate::context::CallContext;
use crate::models::{
    ErxData, FailedPrescription, MedicationListFilter, Patient, PatientDetails, PharmacyData,
    PharmacySearch, PrescriptionLog, RefillRequestItem, SelectedMedication, TransmissionCounts,
    Treatment,
};
use crate::{ErxError, ErxResult};
use async_trait::async_trait;
use std::collections::HashMap;

/// Status reported for every fixture transmission error.
pub const STUB_ERROR_STATUS: &str = "Error";

#[derive(Clone, Debug, Default)]
pub struct StubErxService {
    /// Remote id written onto patients that start prescribing or are updated.
    pub patient_erx_id: i64,
    /// Remote prescription ids handed to started treatments, by position.
    pub prescription_ids_to_return: Vec<i64>,
    pub prescription_id_to_statuses: HashMap<i64, Vec<PrescriptionLog>>,
    /// Prescription id created by approving or denying a queue item.
    pub refill_request_prescription_ids: HashMap<i64, i64>,
    pub transmission_errors_for_prescription_ids: Vec<i64>,
    pub selected_medication: Option<SelectedMedication>,
    pub pharmacy_details_to_return: Option<PharmacyData>,
    pub patient_details_to_return: Option<PatientDetails>,
    pub refill_queue_to_return: Vec<RefillRequestItem>,
    /// When set, starting prescriptions for any other pharmacy fails.
    pub pharmacy_to_send_prescription_to: Option<i64>,
    /// When set, every sent treatment must carry this reference number.
    pub expected_rx_reference_number: Option<String>,
}

impl StubErxService {
    fn check(&self, cx: &CallContext) -> ErxResult<()> {
        if cx.is_cancelled() {
            return Err(ErxError::Cancelled);
        }
        Ok(())
    }
}

#[async_trait]
impl ErxApi for StubErxService {
    async fn drug_names_for_clinician(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        _prefix: &str,
    ) -> ErxResult<Vec<String>> {
        self.check(cx)?;
        Ok(Vec::new())
    }

    async fn drug_names_for_patient(&self, cx: &CallContext, _prefix: &str) -> ErxResult<Vec<String>> {
        self.check(cx)?;
        Ok(Vec::new())
    }

    async fn search_allergy_related_medications(
        &self,
        cx: &CallContext,
        _search_term: &str,
    ) -> ErxResult<Vec<String>> {
        self.check(cx)?;
        Ok(Vec::new())
    }

    async fn search_medication_strength(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        _medication_name: &str,
    ) -> ErxResult<Vec<String>> {
        self.check(cx)?;
        Ok(Vec::new())
    }

    async fn select_medication(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        _medication_name: &str,
        _medication_strength: &str,
    ) -> ErxResult<Option<SelectedMedication>> {
        self.check(cx)?;
        Ok(self.selected_medication.clone())
    }

    async fn search_pharmacies(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        _search: &PharmacySearch,
    ) -> ErxResult<Vec<PharmacyData>> {
        self.check(cx)?;
        Ok(self.pharmacy_details_to_return.iter().cloned().collect())
    }

    async fn pharmacy_details(
        &self,
        cx: &CallContext,
        _pharmacy_id: i64,
    ) -> ErxResult<Option<PharmacyData>> {
        self.check(cx)?;
        Ok(self.pharmacy_details_to_return.clone())
    }

    async fn start_prescribing_patient(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        patient: &mut Patient,
        treatments: &mut [Treatment],
        pharmacy_id: i64,
    ) -> ErxResult<()> {
        self.check(cx)?;
        if let Some(expected) = self.pharmacy_to_send_prescription_to {
            if expected != pharmacy_id {
                return Err(ErxError::StubMismatch(format!(
                    "expected pharmacy {expected}, got {pharmacy_id}"
                )));
            }
        }

        patient.remote_patient_id = Some(self.patient_erx_id);
        for (treatment, id) in treatments.iter_mut().zip(&self.prescription_ids_to_return) {
            treatment.set_remote_prescription_id(*id);
        }
        Ok(())
    }

    async fn update_patient_information(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        patient: &mut Patient,
    ) -> ErxResult<()> {
        self.check(cx)?;
        patient.remote_patient_id = Some(self.patient_erx_id);
        Ok(())
    }

    async fn send_multiple_prescriptions(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        _patient: &Patient,
        treatments: &[Treatment],
    ) -> ErxResult<Vec<FailedPrescription>> {
        self.check(cx)?;
        if let Some(expected) = &self.expected_rx_reference_number {
            if let Some(treatment) = treatments
                .iter()
                .find(|treatment| treatment.erx_reference_number() != expected.as_str())
            {
                return Err(ErxError::StubMismatch(format!(
                    "expected reference number {expected}, got '{}'",
                    treatment.erx_reference_number()
                )));
            }
        }
        Ok(Vec::new())
    }

    async fn prescription_status(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        prescription_id: i64,
    ) -> ErxResult<Vec<PrescriptionLog>> {
        self.check(cx)?;
        Ok(self
            .prescription_id_to_statuses
            .get(&prescription_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn medication_list(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        _remote_patient_id: i64,
        _filter: &MedicationListFilter,
    ) -> ErxResult<Vec<Treatment>> {
        self.check(cx)?;
        Ok(Vec::new())
    }

    async fn transmission_error_details(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
    ) -> ErxResult<Vec<Treatment>> {
        self.check(cx)?;
        Ok(self
            .transmission_errors_for_prescription_ids
            .iter()
            .map(|&prescription_id| Treatment {
                erx: Some(ErxData {
                    remote_prescription_id: prescription_id,
                    prescription_status: STUB_ERROR_STATUS.to_owned(),
                    ..ErxData::default()
                }),
                ..Treatment::new("")
            })
            .collect())
    }

    async fn transmission_error_refill_request_counts(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
    ) -> ErxResult<TransmissionCounts> {
        self.check(cx)?;
        Ok(TransmissionCounts {
            refill_requests: self.refill_queue_to_return.len() as i64,
            transmission_errors: self.transmission_errors_for_prescription_ids.len() as i64,
        })
    }

    async fn ignore_alert(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        _prescription_id: i64,
    ) -> ErxResult<()> {
        self.check(cx)
    }

    async fn refill_request_queue(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
    ) -> ErxResult<Vec<RefillRequestItem>> {
        self.check(cx)?;
        Ok(self.refill_queue_to_return.clone())
    }

    async fn patient_details(
        &self,
        cx: &CallContext,
        _remote_patient_id: i64,
    ) -> ErxResult<Option<PatientDetails>> {
        self.check(cx)?;
        Ok(self.patient_details_to_return.clone())
    }

    async fn approve_refill_request(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        rx_request_queue_item_id: i64,
        _approved_refills: i64,
        _comments: &str,
    ) -> ErxResult<i64> {
        self.check(cx)?;
        self.refill_prescription_id(rx_request_queue_item_id)
    }

    async fn deny_refill_request(
        &self,
        cx: &CallContext,
        _clinician_id: i64,
        rx_request_queue_item_id: i64,
        _denial_reason: &str,
        _comments: &str,
    ) -> ErxResult<i64> {
        self.check(cx)?;
        self.refill_prescription_id(rx_request_queue_item_id)
    }
}

impl StubErxService {
    fn refill_prescription_id(&self, rx_request_queue_item_id: i64) -> ErxResult<i64> {
        self.refill_request_prescription_ids
            .get(&rx_request_queue_item_id)
            .copied()
            .ok_or_else(|| {
                ErxError::StubMismatch(format!(
                    "no prescription configured for queue item {rx_request_queue_item_id}"
                ))
            })
    }
}
