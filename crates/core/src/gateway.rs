//! The SOAP-backed implementation of [`ErxApi`].
//!
//! Every call mints a fresh single-sign-on credential, performs exactly one exchange through
//! [`SoapTransport`], and folds the reply back into domain models. Local records are only
//! mutated after the reply has been accepted: an `OK` result and, for patient calls, a mirror
//! that matches the local record.

use crate::api::ErxApi;
use crate::config::GatewayConfig;
use crate::context::CallContext;
use crate::mapping;
use crate::models::prescription_log::sort_most_recent_first;
use crate::models::{
    FailedPrescription, MedicationListFilter, Patient, PatientDetails, PharmacyData,
    PharmacySearch, PrescriptionLog, RefillRequestItem, SelectedMedication, TransmissionCounts,
    Treatment,
};
use crate::reconcile::{assign_prescription_ids, ensure_consistent};
use crate::telemetry::{MetricsRegistry, Telemetry};
use crate::transport::SoapTransport;
use crate::{ErxError, ErxResult};
use async_trait::async_trait;
use erx_wire::messages::drugs::{
    AllergySearchRequest, MedicationListRequest, MedicationQuickSearchRequest,
    MedicationSelectRequest, MedicationStrengthSearchRequest, SelfReportedMedicationSearchRequest,
};
use erx_wire::messages::patient::{FavoritePharmacy, PatientDetailRequest, StartPrescribingRequest};
use erx_wire::messages::pharmacy::{PharmacyDetailsRequest, PharmacySearchRequest};
use erx_wire::messages::prescriptions::{
    IgnoreAlertRequest, PrescriptionLogRequest, RefillTransmissionErrorCountsRequest,
    SendMultiplePrescriptionsRequest, TransmissionErrorDetailsRequest,
};
use erx_wire::messages::refills::{
    ApproveRefillRequest, DenyRefillRequest, RefillRequestQueueRequest,
};
use erx_wire::shapes::WireMedication;
use erx_wire::{Operation, SingleSignOn, WireResult};
use std::sync::Arc;

/// Gateway to the remote prescribing network.
///
/// Safe to share between tasks; all per-call state lives on the call's stack.
#[derive(Debug)]
pub struct ErxGateway {
    config: GatewayConfig,
    transport: SoapTransport,
}

impl ErxGateway {
    /// Build a gateway and register its telemetry with `registry`, if one is given.
    pub fn new(config: GatewayConfig, registry: Option<&dyn MetricsRegistry>) -> ErxResult<Self> {
        let telemetry = Arc::new(Telemetry::new(registry));
        let transport = SoapTransport::new(&config, telemetry)?;

        tracing::info!(
            clinic_id = config.clinic_id(),
            endpoint = %config.soap_endpoint(),
            "e-prescribing gateway ready"
        );

        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &Telemetry {
        self.transport.telemetry()
    }

    /// A fresh credential acting as `clinician_id`, or as the configured user when it is not
    /// positive.
    fn sso(&self, clinician_id: i64) -> SingleSignOn {
        let user_id = if clinician_id <= 0 {
            self.config.user_id()
        } else {
            clinician_id
        };
        SingleSignOn::generate(self.config.clinic_key(), user_id, self.config.clinic_id())
    }

    fn start_prescribing_request(
        &self,
        clinician_id: i64,
        patient: &Patient,
        pharmacy_id: i64,
        prescriptions: Vec<WireMedication>,
    ) -> StartPrescribingRequest {
        let favorite_pharmacies = if pharmacy_id > 0 {
            vec![FavoritePharmacy {
                pharmacy_id,
                is_primary: true,
            }]
        } else {
            Vec::new()
        };

        StartPrescribingRequest {
            sso: self.sso(clinician_id),
            patient: mapping::patient_to_wire(patient),
            favorite_pharmacies,
            prescriptions,
        }
    }
}

/// Mapper failures after an `OK` reply are decode errors of the call.
fn decoded<T>(operation: Operation, result: WireResult<T>) -> ErxResult<T> {
    result.map_err(|e| ErxError::from_wire(operation, e))
}

#[async_trait]
impl ErxApi for ErxGateway {
    async fn drug_names_for_clinician(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        prefix: &str,
    ) -> ErxResult<Vec<String>> {
        let request = MedicationQuickSearchRequest {
            sso: self.sso(clinician_id),
            search_string: prefix.to_owned(),
        };
        Ok(self.transport.call(cx, &request).await?.display_names)
    }

    async fn drug_names_for_patient(&self, cx: &CallContext, prefix: &str) -> ErxResult<Vec<String>> {
        let request = SelfReportedMedicationSearchRequest {
            sso: self.sso(0),
            search_term: prefix.to_owned(),
        };
        Ok(self.transport.call(cx, &request).await?.display_names)
    }

    async fn search_allergy_related_medications(
        &self,
        cx: &CallContext,
        search_term: &str,
    ) -> ErxResult<Vec<String>> {
        let request = AllergySearchRequest {
            sso: self.sso(0),
            search_term: search_term.to_owned(),
        };
        Ok(self.transport.call(cx, &request).await?.names)
    }

    async fn search_medication_strength(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        medication_name: &str,
    ) -> ErxResult<Vec<String>> {
        let request = MedicationStrengthSearchRequest {
            sso: self.sso(clinician_id),
            medication_name: medication_name.to_owned(),
        };
        Ok(self.transport.call(cx, &request).await?.display_strengths)
    }

    async fn select_medication(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        medication_name: &str,
        medication_strength: &str,
    ) -> ErxResult<Option<SelectedMedication>> {
        let request = MedicationSelectRequest {
            sso: self.sso(clinician_id),
            medication_name: medication_name.to_owned(),
            medication_strength: medication_strength.to_owned(),
        };
        let reply = self.transport.call(cx, &request).await?;

        if reply.is_miss() {
            tracing::debug!("no catalogue match for {medication_name} {medication_strength}");
            return Ok(None);
        }
        Ok(Some(mapping::selected_medication_from_wire(&reply)))
    }

    async fn search_pharmacies(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        search: &PharmacySearch,
    ) -> ErxResult<Vec<PharmacyData>> {
        if search.is_empty() {
            return Err(ErxError::InvalidInput(
                "pharmacy search needs a name, city, state or zip code".into(),
            ));
        }

        let request = PharmacySearchRequest {
            sso: self.sso(clinician_id),
            name: search.name.trim().to_owned(),
            city: search.city.trim().to_owned(),
            state: search
                .state
                .as_ref()
                .map(|state| state.as_str().to_owned())
                .unwrap_or_default(),
            zip_code: search.zip_code.trim().to_owned(),
            specialties: search.pharmacy_types.clone(),
        };
        let reply = self.transport.call(cx, &request).await?;

        Ok(reply
            .pharmacies
            .iter()
            .map(mapping::pharmacy_from_wire)
            .collect())
    }

    async fn pharmacy_details(
        &self,
        cx: &CallContext,
        pharmacy_id: i64,
    ) -> ErxResult<Option<PharmacyData>> {
        let request = PharmacyDetailsRequest {
            sso: self.sso(0),
            pharmacy_id,
        };
        let reply = self.transport.call(cx, &request).await?;
        Ok(reply.pharmacy.as_ref().map(mapping::pharmacy_from_wire))
    }

    async fn start_prescribing_patient(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        patient: &mut Patient,
        treatments: &mut [Treatment],
        pharmacy_id: i64,
    ) -> ErxResult<()> {
        let prescriptions = treatments
            .iter()
            .map(|treatment| mapping::treatment_to_wire(treatment, pharmacy_id))
            .collect();
        let request =
            self.start_prescribing_request(clinician_id, patient, pharmacy_id, prescriptions);

        self.transport
            .call_with(cx, &request, |reply| {
                let mirror = ensure_consistent(patient, &reply.patient_updates)?;
                patient.remote_patient_id = Some(mirror.patient_id);

                let medications = reply
                    .patient_updates
                    .iter()
                    .flat_map(|update| update.medications.iter());
                let matched = assign_prescription_ids(treatments, medications);
                if matched < treatments.len() {
                    tracing::warn!(
                        patient_id = mirror.patient_id,
                        "{} of {} treatments were not matched to a remote prescription",
                        treatments.len() - matched,
                        treatments.len()
                    );
                }
                Ok(())
            })
            .await
    }

    async fn update_patient_information(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        patient: &mut Patient,
    ) -> ErxResult<()> {
        let pharmacy_id = patient.preferred_pharmacy_id.unwrap_or(0);
        let request =
            self.start_prescribing_request(clinician_id, patient, pharmacy_id, Vec::new());

        self.transport
            .call_with(cx, &request, |reply| {
                let mirror = ensure_consistent(patient, &reply.patient_updates)?;
                patient.remote_patient_id = Some(mirror.patient_id);
                Ok(())
            })
            .await
    }

    async fn send_multiple_prescriptions(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        patient: &Patient,
        treatments: &[Treatment],
    ) -> ErxResult<Vec<FailedPrescription>> {
        let patient_id = patient.remote_patient_id.ok_or_else(|| {
            ErxError::InvalidInput("patient has not been mirrored remotely".into())
        })?;

        let sendable: Vec<&Treatment> = treatments
            .iter()
            .filter(|treatment| treatment.remote_prescription_id() != 0)
            .collect();

        let request = SendMultiplePrescriptionsRequest {
            sso: self.sso(clinician_id),
            patient_id,
            prescription_ids: sendable
                .iter()
                .map(|treatment| treatment.remote_prescription_id())
                .collect(),
        };
        let reply = self.transport.call(cx, &request).await?;

        let mut failed = Vec::new();
        for result in reply.results.iter().filter(|result| !result.status.is_ok()) {
            tracing::warn!(
                prescription_id = result.prescription_id,
                code = %result.status.code,
                "prescription not sent: {}",
                result.status.description
            );
            match sendable
                .iter()
                .find(|treatment| treatment.remote_prescription_id() == result.prescription_id)
            {
                Some(treatment) => failed.push(FailedPrescription {
                    treatment: (*treatment).clone(),
                    result_code: result.status.code.clone(),
                    description: result.status.description.clone(),
                }),
                None => tracing::warn!(
                    prescription_id = result.prescription_id,
                    "result for a prescription that was not sent"
                ),
            }
        }

        Ok(failed)
    }

    async fn prescription_status(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        prescription_id: i64,
    ) -> ErxResult<Vec<PrescriptionLog>> {
        let request = PrescriptionLogRequest {
            sso: self.sso(clinician_id),
            prescription_id,
        };
        let reply = self.transport.call(cx, &request).await?;

        let mut logs: Vec<PrescriptionLog> = reply.log.iter().map(mapping::log_from_wire).collect();
        sort_most_recent_first(&mut logs);
        Ok(logs)
    }

    async fn medication_list(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        remote_patient_id: i64,
        filter: &MedicationListFilter,
    ) -> ErxResult<Vec<Treatment>> {
        let request = MedicationListRequest {
            sso: self.sso(clinician_id),
            patient_id: remote_patient_id,
            sources: filter.sources.clone(),
            statuses: filter.statuses.clone(),
        };
        let reply = self.transport.call(cx, &request).await?;

        Ok(reply
            .medications
            .iter()
            .map(mapping::treatment_from_wire)
            .collect())
    }

    async fn transmission_error_details(
        &self,
        cx: &CallContext,
        clinician_id: i64,
    ) -> ErxResult<Vec<Treatment>> {
        let request = TransmissionErrorDetailsRequest {
            sso: self.sso(clinician_id),
        };
        self.transport
            .call_with(cx, &request, |reply| {
                decoded(
                    Operation::TransmissionErrorDetails,
                    reply
                        .errors
                        .iter()
                        .map(mapping::transmission_error_from_wire)
                        .collect(),
                )
            })
            .await
    }

    async fn transmission_error_refill_request_counts(
        &self,
        cx: &CallContext,
        clinician_id: i64,
    ) -> ErxResult<TransmissionCounts> {
        let sso = self.sso(clinician_id);
        let request = RefillTransmissionErrorCountsRequest {
            clinician_id: sso.user_id,
            sso,
        };
        let reply = self.transport.call(cx, &request).await?;
        Ok(mapping::counts_from_wire(&reply.counts))
    }

    async fn ignore_alert(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        prescription_id: i64,
    ) -> ErxResult<()> {
        let request = IgnoreAlertRequest {
            sso: self.sso(clinician_id),
            prescription_id,
        };
        self.transport.call(cx, &request).await?;
        Ok(())
    }

    async fn refill_request_queue(
        &self,
        cx: &CallContext,
        clinician_id: i64,
    ) -> ErxResult<Vec<RefillRequestItem>> {
        let request = RefillRequestQueueRequest {
            sso: self.sso(clinician_id),
        };
        self.transport
            .call_with(cx, &request, |reply| {
                decoded(
                    Operation::RefillRequestQueue,
                    reply
                        .items
                        .iter()
                        .map(mapping::refill_request_from_wire)
                        .collect(),
                )
            })
            .await
    }

    async fn patient_details(
        &self,
        cx: &CallContext,
        remote_patient_id: i64,
    ) -> ErxResult<Option<PatientDetails>> {
        let request = PatientDetailRequest {
            sso: self.sso(0),
            patient_id: remote_patient_id,
        };
        self.transport
            .call_with(cx, &request, |reply| {
                decoded(
                    Operation::PatientDetail,
                    mapping::patient_details_from_updates(&reply.patient_updates),
                )
            })
            .await
    }

    async fn approve_refill_request(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        rx_request_queue_item_id: i64,
        approved_refills: i64,
        comments: &str,
    ) -> ErxResult<i64> {
        let request = ApproveRefillRequest {
            sso: self.sso(clinician_id),
            rx_request_queue_item_id,
            refills: approved_refills,
            comments: comments.to_owned(),
        };
        Ok(self.transport.call(cx, &request).await?.prescription_id)
    }

    async fn deny_refill_request(
        &self,
        cx: &CallContext,
        clinician_id: i64,
        rx_request_queue_item_id: i64,
        denial_reason: &str,
        comments: &str,
    ) -> ErxResult<i64> {
        let request = DenyRefillRequest {
            sso: self.sso(clinician_id),
            rx_request_queue_item_id,
            denial_reason: denial_reason.to_owned(),
            comments: comments.to_owned(),
        };
        Ok(self.transport.call(cx, &request).await?.prescription_id)
    }
}
