//! Prescription lifecycle operations: send, status log, transmission errors and alerts.

use crate::date::datetime_of;
use crate::operation::Operation;
use crate::shapes::{optional_medication, ResultStatus, WireMedication};
use crate::sso::SingleSignOn;
use crate::xml::Element;
use crate::{WireReply, WireRequest, WireResult};
use chrono::{DateTime, Utc};

use super::StatusReply;

#[derive(Clone, Debug)]
pub struct SendMultiplePrescriptionsRequest {
    pub sso: SingleSignOn,
    pub patient_id: i64,
    pub prescription_ids: Vec<i64>,
}

/// Per-prescription outcome of a batch send.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendPrescriptionResult {
    pub prescription_id: i64,
    pub status: ResultStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendMultiplePrescriptionsReply {
    pub status: ResultStatus,
    pub results: Vec<SendPrescriptionResult>,
}

impl WireRequest for SendMultiplePrescriptionsRequest {
    type Reply = SendMultiplePrescriptionsReply;
    const OPERATION: Operation = Operation::SendMultiplePrescriptions;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("PatientId", self.patient_id.to_string()),
            Element::list("PrescriptionIDs", "int", &self.prescription_ids),
        ]
    }
}

impl WireReply for SendMultiplePrescriptionsReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        let results = element
            .list_items("Prescriptions", "SendPrescriptionResult")
            .map(|item| -> WireResult<SendPrescriptionResult> {
                Ok(SendPrescriptionResult {
                    prescription_id: item.int_of("PrescriptionID")?,
                    status: ResultStatus::from_parent(item)?,
                })
            })
            .collect::<WireResult<_>>()?;

        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            results,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct PrescriptionLogRequest {
    pub sso: SingleSignOn,
    pub prescription_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrescriptionLogEntry {
    pub status: String,
    pub date_time_stamp: Option<DateTime<Utc>>,
    pub additional_info: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrescriptionLogReply {
    pub status: ResultStatus,
    pub log: Vec<PrescriptionLogEntry>,
}

impl WireRequest for PrescriptionLogRequest {
    type Reply = PrescriptionLogReply;
    const OPERATION: Operation = Operation::PrescriptionLogDetails;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("PrescriptionID", self.prescription_id.to_string()),
        ]
    }
}

impl WireReply for PrescriptionLogReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        let log = element
            .list_items("Log", "PrescriptionLogInfo")
            .map(|item| -> WireResult<PrescriptionLogEntry> {
                Ok(PrescriptionLogEntry {
                    status: item.text_of("Status").to_owned(),
                    date_time_stamp: datetime_of(item, "DateTimeStamp")?,
                    additional_info: item.text_of("AdditionalInfo").to_owned(),
                })
            })
            .collect::<WireResult<_>>()?;

        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            log,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct TransmissionErrorDetailsRequest {
    pub sso: SingleSignOn,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransmissionErrorDetail {
    pub medication: Option<WireMedication>,
    pub error_date_time_stamp: Option<DateTime<Utc>>,
    pub error_details: String,
    pub related_rx_request_queue_item_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransmissionErrorDetailsReply {
    pub status: ResultStatus,
    pub errors: Vec<TransmissionErrorDetail>,
}

impl WireRequest for TransmissionErrorDetailsRequest {
    type Reply = TransmissionErrorDetailsReply;
    const OPERATION: Operation = Operation::TransmissionErrorDetails;

    fn body(&self) -> Vec<Element> {
        vec![self.sso.to_element()]
    }
}

impl WireReply for TransmissionErrorDetailsReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        let errors = element
            .list_items("TransmissionErrors", "TransmissionErrorDetails")
            .map(|item| -> WireResult<TransmissionErrorDetail> {
                Ok(TransmissionErrorDetail {
                    medication: optional_medication(item, "Medication")?,
                    error_date_time_stamp: datetime_of(item, "ErrorDateTimeStamp")?,
                    error_details: item.text_of("ErrorDetails").to_owned(),
                    related_rx_request_queue_item_id: item
                        .int_of("RelatedRxRequestQueueItemID")?,
                })
            })
            .collect::<WireResult<_>>()?;

        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            errors,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct RefillTransmissionErrorCountsRequest {
    pub sso: SingleSignOn,
    pub clinician_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefillTransmissionErrorCount {
    pub clinician_id: i64,
    pub refill_requests_count: i64,
    pub transaction_errors_count: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefillTransmissionErrorCountsReply {
    pub status: ResultStatus,
    pub counts: Vec<RefillTransmissionErrorCount>,
}

impl WireRequest for RefillTransmissionErrorCountsRequest {
    type Reply = RefillTransmissionErrorCountsReply;
    const OPERATION: Operation = Operation::RefillRequestsTransmissionErrors;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("ClinicianId", self.clinician_id.to_string()),
        ]
    }
}

impl WireReply for RefillTransmissionErrorCountsReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        let counts = element
            .list_items(
                "RefillRequestsTransmissionErrors",
                "RefillRequestsTransmissionError",
            )
            .map(|item| -> WireResult<RefillTransmissionErrorCount> {
                Ok(RefillTransmissionErrorCount {
                    clinician_id: item.int_of("ClinicianId")?,
                    refill_requests_count: item.int_of("RefillRequestsCount")?,
                    transaction_errors_count: item.int_of("TransactionErrorsCount")?,
                })
            })
            .collect::<WireResult<_>>()?;

        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            counts,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct IgnoreAlertRequest {
    pub sso: SingleSignOn,
    pub prescription_id: i64,
}

impl WireRequest for IgnoreAlertRequest {
    type Reply = StatusReply;
    const OPERATION: Operation = Operation::IgnoreAlert;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("PrescriptionId", self.prescription_id.to_string()),
        ]
    }
}
