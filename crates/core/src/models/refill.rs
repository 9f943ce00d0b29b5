use super::treatment::Treatment;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A pharmacy's request to refill a prescription, awaiting a clinician decision.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RefillRequestItem {
    pub rx_request_queue_item_id: i64,
    pub reference_number: String,
    pub pharmacy_rx_reference_number: String,
    pub requested_drug_description: String,
    /// As sent by the remote: a count or `PRN`.
    pub requested_refill_amount: String,
    pub requested_dispense: String,
    pub remote_patient_id: i64,
    pub patient_added_for_request: bool,
    pub request_date_stamp: Option<DateTime<Utc>>,
    pub clinician_id: i64,
    pub requested_prescription: Option<Treatment>,
    pub dispensed_prescription: Option<Treatment>,
}

/// Outstanding refill requests and transmission errors for a clinician.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransmissionCounts {
    pub refill_requests: i64,
    pub transmission_errors: i64,
}
