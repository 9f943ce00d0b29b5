//! Refill request queue and its approve/deny decisions.

use crate::date::datetime_of;
use crate::operation::Operation;
use crate::shapes::{optional_medication, ResultStatus, WireClinician, WireMedication};
use crate::sso::SingleSignOn;
use crate::xml::Element;
use crate::{WireReply, WireRequest, WireResult};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug)]
pub struct RefillRequestQueueRequest {
    pub sso: SingleSignOn,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefillRequestQueueItem {
    pub rx_request_queue_item_id: i64,
    pub reference_number: String,
    pub pharmacy_rx_reference_number: String,
    pub requested_drug_description: String,
    pub requested_refill_amount: String,
    pub requested_dispense: String,
    pub patient_id: i64,
    pub patient_added_for_request: bool,
    pub request_date_stamp: Option<DateTime<Utc>>,
    pub clinician: Option<WireClinician>,
    pub requested_prescription: Option<WireMedication>,
    pub dispensed_prescription: Option<WireMedication>,
}

impl RefillRequestQueueItem {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            rx_request_queue_item_id: element.int_of("RxRequestQueueItemID")?,
            reference_number: element.text_of("ReferenceNumber").to_owned(),
            pharmacy_rx_reference_number: element.text_of("PharmacyRxReferenceNumber").to_owned(),
            requested_drug_description: element.text_of("RequestedDrugDescription").to_owned(),
            requested_refill_amount: element.text_of("RequestedRefillAmount").trim().to_owned(),
            requested_dispense: element.text_of("RequestedDispense").trim().to_owned(),
            patient_id: element.int_of("PatientID")?,
            patient_added_for_request: element.bool_of("PatientAddedForRequest")?,
            request_date_stamp: datetime_of(element, "CreatedDateStamp")?,
            clinician: element
                .child("Clinician")
                .filter(|clinician| !clinician.is_nil())
                .map(WireClinician::from_element)
                .transpose()?,
            requested_prescription: optional_medication(element, "RequestedPrescription")?,
            dispensed_prescription: optional_medication(element, "DispensedPrescription")?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefillRequestQueueReply {
    pub status: ResultStatus,
    pub items: Vec<RefillRequestQueueItem>,
}

impl WireRequest for RefillRequestQueueRequest {
    type Reply = RefillRequestQueueReply;
    const OPERATION: Operation = Operation::RefillRequestQueue;

    fn body(&self) -> Vec<Element> {
        vec![self.sso.to_element()]
    }
}

impl WireReply for RefillRequestQueueReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            items: element
                .list_items("List", "RxRequestQueueItem")
                .map(RefillRequestQueueItem::from_element)
                .collect::<WireResult<_>>()?,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

/// Reply to an approve or deny decision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefillDecisionReply {
    pub status: ResultStatus,
    pub patient_id: i64,
    pub prescription_id: i64,
}

impl WireReply for RefillDecisionReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            patient_id: element.int_of("PatientID")?,
            prescription_id: element.int_of("PrescriptionId")?,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct ApproveRefillRequest {
    pub sso: SingleSignOn,
    pub rx_request_queue_item_id: i64,
    pub refills: i64,
    pub comments: String,
}

impl WireRequest for ApproveRefillRequest {
    type Reply = RefillDecisionReply;
    const OPERATION: Operation = Operation::ApproveRefill;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("RxRequestQueueItemID", self.rx_request_queue_item_id.to_string()),
            Element::leaf("Refills", self.refills.to_string()),
            Element::leaf("Note", self.comments.as_str()),
        ]
    }
}

#[derive(Clone, Debug)]
pub struct DenyRefillRequest {
    pub sso: SingleSignOn,
    pub rx_request_queue_item_id: i64,
    pub denial_reason: String,
    pub comments: String,
}

impl WireRequest for DenyRefillRequest {
    type Reply = RefillDecisionReply;
    const OPERATION: Operation = Operation::DenyRefill;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("RxRequestQueueItemID", self.rx_request_queue_item_id.to_string()),
            Element::leaf("DenialReason", self.denial_reason.as_str()),
            Element::leaf("Note", self.comments.as_str()),
        ]
    }
}
