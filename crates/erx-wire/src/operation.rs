//! The catalogue of remote operations.
//!
//! Each operation owns a tag. The tag names the request element, suffixes the SOAP action, and
//! keys telemetry. Patient update reuses the start-prescribing operation, so there are fewer
//! tags than gateway methods.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    MedicationQuickSearch,
    SelfReportedMedicationSearch,
    AllergySearch,
    MedicationStrengthSearch,
    MedicationSelect,
    StartPrescribing,
    SendMultiplePrescriptions,
    PharmacySearch,
    PrescriptionLogDetails,
    MedicationList,
    TransmissionErrorDetails,
    RefillRequestsTransmissionErrors,
    IgnoreAlert,
    RefillRequestQueue,
    PatientDetail,
    PharmacyDetails,
    ApproveRefill,
    DenyRefill,
}

impl Operation {
    pub const ALL: [Operation; 18] = [
        Operation::MedicationQuickSearch,
        Operation::SelfReportedMedicationSearch,
        Operation::AllergySearch,
        Operation::MedicationStrengthSearch,
        Operation::MedicationSelect,
        Operation::StartPrescribing,
        Operation::SendMultiplePrescriptions,
        Operation::PharmacySearch,
        Operation::PrescriptionLogDetails,
        Operation::MedicationList,
        Operation::TransmissionErrorDetails,
        Operation::RefillRequestsTransmissionErrors,
        Operation::IgnoreAlert,
        Operation::RefillRequestQueue,
        Operation::PatientDetail,
        Operation::PharmacyDetails,
        Operation::ApproveRefill,
        Operation::DenyRefill,
    ];

    pub const fn tag(self) -> &'static str {
        match self {
            Operation::MedicationQuickSearch => "MedicationQuickSearchMessage",
            Operation::SelfReportedMedicationSearch => "SelfReportedMedicationSearch",
            Operation::AllergySearch => "AllergySearch",
            Operation::MedicationStrengthSearch => "MedicationStrengthSearchMessage",
            Operation::MedicationSelect => "MedicationSelectMessage",
            Operation::StartPrescribing => "PatientStartPrescribingMessage",
            Operation::SendMultiplePrescriptions => "SendMultiplePrescriptions",
            Operation::PharmacySearch => "PharmacySearchMessageDetailed",
            Operation::PrescriptionLogDetails => "GetPrescriptionLogDetails",
            Operation::MedicationList => "GetMedicationList",
            Operation::TransmissionErrorDetails => "GetTransmissionErrorsDetails",
            Operation::RefillRequestsTransmissionErrors => "GetRefillRequestsTransmissionErrors",
            Operation::IgnoreAlert => "IgnoreAlert",
            Operation::RefillRequestQueue => "GetMedicationRefillRequestQueueForClinic",
            Operation::PatientDetail => "GetPatientDetail",
            Operation::PharmacyDetails => "PharmacyValidateMessage",
            Operation::ApproveRefill => "ApproveRefill",
            Operation::DenyRefill => "DenyRefill",
        }
    }

    /// The SOAP action header value for this operation.
    pub fn soap_action(self, api_endpoint: &str) -> String {
        format!("{api_endpoint}{}", self.tag())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
