//! Domain models the gateway reads and mutates on behalf of its callers.
//!
//! The gateway owns none of these. Relationships are held as remote ids rather than nested
//! records: a patient names its preferred pharmacy by id, a treatment names its pharmacy and
//! clinician by id.

pub mod patient;
pub mod pharmacy;
pub mod prescription_log;
pub mod refill;
pub mod treatment;

pub use patient::{Address, Patient, PatientDetails, PhoneNumber};
pub use pharmacy::{PharmacyData, PharmacySearch};
pub use prescription_log::PrescriptionLog;
pub use refill::{RefillRequestItem, TransmissionCounts};
pub use treatment::{
    DrugDbIds, DrugDbKey, ErxData, FailedPrescription, MedicationListFilter, SelectedMedication,
    Treatment,
};
