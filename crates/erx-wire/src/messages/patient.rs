//! Patient operations: start prescribing (also used to push demographic updates) and patient
//! detail lookup.

use crate::operation::Operation;
use crate::shapes::{PatientUpdate, ResultStatus, WireMedication, WirePatient};
use crate::sso::SingleSignOn;
use crate::xml::Element;
use crate::{WireReply, WireRequest, WireResult};

/// A pharmacy to attach to the patient's favourites.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FavoritePharmacy {
    pub pharmacy_id: i64,
    pub is_primary: bool,
}

#[derive(Clone, Debug)]
pub struct StartPrescribingRequest {
    pub sso: SingleSignOn,
    pub patient: WirePatient,
    pub favorite_pharmacies: Vec<FavoritePharmacy>,
    pub prescriptions: Vec<WireMedication>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StartPrescribingReply {
    pub status: ResultStatus,
    pub patient_updates: Vec<PatientUpdate>,
}

impl WireRequest for StartPrescribingRequest {
    type Reply = StartPrescribingReply;
    const OPERATION: Operation = Operation::StartPrescribing;

    fn body(&self) -> Vec<Element> {
        let mut body = vec![self.sso.to_element(), self.patient.to_element()];

        if !self.favorite_pharmacies.is_empty() {
            body.push(
                Element::new("AddFavoritePharmacies").with_children(
                    self.favorite_pharmacies.iter().map(|favorite| {
                        Element::new("AddPatientPharmacy")
                            .with_child(Element::leaf(
                                "PharmacyId",
                                favorite.pharmacy_id.to_string(),
                            ))
                            .with_child(Element::leaf(
                                "IsPrimary",
                                favorite.is_primary.to_string(),
                            ))
                    }),
                ),
            );
        }

        if !self.prescriptions.is_empty() {
            body.push(
                Element::new("AddPrescriptions").with_children(
                    self.prescriptions
                        .iter()
                        .map(|medication| Element::new("Prescription").with_child(medication.to_element())),
                ),
            );
        }

        body
    }
}

impl WireReply for StartPrescribingReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            patient_updates: PatientUpdate::list_from(element)?,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct PatientDetailRequest {
    pub sso: SingleSignOn,
    pub patient_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientDetailReply {
    pub status: ResultStatus,
    pub patient_updates: Vec<PatientUpdate>,
}

impl WireRequest for PatientDetailRequest {
    type Reply = PatientDetailReply;
    const OPERATION: Operation = Operation::PatientDetail;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("PatientId", self.patient_id.to_string()),
        ]
    }
}

impl WireReply for PatientDetailReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            patient_updates: PatientUpdate::list_from(element)?,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}
