//! Pharmacy directory operations.

use crate::operation::Operation;
use crate::shapes::{ResultStatus, WirePharmacy};
use crate::sso::SingleSignOn;
use crate::xml::Element;
use crate::{WireReply, WireRequest, WireResult};

#[derive(Clone, Debug)]
pub struct PharmacySearchRequest {
    pub sso: SingleSignOn,
    pub name: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub specialties: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PharmacySearchReply {
    pub status: ResultStatus,
    pub pharmacies: Vec<WirePharmacy>,
}

impl WireRequest for PharmacySearchRequest {
    type Reply = PharmacySearchReply;
    const OPERATION: Operation = Operation::PharmacySearch;

    fn body(&self) -> Vec<Element> {
        let mut body = vec![self.sso.to_element()];
        for (name, value) in [
            ("PharmacyNameSearch", &self.name),
            ("PharmacyCity", &self.city),
            ("PharmacyStateTwoLetters", &self.state),
            ("PharmacyZipCode", &self.zip_code),
        ] {
            if !value.is_empty() {
                body.push(Element::leaf(name, value.as_str()));
            }
        }
        if !self.specialties.is_empty() {
            body.push(Element::list(
                "PharmacySpecialties",
                "PharmacySpecialtyTypes",
                &self.specialties,
            ));
        }
        body
    }
}

impl WireReply for PharmacySearchReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            pharmacies: element
                .list_items("Pharmacies", "PharmacyDetailed")
                .map(WirePharmacy::from_element)
                .collect::<WireResult<_>>()?,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct PharmacyDetailsRequest {
    pub sso: SingleSignOn,
    pub pharmacy_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PharmacyDetailsReply {
    pub status: ResultStatus,
    pub pharmacy: Option<WirePharmacy>,
}

impl WireRequest for PharmacyDetailsRequest {
    type Reply = PharmacyDetailsReply;
    const OPERATION: Operation = Operation::PharmacyDetails;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("PharmacyId", self.pharmacy_id.to_string()),
        ]
    }
}

impl WireReply for PharmacyDetailsReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            pharmacy: element
                .child("Pharmacy")
                .filter(|pharmacy| !pharmacy.is_nil())
                .map(WirePharmacy::from_element)
                .transpose()?,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erx_types::ClinicKey;

    #[test]
    fn search_omits_blank_criteria() {
        let request = PharmacySearchRequest {
            sso: SingleSignOn::from_phrase("p", &ClinicKey::new("K").unwrap(), 1, 1),
            name: "Walgreens".into(),
            city: String::new(),
            state: "WA".into(),
            zip_code: String::new(),
            specialties: vec!["Retail".into()],
        };
        let names: Vec<String> = request.body().into_iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec![
                "SingleSignOn",
                "PharmacyNameSearch",
                "PharmacyStateTwoLetters",
                "PharmacySpecialties"
            ]
        );
    }

    #[test]
    fn search_reply_reads_detailed_pharmacies() {
        let element = Element::parse(
            "<PharmacySearchMessageDetailedResult><Result><ResultCode>OK</ResultCode></Result>\
             <Pharmacies><PharmacyDetailed><PharmacyId>47</PharmacyId><StoreName>Corner Rx</StoreName>\
             <PharmacySpecialties>Retail, TwentyFourHourPharmacy</PharmacySpecialties></PharmacyDetailed>\
             </Pharmacies></PharmacySearchMessageDetailedResult>",
        )
        .unwrap();
        let reply = PharmacySearchReply::from_element(&element).unwrap();
        assert_eq!(reply.pharmacies.len(), 1);
        assert_eq!(reply.pharmacies[0].store_name, "Corner Rx");
    }
}
