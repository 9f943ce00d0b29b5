//! Drug catalogue operations: name searches, strengths, selection and the patient's medication
//! list.

use crate::operation::Operation;
use crate::shapes::{ResultStatus, WireMedication};
use crate::sso::SingleSignOn;
use crate::xml::Element;
use crate::{WireReply, WireRequest, WireResult};

#[derive(Clone, Debug)]
pub struct MedicationQuickSearchRequest {
    pub sso: SingleSignOn,
    pub search_string: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MedicationQuickSearchReply {
    pub status: ResultStatus,
    pub display_names: Vec<String>,
}

impl WireRequest for MedicationQuickSearchRequest {
    type Reply = MedicationQuickSearchReply;
    const OPERATION: Operation = Operation::MedicationQuickSearch;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("SearchString", self.search_string.as_str()),
        ]
    }
}

impl WireReply for MedicationQuickSearchReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            display_names: element.strings_in("DisplayNames", "string"),
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct SelfReportedMedicationSearchRequest {
    pub sso: SingleSignOn,
    pub search_term: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelfReportedMedicationSearchReply {
    pub status: ResultStatus,
    pub display_names: Vec<String>,
}

impl WireRequest for SelfReportedMedicationSearchRequest {
    type Reply = SelfReportedMedicationSearchReply;
    const OPERATION: Operation = Operation::SelfReportedMedicationSearch;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("SearchTerm", self.search_term.as_str()),
        ]
    }
}

impl WireReply for SelfReportedMedicationSearchReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            display_names: element
                .list_items("SearchResults", "SelfReportedMedicationSearchResult")
                .map(|item| item.text_of("DisplayName").to_owned())
                .collect(),
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct AllergySearchRequest {
    pub sso: SingleSignOn,
    pub search_term: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllergySearchReply {
    pub status: ResultStatus,
    pub names: Vec<String>,
}

impl WireRequest for AllergySearchRequest {
    type Reply = AllergySearchReply;
    const OPERATION: Operation = Operation::AllergySearch;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("SearchTerm", self.search_term.as_str()),
        ]
    }
}

impl WireReply for AllergySearchReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            names: element
                .list_items("SearchResults", "AllergySearchResult")
                .map(|item| item.text_of("Name").to_owned())
                .collect(),
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct MedicationStrengthSearchRequest {
    pub sso: SingleSignOn,
    pub medication_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MedicationStrengthSearchReply {
    pub status: ResultStatus,
    pub display_strengths: Vec<String>,
}

impl WireRequest for MedicationStrengthSearchRequest {
    type Reply = MedicationStrengthSearchReply;
    const OPERATION: Operation = Operation::MedicationStrengthSearch;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("SearchString", self.medication_name.as_str()),
        ]
    }
}

impl WireReply for MedicationStrengthSearchReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            display_strengths: element.strings_in("DisplayStrength", "string"),
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct MedicationSelectRequest {
    pub sso: SingleSignOn,
    pub medication_name: String,
    pub medication_strength: String,
}

/// The remote's description of one (drug, strength) selection.
///
/// A reply whose three catalogue identifiers are all empty or zero means nothing matched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MedicationSelectReply {
    pub status: ResultStatus,
    pub dose_form_description: String,
    pub route_description: String,
    pub strength_description: String,
    pub dispense_unit_id: i64,
    pub dispense_unit_description: String,
    pub generic_product_name: String,
    pub lexi_gen_product_id: String,
    pub lexi_drug_syn_id: String,
    pub lexi_synonym_type_id: String,
    pub matched_drug_name: String,
    pub rxcui: String,
    pub term_type: String,
    pub otc: bool,
    pub representative_ndc: String,
    pub schedule: String,
}

impl MedicationSelectReply {
    /// True when the remote found no drug for the requested name and strength.
    pub fn is_miss(&self) -> bool {
        [
            &self.lexi_gen_product_id,
            &self.lexi_drug_syn_id,
            &self.lexi_synonym_type_id,
        ]
        .iter()
        .all(|id| id.is_empty() || id.parse::<i64>() == Ok(0))
    }
}

impl WireRequest for MedicationSelectRequest {
    type Reply = MedicationSelectReply;
    const OPERATION: Operation = Operation::MedicationSelect;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("MedicationWithDoseFormRoute", self.medication_name.as_str()),
            Element::leaf("MedicationStrength", self.medication_strength.as_str()),
        ]
    }
}

impl WireReply for MedicationSelectReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            dose_form_description: element.text_of("DoseFormDescription").to_owned(),
            route_description: element.text_of("RouteDescription").to_owned(),
            strength_description: element.text_of("StrengthDescription").to_owned(),
            dispense_unit_id: element.int_of("DispenseUnitId")?,
            dispense_unit_description: element.text_of("DispenseUnitDescription").to_owned(),
            generic_product_name: element.text_of("GenericProductName").to_owned(),
            lexi_gen_product_id: element.text_of("LexiGenProductId").trim().to_owned(),
            lexi_drug_syn_id: element.text_of("LexiDrugSynId").trim().to_owned(),
            lexi_synonym_type_id: element.text_of("LexiSynonymTypeId").trim().to_owned(),
            matched_drug_name: element.text_of("MatchedDrugName").to_owned(),
            rxcui: element.text_of("RXCUI").to_owned(),
            term_type: element.text_of("TermType").to_owned(),
            otc: element.bool_of("OTC")?,
            representative_ndc: element.text_of("RepresentativeNDC").trim().to_owned(),
            schedule: element.text_of("Schedule").to_owned(),
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}

#[derive(Clone, Debug)]
pub struct MedicationListRequest {
    pub sso: SingleSignOn,
    pub patient_id: i64,
    pub sources: Vec<String>,
    pub statuses: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MedicationListReply {
    pub status: ResultStatus,
    pub medications: Vec<WireMedication>,
}

impl WireRequest for MedicationListRequest {
    type Reply = MedicationListReply;
    const OPERATION: Operation = Operation::MedicationList;

    fn body(&self) -> Vec<Element> {
        vec![
            self.sso.to_element(),
            Element::leaf("PatientId", self.patient_id.to_string()),
            Element::list("Sources", "MedicationSourceType", &self.sources),
            Element::list("Status", "MedicationStatusType", &self.statuses),
        ]
    }
}

impl WireReply for MedicationListReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
            medications: element
                .list_items("Medications", "MedicationListItem")
                .map(WireMedication::from_element)
                .collect::<WireResult<_>>()?,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}
