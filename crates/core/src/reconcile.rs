//! Reconciliation between local records and their remote mirrors.
//!
//! A start-prescribing reply is only trusted once the patient it returns matches the local
//! record field by field. Only then are remote ids written back: first the patient id, then a
//! prescription id for every treatment whose drug identity appears among the returned
//! medications.

use crate::models::{DrugDbKey, Patient, Treatment};
use crate::{ErxError, ErxResult};
use erx_wire::shapes::{PatientUpdate, WireMedication, WirePatient};

/// Check the single returned mirror against `local` and return it.
///
/// Names and contact details compare exactly; gender and state ignore case; the birth date
/// compares by calendar day. The mirror must carry a positive id, and the local remote id,
/// once set, must match it.
pub fn ensure_consistent<'a>(
    local: &Patient,
    updates: &'a [PatientUpdate],
) -> ErxResult<&'a WirePatient> {
    let [update] = updates else {
        return Err(ErxError::divergence("patient_count"));
    };
    let remote = update
        .patient
        .as_ref()
        .ok_or_else(|| ErxError::divergence("patient_count"))?;

    if remote.patient_id <= 0 {
        return Err(ErxError::divergence("patient_id"));
    }
    if let Some(id) = local.remote_patient_id {
        if id != remote.patient_id {
            return Err(ErxError::divergence("patient_id"));
        }
    }

    let address = local.address.as_ref();
    let primary_phone = local.phone_numbers.first();

    let exact: [(&str, &str, &str); 5] = [
        ("first_name", local.first_name.as_str(), remote.first_name.as_str()),
        ("last_name", &local.last_name, &remote.last_name),
        ("middle_name", &local.middle_name, &remote.middle_name),
        ("suffix", &local.suffix, &remote.suffix),
        ("prefix", &local.prefix, &remote.prefix),
    ];
    check_exact(&exact)?;

    if remote.date_of_birth.map(|dob| dob.date_naive()) != Some(local.date_of_birth) {
        return Err(ErxError::divergence("date_of_birth"));
    }
    if !local.gender.eq_ignore_ascii_case(&remote.gender) {
        return Err(ErxError::divergence("gender"));
    }

    let contact: [(&str, &str, &str); 4] = [
        ("email", local.email.as_str(), remote.email.as_str()),
        (
            "address_line1",
            address.map_or("", |a| a.line1.as_str()),
            &remote.address1,
        ),
        (
            "address_line2",
            address.map_or("", |a| a.line2.as_str()),
            &remote.address2,
        ),
        ("city", address.map_or("", |a| a.city.as_str()), &remote.city),
    ];
    check_exact(&contact)?;

    if !address
        .map_or("", |a| a.state.as_str())
        .eq_ignore_ascii_case(&remote.state)
    {
        return Err(ErxError::divergence("state"));
    }

    let rest: [(&str, &str, &str); 3] = [
        (
            "zip_code",
            address.map_or("", |a| a.zip_code.as_str()),
            remote.zip_code.as_str(),
        ),
        (
            "primary_phone",
            primary_phone.map_or("", |p| p.number.as_str()),
            &remote.primary_phone,
        ),
        (
            "primary_phone_type",
            primary_phone.map_or("", |p| p.phone_type.as_str()),
            &remote.primary_phone_type,
        ),
    ];
    check_exact(&rest)?;

    Ok(remote)
}

fn check_exact(fields: &[(&str, &str, &str)]) -> ErxResult<()> {
    match fields.iter().find(|(_, local, remote)| local != remote) {
        Some((field, _, _)) => Err(ErxError::divergence(field)),
        None => Ok(()),
    }
}

/// Write the prescription id of every matching medication onto its treatment.
///
/// Returns how many treatments were matched. Treatments without a match are left unsent.
pub fn assign_prescription_ids<'a>(
    treatments: &mut [Treatment],
    medications: impl IntoIterator<Item = &'a WireMedication>,
) -> usize {
    let mut matched = vec![false; treatments.len()];

    for medication in medications {
        if medication.prescription_id == 0 {
            continue;
        }
        for (treatment, matched) in treatments.iter_mut().zip(matched.iter_mut()) {
            if same_drug(treatment, medication) {
                treatment.set_remote_prescription_id(medication.prescription_id);
                *matched = true;
            }
        }
    }

    matched.into_iter().filter(|m| *m).count()
}

fn same_drug(treatment: &Treatment, medication: &WireMedication) -> bool {
    let ids = &treatment.drug_db_ids;
    drug_id_eq(ids.get(DrugDbKey::LexiDrugSynId), &medication.lexi_drug_syn_id)
        && drug_id_eq(ids.get(DrugDbKey::LexiGenProductId), &medication.lexi_gen_product_id)
        && drug_id_eq(
            ids.get(DrugDbKey::LexiSynonymTypeId),
            &medication.lexi_synonym_type_id,
        )
}

/// Catalogue ids are equal when they name the same number, or failing that, the same text.
///
/// The remote zero-pads some ids in replies, so `"00123"` and `"123"` are the same id.
pub fn drug_id_eq(local: &str, remote: &str) -> bool {
    let (local, remote) = (local.trim(), remote.trim());
    match (local.parse::<i64>(), remote.parse::<i64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => local == remote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::patient_to_wire;
    use crate::models::{Address, DrugDbIds, PhoneNumber};
    use chrono::NaiveDate;

    fn local() -> Patient {
        Patient {
            remote_patient_id: None,
            prefix: String::new(),
            first_name: "Ann".into(),
            middle_name: String::new(),
            last_name: "Smith".into(),
            suffix: String::new(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 4, 2).unwrap(),
            gender: "Female".into(),
            email: "ann@example.com".into(),
            address: Some(Address {
                line1: "1 Main St".into(),
                line2: String::new(),
                city: "Springfield".into(),
                state: "CA".into(),
                zip_code: "94105".into(),
            }),
            phone_numbers: vec![PhoneNumber {
                number: "2065551234".into(),
                phone_type: "Cell".into(),
            }],
            preferred_pharmacy_id: None,
        }
    }

    fn mirror(edit: impl FnOnce(&mut WirePatient)) -> Vec<PatientUpdate> {
        let mut patient = patient_to_wire(&local());
        patient.patient_id = 88;
        edit(&mut patient);
        vec![PatientUpdate {
            patient: Some(patient),
            ..PatientUpdate::default()
        }]
    }

    fn divergent_field(result: ErxResult<&WirePatient>) -> String {
        match result {
            Err(ErxError::MirrorDivergence { field }) => field,
            other => panic!("expected divergence, got {other:?}"),
        }
    }

    #[test]
    fn identical_mirror_passes() {
        let updates = mirror(|_| {});
        assert_eq!(ensure_consistent(&local(), &updates).unwrap().patient_id, 88);
    }

    #[test]
    fn first_name_difference_is_named() {
        let updates = mirror(|p| p.first_name = "Anne".into());
        assert_eq!(divergent_field(ensure_consistent(&local(), &updates)), "first_name");
    }

    #[test]
    fn gender_and_state_ignore_case() {
        let updates = mirror(|p| {
            p.gender = "FEMALE".into();
            p.state = "ca".into();
        });
        assert!(ensure_consistent(&local(), &updates).is_ok());
    }

    #[test]
    fn birth_date_compares_by_day_only() {
        let updates = mirror(|p| {
            p.date_of_birth = p.date_of_birth.map(|dob| dob + chrono::Duration::hours(13));
        });
        assert!(ensure_consistent(&local(), &updates).is_ok());

        let updates = mirror(|p| {
            p.date_of_birth = p.date_of_birth.map(|dob| dob + chrono::Duration::days(1));
        });
        assert_eq!(
            divergent_field(ensure_consistent(&local(), &updates)),
            "date_of_birth"
        );
    }

    #[test]
    fn contact_fields_compare_exactly() {
        let updates = mirror(|p| p.zip_code = "94106".into());
        assert_eq!(divergent_field(ensure_consistent(&local(), &updates)), "zip_code");

        let updates = mirror(|p| p.primary_phone_type = "Home".into());
        assert_eq!(
            divergent_field(ensure_consistent(&local(), &updates)),
            "primary_phone_type"
        );
    }

    #[test]
    fn exactly_one_patient_is_required() {
        let mut updates = mirror(|_| {});
        updates.push(updates[0].clone());
        assert_eq!(
            divergent_field(ensure_consistent(&local(), &updates)),
            "patient_count"
        );
        assert_eq!(divergent_field(ensure_consistent(&local(), &[])), "patient_count");
    }

    #[test]
    fn known_remote_id_must_not_change() {
        let mut patient = local();
        patient.remote_patient_id = Some(12);
        let updates = mirror(|_| {});
        assert_eq!(divergent_field(ensure_consistent(&patient, &updates)), "patient_id");
    }

    #[test]
    fn mirror_must_carry_an_id() {
        let updates = mirror(|p| p.patient_id = 0);
        assert_eq!(divergent_field(ensure_consistent(&local(), &updates)), "patient_id");
    }

    fn treatment(syn: &str, product: &str, synonym_type: &str) -> Treatment {
        let mut treatment = Treatment::new("drug");
        treatment.drug_db_ids = DrugDbIds::new()
            .with(DrugDbKey::LexiDrugSynId, syn)
            .with(DrugDbKey::LexiGenProductId, product)
            .with(DrugDbKey::LexiSynonymTypeId, synonym_type);
        treatment
    }

    fn medication(id: i64, syn: &str, product: &str, synonym_type: &str) -> WireMedication {
        WireMedication {
            prescription_id: id,
            lexi_drug_syn_id: syn.into(),
            lexi_gen_product_id: product.into(),
            lexi_synonym_type_id: synonym_type.into(),
            ..WireMedication::default()
        }
    }

    #[test]
    fn matching_triples_receive_prescription_ids() {
        let mut treatments = vec![
            treatment("19421", "123", "59"),
            treatment("555", "1", "2"),
            treatment("777", "3", "4"),
        ];
        let medications = vec![
            medication(5504, "19421", "00123", "59"),
            medication(5505, "777", "3", "4"),
            medication(5506, "999", "9", "9"),
        ];

        let matched = assign_prescription_ids(&mut treatments, &medications);

        assert_eq!(matched, 2);
        assert_eq!(treatments[0].remote_prescription_id(), 5504);
        assert_eq!(treatments[1].remote_prescription_id(), 0);
        assert!(treatments[1].erx.is_none());
        assert_eq!(treatments[2].remote_prescription_id(), 5505);
    }

    #[test]
    fn ids_compare_numerically_then_textually() {
        assert!(drug_id_eq("00123", "123"));
        assert!(drug_id_eq(" 59", "59"));
        assert!(drug_id_eq("d04373", "d04373"));
        assert!(!drug_id_eq("d04373", "d04374"));
        assert!(!drug_id_eq("", "0"));
    }
}
