//! YAML fixtures for patient and treatment inputs.
//!
//! Fixtures are parsed through `serde_path_to_error` so a schema mismatch names the failing
//! field, e.g. `treatments[1].dispense_value`.

use anyhow::{anyhow, Context};
use erx_core::{Patient, Treatment};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Treatments file layout: a top-level `treatments` list.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TreatmentsFixture {
    pub treatments: Vec<Treatment>,
}

/// Parse `yaml_text` as `T`, naming the failing field path on mismatch.
pub fn parse_yaml<T: DeserializeOwned>(what: &str, yaml_text: &str) -> anyhow::Result<T> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_owned()
        } else {
            path
        };
        anyhow!("{what} schema mismatch at {path}: {}", err.into_inner())
    })
}

pub fn load_patient(path: &Path) -> anyhow::Result<Patient> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read patient file {}", path.display()))?;
    parse_yaml("patient", &text)
}

pub fn load_treatments(path: &Path) -> anyhow::Result<Vec<Treatment>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read treatments file {}", path.display()))?;
    let fixture: TreatmentsFixture = parse_yaml("treatments", &text)?;
    Ok(fixture.treatments)
}

/// Write `patient` back to `path`, carrying any remote id the call assigned.
pub fn save_patient(path: &Path, patient: &Patient) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(patient)?;
    fs::write(path, yaml)
        .with_context(|| format!("failed to write patient file {}", path.display()))
}

pub fn save_treatments(path: &Path, treatments: &[Treatment]) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(&TreatmentsFixture {
        treatments: treatments.to_vec(),
    })?;
    fs::write(path, yaml)
        .with_context(|| format!("failed to write treatments file {}", path.display()))
}
