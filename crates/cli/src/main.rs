mod fixtures;

use anyhow::Context;
use clap::{Parser, Subcommand};
use erx_core::{
    CallContext, ErxApi, ErxGateway, GatewayConfig, InMemoryRegistry, MedicationListFilter,
    PharmacySearch,
};
use erx_types::StateCode;
use erx_wire::SingleSignOn;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "erx")]
#[command(about = "E-prescribing gateway operator CLI")]
struct Cli {
    /// Abandon the call after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Print the collected request metrics after the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a single-sign-on credential
    Sso {
        /// Acting clinician (defaults to the configured user)
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Drug names for prescribing
    DrugSearch {
        prefix: String,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Drug names for self-reported medications
    PatientDrugSearch { prefix: String },
    /// Medications related to an allergy search term
    AllergySearch { term: String },
    /// Strengths available for a medication
    Strengths {
        medication: String,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Resolve a medication and strength to its catalogue identity
    Select {
        medication: String,
        strength: String,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Search pharmacies
    PharmacySearch {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        city: String,
        /// Two-letter state code
        #[arg(long)]
        state: Option<String>,
        #[arg(long, default_value = "")]
        zip: String,
        /// Pharmacy type, repeatable
        #[arg(long = "type")]
        types: Vec<String>,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Details of one pharmacy
    Pharmacy { pharmacy_id: i64 },
    /// Remote mirror of a patient
    Patient { patient_id: i64 },
    /// Status history of a prescription
    RxStatus {
        prescription_id: i64,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Medications on file for a patient
    Medications {
        patient_id: i64,
        /// Medication source filter, repeatable
        #[arg(long = "source")]
        sources: Vec<String>,
        /// Prescription status filter, repeatable
        #[arg(long = "status")]
        statuses: Vec<String>,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Prescriptions that failed to reach the pharmacy
    TransmissionErrors {
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Outstanding refill requests and transmission errors
    Counts {
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Refill requests awaiting a decision
    RefillQueue {
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Dismiss a transmission error alert
    IgnoreAlert {
        prescription_id: i64,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Approve a refill request
    ApproveRefill {
        queue_item_id: i64,
        refills: i64,
        #[arg(long, default_value = "")]
        comments: String,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Deny a refill request
    DenyRefill {
        queue_item_id: i64,
        reason: String,
        #[arg(long, default_value = "")]
        comments: String,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Mirror a patient and add treatments as unsent prescriptions
    StartPrescribing {
        /// Patient YAML file
        patient: PathBuf,
        /// Treatments YAML file
        treatments: PathBuf,
        #[arg(long, default_value_t = 0)]
        pharmacy: i64,
        /// Write assigned remote ids back into the fixture files
        #[arg(long)]
        save: bool,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Push a patient record to its remote mirror
    UpdatePatient {
        /// Patient YAML file
        patient: PathBuf,
        #[arg(long)]
        save: bool,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
    /// Send previously added prescriptions
    Send {
        /// Patient YAML file
        patient: PathBuf,
        /// Treatments YAML file
        treatments: PathBuf,
        #[arg(long, default_value_t = 0)]
        clinician: i64,
    },
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("erx=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = GatewayConfig::from_env().context("failed to load gateway configuration")?;

    let registry = InMemoryRegistry::new();
    let gateway = ErxGateway::new(config, Some(&registry))?;
    let cx = match cli.timeout {
        Some(seconds) => CallContext::with_timeout(Duration::from_secs(seconds)),
        None => CallContext::background(),
    };

    run(&gateway, &cx, cli.command).await?;

    if cli.metrics {
        print_json(&registry.snapshot())?;
    }
    Ok(())
}

async fn run(gateway: &ErxGateway, cx: &CallContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Sso { clinician } => {
            let config = gateway.config();
            let user_id = if clinician <= 0 {
                config.user_id()
            } else {
                clinician
            };
            let sso = SingleSignOn::generate(config.clinic_key(), user_id, config.clinic_id());
            println!("SingleSignOnClinicId: {}", sso.clinic_id);
            println!("SingleSignOnUserId: {}", sso.user_id);
            println!("SingleSignOnCode: {}", sso.code);
            println!("SingleSignOnUserIdVerify: {}", sso.user_id_verify);
        }
        Commands::DrugSearch { prefix, clinician } => {
            print_json(&gateway.drug_names_for_clinician(cx, clinician, &prefix).await?)?;
        }
        Commands::PatientDrugSearch { prefix } => {
            print_json(&gateway.drug_names_for_patient(cx, &prefix).await?)?;
        }
        Commands::AllergySearch { term } => {
            print_json(&gateway.search_allergy_related_medications(cx, &term).await?)?;
        }
        Commands::Strengths {
            medication,
            clinician,
        } => {
            print_json(
                &gateway
                    .search_medication_strength(cx, clinician, &medication)
                    .await?,
            )?;
        }
        Commands::Select {
            medication,
            strength,
            clinician,
        } => match gateway
            .select_medication(cx, clinician, &medication, &strength)
            .await?
        {
            Some(selected) => print_json(&selected)?,
            None => println!("No medication matched {medication} {strength}."),
        },
        Commands::PharmacySearch {
            name,
            city,
            state,
            zip,
            types,
            clinician,
        } => {
            let state = state
                .map(StateCode::parse)
                .transpose()
                .context("invalid --state")?;
            let search = PharmacySearch {
                name,
                city,
                state,
                zip_code: zip,
                pharmacy_types: types,
            };
            print_json(&gateway.search_pharmacies(cx, clinician, &search).await?)?;
        }
        Commands::Pharmacy { pharmacy_id } => {
            match gateway.pharmacy_details(cx, pharmacy_id).await? {
                Some(pharmacy) => print_json(&pharmacy)?,
                None => println!("No pharmacy found with id {pharmacy_id}."),
            }
        }
        Commands::Patient { patient_id } => match gateway.patient_details(cx, patient_id).await? {
            Some(details) => print_json(&details)?,
            None => println!("No patient found with id {patient_id}."),
        },
        Commands::RxStatus {
            prescription_id,
            clinician,
        } => {
            print_json(
                &gateway
                    .prescription_status(cx, clinician, prescription_id)
                    .await?,
            )?;
        }
        Commands::Medications {
            patient_id,
            sources,
            statuses,
            clinician,
        } => {
            let filter = MedicationListFilter { sources, statuses };
            print_json(
                &gateway
                    .medication_list(cx, clinician, patient_id, &filter)
                    .await?,
            )?;
        }
        Commands::TransmissionErrors { clinician } => {
            print_json(&gateway.transmission_error_details(cx, clinician).await?)?;
        }
        Commands::Counts { clinician } => {
            print_json(
                &gateway
                    .transmission_error_refill_request_counts(cx, clinician)
                    .await?,
            )?;
        }
        Commands::RefillQueue { clinician } => {
            print_json(&gateway.refill_request_queue(cx, clinician).await?)?;
        }
        Commands::IgnoreAlert {
            prescription_id,
            clinician,
        } => {
            gateway.ignore_alert(cx, clinician, prescription_id).await?;
            println!("Ignored alert for prescription {prescription_id}");
        }
        Commands::ApproveRefill {
            queue_item_id,
            refills,
            comments,
            clinician,
        } => {
            let prescription_id = gateway
                .approve_refill_request(cx, clinician, queue_item_id, refills, &comments)
                .await?;
            println!("Approved refill request {queue_item_id}: prescription {prescription_id}");
        }
        Commands::DenyRefill {
            queue_item_id,
            reason,
            comments,
            clinician,
        } => {
            let prescription_id = gateway
                .deny_refill_request(cx, clinician, queue_item_id, &reason, &comments)
                .await?;
            println!("Denied refill request {queue_item_id}: prescription {prescription_id}");
        }
        Commands::StartPrescribing {
            patient: patient_path,
            treatments: treatments_path,
            pharmacy,
            save,
            clinician,
        } => {
            let mut patient = fixtures::load_patient(&patient_path)?;
            let mut treatments = fixtures::load_treatments(&treatments_path)?;

            gateway
                .start_prescribing_patient(cx, clinician, &mut patient, &mut treatments, pharmacy)
                .await?;

            if let Some(id) = patient.remote_patient_id {
                println!("Patient mirrored with remote id {id}");
            }
            for treatment in &treatments {
                println!(
                    "{}: prescription {}",
                    treatment.drug_name,
                    treatment.remote_prescription_id()
                );
            }
            if save {
                fixtures::save_patient(&patient_path, &patient)?;
                fixtures::save_treatments(&treatments_path, &treatments)?;
            }
        }
        Commands::UpdatePatient {
            patient: patient_path,
            save,
            clinician,
        } => {
            let mut patient = fixtures::load_patient(&patient_path)?;
            gateway
                .update_patient_information(cx, clinician, &mut patient)
                .await?;
            if let Some(id) = patient.remote_patient_id {
                println!("Patient updated, remote id {id}");
            }
            if save {
                fixtures::save_patient(&patient_path, &patient)?;
            }
        }
        Commands::Send {
            patient,
            treatments,
            clinician,
        } => {
            let patient = fixtures::load_patient(&patient)?;
            let treatments = fixtures::load_treatments(&treatments)?;
            let failed = gateway
                .send_multiple_prescriptions(cx, clinician, &patient, &treatments)
                .await?;
            if failed.is_empty() {
                println!("All prescriptions sent.");
            } else {
                tracing::warn!(
                    "{} of {} prescriptions were not sent",
                    failed.len(),
                    treatments.len()
                );
                print_json(&failed)?;
            }
        }
    }
    Ok(())
}
