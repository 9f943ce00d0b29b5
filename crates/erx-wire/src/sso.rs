//! Single-sign-on credentials.
//!
//! Every request carries a freshly minted credential block derived from the clinic's shared
//! key. The key itself never leaves this module: only SHA-512 digests of it are placed on the
//! wire.
//!
//! Derivation:
//! - `code` is the random phrase followed by base64(SHA-512(phrase ‖ key)), with a trailing
//!   `==` removed.
//! - `user_id_verify` is base64(SHA-512(decimal user id ‖ first 22 phrase chars ‖ key)), with
//!   a trailing `==` removed.

use crate::constants::{PHRASE_LENGTH, USER_VERIFY_PHRASE_PREFIX};
use crate::xml::Element;
use base64::{engine::general_purpose, Engine as _};
use erx_types::ClinicKey;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha512};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleSignOn {
    pub clinic_id: i64,
    pub code: String,
    pub user_id: i64,
    pub user_id_verify: String,
    pub phrase_length: usize,
}

impl SingleSignOn {
    /// Mint a credential with a fresh random phrase.
    pub fn generate(clinic_key: &ClinicKey, user_id: i64, clinic_id: i64) -> Self {
        let phrase = random_phrase(&mut rand::thread_rng());
        Self::from_phrase(&phrase, clinic_key, user_id, clinic_id)
    }

    /// Mint a credential from a known phrase.
    ///
    /// Deterministic; `generate` is this with a random phrase. Phrases are ASCII.
    pub fn from_phrase(phrase: &str, clinic_key: &ClinicKey, user_id: i64, clinic_id: i64) -> Self {
        let key = clinic_key.expose().as_bytes();

        let code = format!("{phrase}{}", keyed_digest(&[phrase.as_bytes(), key]));

        let prefix = phrase.get(..USER_VERIFY_PHRASE_PREFIX).unwrap_or(phrase);
        let user_id_text = user_id.to_string();
        let user_id_verify = keyed_digest(&[user_id_text.as_bytes(), prefix.as_bytes(), key]);

        Self {
            clinic_id,
            code,
            user_id,
            user_id_verify,
            phrase_length: phrase.len(),
        }
    }

    pub fn to_element(&self) -> Element {
        Element::new("SingleSignOn")
            .with_child(Element::leaf("SingleSignOnClinicId", self.clinic_id.to_string()))
            .with_child(Element::leaf("SingleSignOnCode", self.code.as_str()))
            .with_child(Element::leaf("SingleSignOnUserId", self.user_id.to_string()))
            .with_child(Element::leaf(
                "SingleSignOnUserIdVerify",
                self.user_id_verify.as_str(),
            ))
            .with_child(Element::leaf(
                "SingleSignOnPhraseLength",
                self.phrase_length.to_string(),
            ))
    }
}

fn random_phrase(rng: &mut impl Rng) -> String {
    (0..PHRASE_LENGTH)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

fn keyed_digest(parts: &[&[u8]]) -> String {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let encoded = general_purpose::STANDARD.encode(hasher.finalize());
    match encoded.strip_suffix("==") {
        Some(stripped) => stripped.to_owned(),
        None => encoded,
    }
}
