//! Typed request/reply pairs, one per remote operation.
//!
//! Every request starts with the single-sign-on block; every reply carries a `Result` block.

pub mod drugs;
pub mod patient;
pub mod pharmacy;
pub mod prescriptions;
pub mod refills;

use crate::shapes::ResultStatus;
use crate::xml::Element;
use crate::WireResult;

/// A reply that carries nothing beyond its result block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusReply {
    pub status: ResultStatus,
}

impl crate::WireReply for StatusReply {
    fn from_element(element: &Element) -> WireResult<Self> {
        Ok(Self {
            status: ResultStatus::from_parent(element)?,
        })
    }

    fn status(&self) -> &ResultStatus {
        &self.status
    }
}
