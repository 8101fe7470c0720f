//! Path parameter sets, checked with [`api_ingress::validation::check`]
//! before any store access.

use validator::Validate;

use crate::api::rest::rules::{BATCH_RE, ID_RE, IDENTIFIER_RE, KIT_RE, SPONSOR_RE, TRIAL_RE};
use crate::contract::model::LabelLookup;

#[derive(Debug, Validate)]
pub struct IdParams {
    #[validate(regex(path = *ID_RE, message = "Invalid ID format"))]
    pub id: String,
}

#[derive(Debug, Validate)]
pub struct BatchParams {
    #[validate(regex(path = *BATCH_RE, message = "Invalid batch number format"))]
    pub batch_number: String,
}

#[derive(Debug, Validate)]
pub struct ProtocolKitParams {
    #[validate(regex(path = *TRIAL_RE, message = "Invalid protocol number format"))]
    pub protocol_number: String,
    #[validate(regex(path = *KIT_RE, message = "Kit number must be exactly 6 digits"))]
    pub kit_number: String,
}

#[derive(Debug, Validate)]
pub struct IdentifierParams {
    #[validate(regex(path = *IDENTIFIER_RE, message = "Invalid identifier code format"))]
    pub identifier_code: String,
}

#[derive(Debug, Validate)]
pub struct SponsorTrialBatchParams {
    #[validate(regex(path = *SPONSOR_RE, message = "Invalid sponsor name format"))]
    pub sponsor_name: String,
    #[validate(regex(path = *TRIAL_RE, message = "Invalid trial identifier format"))]
    pub trial_identifier: String,
    #[validate(regex(path = *BATCH_RE, message = "Invalid batch number format"))]
    pub batch_number: String,
}

#[derive(Debug, Validate)]
pub struct SponsorTrialKitParams {
    #[validate(regex(path = *SPONSOR_RE, message = "Invalid sponsor name format"))]
    pub sponsor_name: String,
    #[validate(regex(path = *TRIAL_RE, message = "Invalid trial identifier format"))]
    pub trial_identifier: String,
    #[validate(regex(path = *KIT_RE, message = "Kit number must be exactly 6 digits"))]
    pub kit_number: String,
}

impl From<BatchParams> for LabelLookup {
    fn from(p: BatchParams) -> Self {
        LabelLookup::Batch {
            batch_number: p.batch_number,
        }
    }
}

impl From<ProtocolKitParams> for LabelLookup {
    fn from(p: ProtocolKitParams) -> Self {
        LabelLookup::ProtocolKit {
            protocol_number: p.protocol_number,
            kit_number: p.kit_number,
        }
    }
}

impl From<IdentifierParams> for LabelLookup {
    fn from(p: IdentifierParams) -> Self {
        LabelLookup::Identifier {
            identifier_code: p.identifier_code,
        }
    }
}

impl From<SponsorTrialBatchParams> for LabelLookup {
    fn from(p: SponsorTrialBatchParams) -> Self {
        LabelLookup::SponsorTrialBatch {
            sponsor_name: p.sponsor_name,
            trial_identifier: p.trial_identifier,
            batch_number: p.batch_number,
        }
    }
}

impl From<SponsorTrialKitParams> for LabelLookup {
    fn from(p: SponsorTrialKitParams) -> Self {
        LabelLookup::SponsorTrialKit {
            sponsor_name: p.sponsor_name,
            trial_identifier: p.trial_identifier,
            kit_number: p.kit_number,
        }
    }
}
