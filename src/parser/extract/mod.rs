pub mod charges;
pub mod flux;
pub mod transfer;

use serde::{Deserialize, Serialize};

use super::formalities::{Category, Formality};
use charges::Charge;
use transfer::TransferFacts;

/// Facts attached to a formality; which variant is produced is fixed by its category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormalityFacts {
    Transfer(TransferFacts),
    Charge(Charge),
    #[serde(rename = "none")]
    Other,
}

impl FormalityFacts {
    pub fn as_transfer(&self) -> Option<&TransferFacts> {
        match self {
            FormalityFacts::Transfer(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_charge(&self) -> Option<&Charge> {
        match self {
            FormalityFacts::Charge(c) => Some(c),
            _ => None,
        }
    }
}

pub fn extract_facts(formality: &Formality) -> FormalityFacts {
    match &formality.category {
        Category::Publication => FormalityFacts::Transfer(transfer::extract(&formality.tables)),
        Category::Charge => FormalityFacts::Charge(charges::extract(formality)),
        Category::Volumetrie
        | Category::Copropriete
        | Category::Lotissement
        | Category::Pending
        | Category::FinalRejection
        | Category::Other(_)
        | Category::Unclassified => FormalityFacts::Other,
    }
}
