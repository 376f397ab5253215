use std::borrow::Cow;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parser::extract::transfer::{self, Beneficiary, LinkedProperty};
use crate::parser::formalities::Formality;
use crate::parser::patterns;

use super::lots::{expand_lots, LotLabel};

/// Current owner of one lot, as of the latest deed seen for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotOwnership {
    pub commune: Option<String>,
    pub address: Option<String>,
    pub lot: LotLabel,
    pub volume: Option<String>,
    pub owner: String,
    pub birth_date: Option<String>,
    pub owner_id: Option<String>,
    pub right_type: String,
    #[serde(with = "super::dmy")]
    pub act_date: NaiveDate,
    pub pages: String,
}

/// Lot key → current owner.
pub type LotMap = BTreeMap<String, LotOwnership>;

/// Fold every Publication formality, in source order, into one owner per lot.
/// A later deed strictly replaces an earlier one; equal dates keep the first seen.
pub fn resolve_owners(formalities: &[Formality]) -> LotMap {
    let mut lots = LotMap::new();

    for formality in formalities {
        let Some(facts) = formality.facts.as_transfer() else {
            continue;
        };
        if facts.disponents.is_empty() {
            continue;
        }

        let beneficiaries: Cow<'_, [Beneficiary]> = if facts.beneficiaries.is_empty() {
            Cow::Owned(transfer::fallback_beneficiaries(&formality.tables))
        } else {
            Cow::Borrowed(&facts.beneficiaries)
        };
        if beneficiaries.is_empty() {
            debug!(pages = %formality.pages_label(), "publication without beneficiaries");
            continue;
        }

        let Some(deed) = facts.deed_date() else {
            continue;
        };
        let Some(act_date) = patterns::parse_dmy(deed) else {
            debug!(pages = %formality.pages_label(), deed, "unparseable deed date");
            continue;
        };

        for property in &facts.properties {
            let Some(owner) = pick_beneficiary(&beneficiaries, &property.beneficiary_ref) else {
                continue;
            };
            let base = property_key(property);
            for lot in expand_lots(property.lots.as_deref()) {
                let key = lot_key(&base, &lot);
                let candidate = LotOwnership {
                    commune: property.commune.clone(),
                    address: property.address.clone(),
                    lot,
                    volume: property.volume.clone(),
                    owner: owner.name.clone(),
                    birth_date: owner.birth_date.clone(),
                    owner_id: owner.id.clone(),
                    right_type: property.right_type.clone(),
                    act_date,
                    pages: formality.pages_label(),
                };
                record(&mut lots, key, candidate);
            }
        }
    }

    lots
}

fn record(lots: &mut LotMap, key: String, candidate: LotOwnership) {
    match lots.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(candidate);
        }
        Entry::Occupied(mut slot) => {
            if slot.get().act_date < candidate.act_date {
                slot.insert(candidate);
            }
        }
    }
}

/// Resolve a 1-based beneficiary reference. Out-of-range references clamp to the
/// last beneficiary; unparseable ones fall back to the first.
pub fn pick_beneficiary<'a>(beneficiaries: &'a [Beneficiary], reference: &str) -> Option<&'a Beneficiary> {
    match reference.trim().parse::<usize>() {
        Ok(n) if (1..=beneficiaries.len()).contains(&n) => beneficiaries.get(n - 1),
        Ok(_) => beneficiaries.last(),
        Err(_) => beneficiaries.first(),
    }
}

fn property_key(property: &LinkedProperty) -> String {
    format!(
        "{}_{}",
        property.commune.as_deref().unwrap_or_default(),
        property.address.as_deref().unwrap_or_default()
    )
    .replace([' ', '/'], "_")
}

fn lot_key(base: &str, lot: &LotLabel) -> String {
    match lot {
        LotLabel::Unspecified => format!("{base}_no_lot"),
        other => format!("{base}_lot_{other}"),
    }
}
