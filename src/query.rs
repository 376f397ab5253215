//! Read-side views over stored documents, plus the per-document JSON export.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::db::OwnerPropertyRow;
use crate::error::{EhfError, Result};
use crate::expiry;
use crate::ownership::{compare_lots, LotLabel};
use crate::parser::extract::charges::{Charge, ChargeStatus};
use crate::parser::DocumentBundle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyView {
    pub commune: Option<String>,
    pub address: Option<String>,
    pub lot: String,
    pub volume: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerView {
    pub owner: String,
    pub properties: Vec<PropertyView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeEntry {
    pub title: String,
    pub pages: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChargesView {
    pub active: Vec<ChargeEntry>,
    pub expired: Vec<ChargeEntry>,
    pub active_count: usize,
    pub expired_count: usize,
}

/// Stored properties grouped per owner, owners by name, properties by (commune, address, lot).
pub fn owners_view(rows: &[OwnerPropertyRow]) -> Vec<OwnerView> {
    let mut grouped: BTreeMap<&str, Vec<&OwnerPropertyRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.owner.as_str()).or_default().push(row);
    }

    grouped
        .into_iter()
        .map(|(owner, mut props)| {
            props.sort_by(|a, b| {
                a.commune
                    .cmp(&b.commune)
                    .then_with(|| a.address.cmp(&b.address))
                    .then_with(|| {
                        compare_lots(&LotLabel::from(a.lot.clone()), &LotLabel::from(b.lot.clone()))
                    })
            });
            OwnerView {
                owner: owner.to_string(),
                properties: props
                    .into_iter()
                    .map(|p| PropertyView {
                        commune: p.commune.clone(),
                        address: p.address.clone(),
                        lot: p.lot.clone(),
                        volume: p.volume.clone(),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Split the non-radiated charges into still-active and expired as of `now`.
pub fn charges_view(charges: &[Charge], now: NaiveDateTime) -> ChargesView {
    let mut view = ChargesView::default();
    for charge in charges.iter().filter(|c| c.status == ChargeStatus::Active) {
        let entry = ChargeEntry {
            title: charge.title.clone().unwrap_or_default(),
            pages: charge.pages_label(),
        };
        if expiry::is_expired(charge, now) {
            view.expired.push(entry);
        } else {
            view.active.push(entry);
        }
    }
    view.active_count = view.active.len();
    view.expired_count = view.expired.len();
    view
}

/// Write `<dir>/<name>/<name>_complete.json` and return its path.
pub fn write_bundle_json(dir: &Path, bundle: &DocumentBundle) -> Result<PathBuf> {
    let out_dir = dir.join(&bundle.name);
    fs::create_dir_all(&out_dir).map_err(|source| EhfError::Io {
        path: out_dir.display().to_string(),
        source,
    })?;

    let path = out_dir.join(format!("{}_complete.json", bundle.name));
    let json = serde_json::to_string_pretty(bundle)?;
    fs::write(&path, json).map_err(|source| EhfError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path)
}
