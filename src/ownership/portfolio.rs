use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::lots::{compare_lots, LotLabel};
use super::resolver::LotMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub commune: Option<String>,
    pub address: Option<String>,
    pub lot: LotLabel,
    pub volume: Option<String>,
    pub right_type: String,
    #[serde(with = "super::dmy")]
    pub act_date: NaiveDate,
    pub pages: String,
}

/// Everything one owner currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerPortfolio {
    pub birth_date: Option<String>,
    pub owner_id: Option<String>,
    pub properties: Vec<Holding>,
}

/// Owner name → portfolio.
pub type OwnerMap = BTreeMap<String, OwnerPortfolio>;

/// One lot of a property, with its current owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyLot {
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyLots {
    pub commune: Option<String>,
    pub address: Option<String>,
    pub lots: Vec<PropertyLot>,
}

/// `"<commune> <address>"` → lots of that property.
pub type PropertyMap = BTreeMap<String, PropertyLots>;

/// Regroup the per-lot map by property, lots in numeric order.
pub fn group_by_property(lots: &LotMap) -> PropertyMap {
    let mut properties = PropertyMap::new();

    for lot in lots.values() {
        let key = format!(
            "{} {}",
            lot.commune.as_deref().unwrap_or_default(),
            lot.address.as_deref().unwrap_or_default()
        );
        properties
            .entry(key)
            .or_insert_with(|| PropertyLots {
                commune: lot.commune.clone(),
                address: lot.address.clone(),
                lots: Vec::new(),
            })
            .lots
            .push(PropertyLot {
                lot: lot.lot.clone(),
                volume: lot.volume.clone(),
                owner: lot.owner.clone(),
                birth_date: lot.birth_date.clone(),
                owner_id: lot.owner_id.clone(),
                right_type: lot.right_type.clone(),
                act_date: lot.act_date,
                pages: lot.pages.clone(),
            });
    }

    for property in properties.values_mut() {
        property.lots.sort_by(|a, b| compare_lots(&a.lot, &b.lot));
    }

    properties
}

/// Invert the per-lot map into per-owner portfolios sorted by (commune, address, lot).
pub fn group_by_owner(lots: &LotMap) -> OwnerMap {
    let mut owners = OwnerMap::new();

    for lot in lots.values() {
        let portfolio = owners
            .entry(lot.owner.clone())
            .or_insert_with(|| OwnerPortfolio {
                birth_date: lot.birth_date.clone(),
                owner_id: lot.owner_id.clone(),
                properties: Vec::new(),
            });
        portfolio.properties.push(Holding {
            commune: lot.commune.clone(),
            address: lot.address.clone(),
            lot: lot.lot.clone(),
            volume: lot.volume.clone(),
            right_type: lot.right_type.clone(),
            act_date: lot.act_date,
            pages: lot.pages.clone(),
        });
    }

    for portfolio in owners.values_mut() {
        portfolio.properties.sort_by(|a, b| {
            a.commune
                .cmp(&b.commune)
                .then_with(|| a.address.cmp(&b.address))
                .then_with(|| compare_lots(&a.lot, &b.lot))
        });
    }

    owners
}
