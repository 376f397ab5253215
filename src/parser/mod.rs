pub mod classify;
pub mod extract;
pub mod formalities;
pub mod patterns;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ownership::{self, LotMap, OwnerMap, PropertyMap};
use crate::pages::PageText;
use extract::charges::{Charge, ChargeStatus};
use extract::flux::FluxTable;
use formalities::Formality;

pub const DEFAULT_FLUX_SCAN_PAGES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub formality_count: usize,
    /// Formality tables plus flux tables.
    pub table_count: usize,
    pub flux_table_count: usize,
    pub lot_count: usize,
    pub owner_count: usize,
    pub charge_count: usize,
    pub active_charge_count: usize,
    pub radiated_charge_count: usize,
}

/// Everything extracted from one filing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentBundle {
    pub name: String,
    pub flux_tables: Vec<FluxTable>,
    pub formalities: Vec<Formality>,
    pub lots: LotMap,
    /// The same lots grouped per property.
    pub properties: PropertyMap,
    pub owners: OwnerMap,
    pub active_charges: Vec<Charge>,
    pub radiated_charges: Vec<Charge>,
    pub summary: Summary,
}

pub fn process_document(name: &str, pages: &[PageText]) -> DocumentBundle {
    process_document_with(name, pages, DEFAULT_FLUX_SCAN_PAGES)
}

/// Pipeline: pages → start pages → formalities (with facts) → lot owners → portfolios.
/// Charges are split by radiation status; expiry is left to query time.
pub fn process_document_with(name: &str, pages: &[PageText], flux_scan_pages: usize) -> DocumentBundle {
    let starts = classify::formality_start_pages(pages);
    let formalities = formalities::segment_formalities(pages, &starts);
    let flux_tables = extract::flux::extract(pages, flux_scan_pages);

    let lots = ownership::resolve_owners(&formalities);
    let properties = ownership::group_by_property(&lots);
    let owners = ownership::group_by_owner(&lots);

    let (active_charges, radiated_charges): (Vec<Charge>, Vec<Charge>) = formalities
        .iter()
        .filter_map(|f| f.facts.as_charge())
        .cloned()
        .partition(|c| c.status == ChargeStatus::Active);

    let formality_tables: usize = formalities.iter().map(|f| f.tables.len()).sum();
    let summary = Summary {
        formality_count: formalities.len(),
        table_count: formality_tables + flux_tables.len(),
        flux_table_count: flux_tables.len(),
        lot_count: lots.len(),
        owner_count: owners.len(),
        charge_count: active_charges.len() + radiated_charges.len(),
        active_charge_count: active_charges.len(),
        radiated_charge_count: radiated_charges.len(),
    };

    info!(
        document = name,
        pages = pages.len(),
        formalities = summary.formality_count,
        lots = summary.lot_count,
        owners = summary.owner_count,
        charges = summary.charge_count,
        "processed document"
    );

    DocumentBundle {
        name: name.to_string(),
        flux_tables,
        formalities,
        lots,
        properties,
        owners,
        active_charges,
        radiated_charges,
        summary,
    }
}
