//! Ownership-transfer facts from the tables of a Publication formality.
//!
//! Every table is read independently; the same table may feed dates, disponents,
//! beneficiaries and properties. Nothing here fails: a table that does not fit a
//! layout simply contributes nothing.

use serde::{Deserialize, Serialize};

use crate::pages::{cell_text, cell_value, row_contains, table_contains, PageTable, Row, Table};
use crate::parser::patterns;

const DISPONENT_NOISE: &[&str] = &["disposant", "donateur", "numéro", "bénéficiaire"];
const BENEFICIARY_NOISE: &[&str] = &[
    "bénéficiaire", "donataire", "date", "disposant", "paris", "transfert", "page", "numéro",
];
const BENEFICIARY_HEADER: &str = "bénéficiaire, donataire";
const BENEFICIARY_HEADER_PLURAL: &str = "bénéficiaires, donataires";

pub const UNSPECIFIED_RIGHT: &str = "unspecified";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disponent {
    pub name: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub name: String,
    pub birth_date: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedProperty {
    /// 1-based index into the beneficiary list, as printed.
    pub beneficiary_ref: String,
    pub right_type: String,
    pub commune: Option<String>,
    pub address: Option<String>,
    pub volume: Option<String>,
    pub lots: Option<String>,
    pub page: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActDates {
    pub deed_date: Option<String>,
    pub filing_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFacts {
    pub disponents: Vec<Disponent>,
    #[serde(rename = "beneficiaires")]
    pub beneficiaries: Vec<Beneficiary>,
    #[serde(rename = "immeubles")]
    pub properties: Vec<LinkedProperty>,
    pub dates: Vec<ActDates>,
    #[serde(rename = "prix")]
    pub price: Option<String>,
}

impl TransferFacts {
    /// First deed date, in document order.
    pub fn deed_date(&self) -> Option<&str> {
        self.dates.iter().find_map(|d| d.deed_date.as_deref())
    }
}

pub fn extract(tables: &[PageTable]) -> TransferFacts {
    let mut facts = TransferFacts::default();

    for table in tables {
        let rows = &table.rows;
        if rows.is_empty() {
            continue;
        }

        collect_dates(rows, &mut facts.dates);

        if table_contains(rows, "disposant") || table_contains(rows, "donateur") {
            collect_disponents(rows, &mut facts.disponents);
        }

        // Only the exact header phrase marks a beneficiary table; property tables
        // also mention beneficiaries.
        if table_contains(rows, BENEFICIARY_HEADER) {
            collect_beneficiaries(rows, &mut facts.beneficiaries);
        }

        if table_contains(rows, "immeuble") {
            collect_properties(table, &mut facts);
        }
    }

    facts
}

fn collect_dates(rows: &Table, dates: &mut Vec<ActDates>) {
    for cell in rows.iter().flatten().flatten() {
        if let Some(deed) = patterns::deed_date(cell) {
            if !dates.iter().any(|d| d.deed_date.as_deref() == Some(deed)) {
                dates.push(ActDates {
                    deed_date: Some(deed.to_string()),
                    filing_date: None,
                });
            }
        }
        if let Some(filing) = patterns::filing_date(cell) {
            match dates.iter_mut().rev().find(|d| d.filing_date.is_none()) {
                Some(entry) => entry.filing_date = Some(filing.to_string()),
                None => dates.push(ActDates {
                    deed_date: None,
                    filing_date: Some(filing.to_string()),
                }),
            }
        }
    }
}

fn collect_disponents(rows: &Table, disponents: &mut Vec<Disponent>) {
    for row in rows.iter().skip(1) {
        let Some(name) = cell_text(row, 1) else {
            continue;
        };
        if contains_any(name, DISPONENT_NOISE) || disponents.iter().any(|d| d.name == name) {
            continue;
        }
        disponents.push(Disponent {
            name: name.to_string(),
            id: cell_value(row, 2).map(str::to_string),
        });
    }
}

fn collect_beneficiaries(rows: &Table, beneficiaries: &mut Vec<Beneficiary>) {
    for row in rows.iter().skip(1) {
        let Some(name) = cell_text(row, 1) else {
            continue;
        };
        if contains_any(name, BENEFICIARY_NOISE)
            || name.chars().count() <= 2
            || patterns::is_short_code(name)
        {
            continue;
        }
        if beneficiaries.iter().any(|b| b.name == name) {
            continue;
        }
        beneficiaries.push(Beneficiary {
            name: name.to_string(),
            birth_date: cell_value(row, 2)
                .filter(|d| patterns::is_birth_date(d))
                .map(str::to_string),
            id: identity_number(row),
        });
    }
}

/// Looser scan for tables headed `Bénéficiaires, Donataires`, used when the strict
/// beneficiary extraction found nobody. Rows after the header are taken as-is.
pub fn fallback_beneficiaries(tables: &[PageTable]) -> Vec<Beneficiary> {
    let mut beneficiaries = Vec::new();
    for table in tables {
        let rows = &table.rows;
        let Some(header) = rows
            .iter()
            .position(|row| row_contains(row, BENEFICIARY_HEADER_PLURAL))
        else {
            continue;
        };
        for row in &rows[header + 1..] {
            let Some(name) = cell_text(row, 1) else {
                continue;
            };
            if contains_any(name, &["bénéficiaire", "donataire"]) {
                continue;
            }
            beneficiaries.push(Beneficiary {
                name: name.to_string(),
                birth_date: cell_value(row, 2).map(str::to_string),
                id: identity_number(row),
            });
        }
    }
    beneficiaries
}

/// First cell from column 3 onwards shaped like a 9-digit identity number.
fn identity_number(row: &Row) -> Option<String> {
    (3..row.len()).find_map(|i| {
        cell_value(row, i)
            .filter(|v| patterns::is_identity_number(v))
            .map(str::to_string)
    })
}

fn collect_properties(table: &PageTable, facts: &mut TransferFacts) {
    let (volume_col, lot_col) = locate_volume_lot(&table.rows);

    for row in &table.rows {
        let Some(first) = cell_text(row, 0) else {
            continue;
        };
        let lower = first.to_lowercase();

        if lower.contains("bénéficiaire") && first.contains(':') {
            facts
                .properties
                .push(property_row(row, first, volume_col, lot_col, table.page));
        } else if lower.contains("prix") && lower.contains("eur") {
            if let Some(price) = patterns::price(first) {
                facts.price = Some(price);
            }
        }
    }
}

/// Column indices of the `Volume` and `Lot` headers. Column 0 always holds the
/// beneficiary reference, so a match there is ignored.
fn locate_volume_lot(rows: &Table) -> (Option<usize>, Option<usize>) {
    let mut volume = None;
    let mut lot = None;
    for row in rows {
        for (j, cell) in row.iter().enumerate() {
            let Some(cell) = cell.as_deref() else {
                continue;
            };
            match cell.trim().to_lowercase().as_str() {
                "volume" => volume = Some(j),
                "lot" => lot = Some(j),
                _ => {}
            }
        }
        if volume.is_some() && lot.is_some() {
            break;
        }
    }
    (volume.filter(|&c| c > 0), lot.filter(|&c| c > 0))
}

fn property_row(
    row: &Row,
    first: &str,
    volume_col: Option<usize>,
    lot_col: Option<usize>,
    page: usize,
) -> LinkedProperty {
    let right_type = first
        .split_once('-')
        .map(|(_, right)| right.trim())
        .filter(|r| !r.is_empty())
        .unwrap_or(UNSPECIFIED_RIGHT)
        .to_string();
    let beneficiary_ref = patterns::beneficiary_ref(first).unwrap_or("1").to_string();

    let address_end = volume_col.unwrap_or(row.len());
    let parts: Vec<&str> = (1..address_end).filter_map(|i| cell_text(row, i)).collect();
    let commune = parts.first().map(|c| c.to_string());
    let address = if parts.len() >= 2 {
        Some(parts[1..].join(" "))
    } else {
        None
    };

    LinkedProperty {
        beneficiary_ref,
        right_type,
        commune,
        address,
        volume: volume_col.and_then(|c| cell_text(row, c)).map(str::to_string),
        lots: lot_col.and_then(|c| cell_text(row, c)).map(str::to_string),
        page,
    }
}

fn contains_any(name: &str, needles: &[&str]) -> bool {
    let lower = name.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(page: usize, rows: &[&[Option<&str>]]) -> PageTable {
        PageTable {
            page,
            index: 1,
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        }
    }

    #[test]
    fn dates_are_distinct_and_paired() {
        let t = table(
            3,
            &[
                &[Some("Date de l'acte : 12/03/2015"), Some("Date de dépôt : 20/04/2015")],
                &[Some("date de l'acte : 12/03/2015"), None],
                &[Some("Date de l'acte : 01/06/2016"), None],
            ],
        );
        let facts = extract(&[t]);
        assert_eq!(
            facts.dates,
            vec![
                ActDates {
                    deed_date: Some("12/03/2015".into()),
                    filing_date: Some("20/04/2015".into())
                },
                ActDates {
                    deed_date: Some("01/06/2016".into()),
                    filing_date: None
                },
            ]
        );
        assert_eq!(facts.deed_date(), Some("12/03/2015"));
    }

    #[test]
    fn filing_date_goes_to_latest_open_entry() {
        let t = table(
            1,
            &[
                &[Some("Date de l'acte : 01/01/2010")],
                &[Some("Date de l'acte : 01/01/2011")],
                &[Some("Date de dépôt : 05/01/2011")],
                &[Some("Date de dépôt : 09/09/2009")],
                &[Some("Date de dépôt : 10/10/2012")],
            ],
        );
        let facts = extract(&[t]);
        assert_eq!(facts.dates[1].filing_date.as_deref(), Some("05/01/2011"));
        assert_eq!(facts.dates[0].filing_date.as_deref(), Some("09/09/2009"));
        assert_eq!(
            facts.dates[2],
            ActDates {
                deed_date: None,
                filing_date: Some("10/10/2012".into())
            }
        );
    }

    #[test]
    fn disponents_skip_headers_and_duplicates() {
        let t = table(
            2,
            &[
                &[Some("Disposant, Donateur"), None, None],
                &[Some("1"), Some("Numéro"), Some("Date")],
                &[Some("1"), Some("SCI LES TILLEULS"), Some("412 345 678")],
                &[Some("2"), Some("MARTIN Paul"), Some("-")],
                &[Some("3"), Some("SCI LES TILLEULS"), None],
                &[Some("4"), None, None],
            ],
        );
        let facts = extract(&[t]);
        assert_eq!(
            facts.disponents,
            vec![
                Disponent {
                    name: "SCI LES TILLEULS".into(),
                    id: Some("412 345 678".into())
                },
                Disponent {
                    name: "MARTIN Paul".into(),
                    id: None
                },
            ]
        );
    }

    #[test]
    fn beneficiaries_reject_false_positives() {
        let t = table(
            2,
            &[
                &[Some("Bénéficiaire, Donataire"), None, None, None],
                &[Some("1"), Some("DUPONT Jean"), Some("02/05/1961"), Some("-"), Some("552 100 554")],
                &[Some("2"), Some("BD 10"), None, None],
                &[Some("3"), Some("PARIS 15E"), None, None],
                &[Some("4"), Some("XY"), None, None],
                &[Some("5"), Some("DURAND Marie"), Some("née en 1970"), Some("123")],
                &[Some("6"), Some("DUPONT Jean"), None, None],
            ],
        );
        let facts = extract(&[t]);
        assert_eq!(
            facts.beneficiaries,
            vec![
                Beneficiary {
                    name: "DUPONT Jean".into(),
                    birth_date: Some("02/05/1961".into()),
                    id: Some("552 100 554".into())
                },
                Beneficiary {
                    name: "DURAND Marie".into(),
                    birth_date: None,
                    id: None
                },
            ]
        );
    }

    #[test]
    fn plural_header_is_not_a_strict_beneficiary_table() {
        let t = table(
            2,
            &[
                &[Some("Bénéficiaires, Donataires"), None, None],
                &[Some("1"), Some("LEROY Anne"), Some("-")],
            ],
        );
        assert!(extract(std::slice::from_ref(&t)).beneficiaries.is_empty());
        assert_eq!(
            fallback_beneficiaries(&[t]),
            vec![Beneficiary {
                name: "LEROY Anne".into(),
                birth_date: None,
                id: None
            }]
        );
    }

    #[test]
    fn property_rows_and_price() {
        let t = table(
            4,
            &[
                &[Some("Immeubles"), None, None, None, None],
                &[Some("Bénéficiaires"), Some("Commune"), Some("Désignation cadastrale"), Some("Volume"), Some("Lot")],
                &[
                    Some("Bénéficiaire : 2 - Toute propriété"),
                    Some("LYON 3E"),
                    Some("12 RUE DES LILAS"),
                    Some("1"),
                    Some("101\n103 à 106\n111"),
                ],
                &[Some("Bénéficiaire : - Usufruit"), Some("VILLEURBANNE"), None, Some("-"), None],
                &[Some("Bénéficiaire: 1"), Some("LYON 3E"), Some("AB"), Some("BÂT. C"), None, None],
                &[Some("Prix / évaluation : 180 000,00 EUR"), None, None, None, None],
            ],
        );
        let facts = extract(&[t]);
        assert_eq!(facts.properties.len(), 3);

        let first = &facts.properties[0];
        assert_eq!(first.beneficiary_ref, "2");
        assert_eq!(first.right_type, "Toute propriété");
        assert_eq!(first.commune.as_deref(), Some("LYON 3E"));
        assert_eq!(first.address.as_deref(), Some("12 RUE DES LILAS"));
        assert_eq!(first.volume.as_deref(), Some("1"));
        assert_eq!(first.lots.as_deref(), Some("101\n103 à 106\n111"));
        assert_eq!(first.page, 4);

        let second = &facts.properties[1];
        assert_eq!(second.beneficiary_ref, "1");
        assert_eq!(second.right_type, "Usufruit");
        assert_eq!(second.commune.as_deref(), Some("VILLEURBANNE"));
        assert_eq!(second.address, None);
        assert_eq!(second.volume.as_deref(), Some("-"));
        assert_eq!(second.lots, None);

        let third = &facts.properties[2];
        assert_eq!(third.right_type, UNSPECIFIED_RIGHT);
        assert_eq!(third.address.as_deref(), Some("AB"));

        assert_eq!(facts.price.as_deref(), Some("180 000,00"));
    }

    #[test]
    fn tables_without_markers_yield_nothing() {
        let t = table(1, &[&[Some("Nature"), Some("Vente")], &[None, None]]);
        assert_eq!(extract(&[t, table(1, &[])]), TransferFacts::default());
    }
}
