use serde::{Deserialize, Serialize};

use crate::parser::formalities::Formality;
use crate::parser::patterns;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeStatus {
    Active,
    Radiated,
}

impl ChargeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChargeStatus::Active => "ACTIVE",
            ChargeStatus::Radiated => "RADIATED",
        }
    }
}

/// A numbered sub-item (`Formalité N`) inside a charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCharge {
    pub number: String,
    pub description: String,
    pub exigibility_dates: Vec<String>,
    pub effect_dates: Vec<String>,
    pub principal_amounts: Vec<String>,
}

/// A Charge formality reduced to what matters for liens and mortgages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    pub start_page: usize,
    pub end_page: usize,
    pub title: Option<String>,
    pub sub_charges: Vec<SubCharge>,
    pub has_total_radiation: bool,
    pub status: ChargeStatus,
}

impl Charge {
    pub fn pages_label(&self) -> String {
        format!("{}-{}", self.start_page, self.end_page)
    }

    /// Every exigibility and effect date across all sub-charges.
    pub fn all_dates(&self) -> impl Iterator<Item = &str> {
        self.sub_charges.iter().flat_map(|s| {
            s.exigibility_dates
                .iter()
                .chain(s.effect_dates.iter())
                .map(String::as_str)
        })
    }
}

pub fn extract(formality: &Formality) -> Charge {
    let has_total_radiation = patterns::has_total_radiation(&formality.text);

    let sub_charges = patterns::sub_charge_markers(&formality.text)
        .into_iter()
        .map(|m| SubCharge {
            number: m.number.to_string(),
            description: m.description.to_string(),
            exigibility_dates: patterns::exigibility_dates(m.window),
            effect_dates: patterns::effect_dates(m.window),
            principal_amounts: patterns::principal_amounts(m.window),
        })
        .collect();

    Charge {
        start_page: formality.start_page,
        end_page: formality.end_page,
        title: title(formality),
        sub_charges,
        has_total_radiation,
        status: if has_total_radiation {
            ChargeStatus::Radiated
        } else {
            ChargeStatus::Active
        },
    }
}

/// `<title> PAGE x À PAGE y`, from the tables first, then from the text.
fn title(formality: &Formality) -> Option<String> {
    formality
        .tables
        .iter()
        .flat_map(|t| t.rows.iter().flatten().flatten())
        .find(|cell| patterns::has_page_span(cell))
        .map(|cell| cell.trim().to_string())
        .or_else(|| {
            formality
                .text
                .lines()
                .find(|line| patterns::has_page_span(line))
                .map(|line| line.trim().to_string())
        })
}
