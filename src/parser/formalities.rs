use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pages::{PageTable, PageText};

use super::extract::{self, FormalityFacts};
use super::patterns;

/// Formality category named in the section header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Publication,
    Charge,
    Volumetrie,
    Copropriete,
    Lotissement,
    Pending,
    FinalRejection,
    /// A label outside the known family, kept verbatim.
    Other(String),
    Unclassified,
}

impl Category {
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return Category::Unclassified;
        };
        match label.to_lowercase().as_str() {
            "publication" => Category::Publication,
            "charge" => Category::Charge,
            "volumétrie" | "volumetrie" => Category::Volumetrie,
            "copropriété" | "copropriete" => Category::Copropriete,
            "lotissement" => Category::Lotissement,
            "formalités en attente" | "formalites en attente" => Category::Pending,
            "rejet définitif" | "rejet definitif" => Category::FinalRejection,
            "unclassified" => Category::Unclassified,
            _ => Category::Other(label.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Category::Publication => "Publication",
            Category::Charge => "Charge",
            Category::Volumetrie => "Volumétrie",
            Category::Copropriete => "Copropriété",
            Category::Lotissement => "Lotissement",
            Category::Pending => "Formalités en attente",
            Category::FinalRejection => "rejet définitif",
            Category::Other(label) => label,
            Category::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::from_label(Some(&label))
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.label().to_string()
    }
}

/// One classified section of the filing, self-contained after segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formality {
    pub start_page: usize,
    pub end_page: usize,
    pub category: Category,
    pub text: String,
    pub tables: Vec<PageTable>,
    pub facts: FormalityFacts,
}

impl Formality {
    pub fn pages_label(&self) -> String {
        format!("{}-{}", self.start_page, self.end_page)
    }
}

/// Cut the page stream into formalities. A page belongs to at most one formality:
/// the first start page that claims it wins.
pub fn segment_formalities(pages: &[PageText], start_pages: &[usize]) -> Vec<Formality> {
    let mut used = HashSet::new();
    start_pages
        .iter()
        .filter_map(|&start| segment_one(pages, start, &mut used))
        .collect()
}

fn segment_one(pages: &[PageText], start: usize, used: &mut HashSet<usize>) -> Option<Formality> {
    if used.contains(&start) {
        debug!(page = start, "start page already consumed");
        return None;
    }
    let first = page_at(pages, start)?;
    if first.text.is_empty() {
        return None;
    }

    let category = Category::from_label(patterns::category_label(&first.text));
    // the printed span may run past the dump; clamp it to the pages we have
    let end = match patterns::page_span(&first.text) {
        Some((a, b)) if a == start && b >= start => b.min(pages.len()),
        _ => start,
    };

    let mut text = String::new();
    let mut tables = Vec::new();
    for number in start..=end {
        let Some(page) = page_at(pages, number) else {
            continue;
        };
        if !page.text.is_empty() {
            text.push_str(&format!("\n=== Page {} ===\n{}\n", number, page.text));
        }
        tables.extend(page.page_tables());
    }
    used.extend(start..=end);

    let mut formality = Formality {
        start_page: start,
        end_page: end,
        category,
        text: text.trim().to_string(),
        tables,
        facts: FormalityFacts::Other,
    };
    formality.facts = extract::extract_facts(&formality);
    debug!(
        pages = %formality.pages_label(),
        category = %formality.category,
        tables = formality.tables.len(),
        "segmented formality"
    );
    Some(formality)
}

fn page_at(pages: &[PageText], number: usize) -> Option<&PageText> {
    number.checked_sub(1).and_then(|i| pages.get(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: usize, text: &str) -> PageText {
        PageText {
            number,
            text: text.to_string(),
            tables: Vec::new(),
        }
    }

    #[test]
    fn category_labels() {
        assert_eq!(Category::from_label(Some("PUBLICATION")), Category::Publication);
        assert_eq!(Category::from_label(Some("Volumétrie")), Category::Volumetrie);
        assert_eq!(Category::from_label(None), Category::Unclassified);
        assert_eq!(
            Category::from_label(Some("Sommaire")),
            Category::Other("Sommaire".to_string())
        );
        assert_eq!(Category::Pending.to_string(), "Formalités en attente");
    }

    #[test]
    fn category_serializes_as_label() {
        let json = serde_json::to_string(&Category::Copropriete).unwrap();
        assert_eq!(json, "\"Copropriété\"");
        let back: Category = serde_json::from_str("\"unclassified\"").unwrap();
        assert_eq!(back, Category::Unclassified);
    }

    #[test]
    fn explicit_span_consumes_pages() {
        let mut p1 = page(1, "Relevé des formalités - Volumétrie PAGE 1 À PAGE 3");
        p1.tables.push(vec![vec![Some("a".into())]]);
        let mut p3 = page(3, "Relevé des formalités - Volumétrie (suite)");
        p3.tables.push(vec![vec![Some("b".into())]]);
        let pages = vec![
            p1,
            page(2, "détail"),
            p3,
            page(4, "Relevé des formalités - Lotissement"),
        ];
        let formalities = segment_formalities(&pages, &[1, 3, 4]);
        assert_eq!(formalities.len(), 2);

        let first = &formalities[0];
        assert_eq!((first.start_page, first.end_page), (1, 3));
        assert_eq!(first.category, Category::Volumetrie);
        assert!(first.text.starts_with("=== Page 1 ==="));
        assert!(first.text.contains("=== Page 2 ===\ndétail"));
        assert_eq!(first.tables.len(), 2);
        assert_eq!(first.tables[1].page, 3);
        assert_eq!(first.tables[1].index, 1);

        assert_eq!((formalities[1].start_page, formalities[1].end_page), (4, 4));
        assert_eq!(formalities[1].category, Category::Lotissement);
    }

    #[test]
    fn span_for_other_page_is_ignored() {
        let pages = vec![
            page(1, "x"),
            page(2, "Relevé des formalités - Charge\nvoir PAGE 5 À PAGE 6"),
        ];
        let formalities = segment_formalities(&pages, &[2]);
        assert_eq!((formalities[0].start_page, formalities[0].end_page), (2, 2));
        assert_eq!(formalities[0].category, Category::Charge);
    }

    #[test]
    fn span_past_document_end_is_clamped() {
        let pages = vec![page(1, "Relevé des formalités - Publication PAGE 1 À PAGE 9")];
        let formalities = segment_formalities(&pages, &[1]);
        assert_eq!(formalities.len(), 1);
        assert_eq!(formalities[0].end_page, 1);
        assert_eq!(formalities[0].pages_label(), "1-1");
        assert!(formalities[0].text.contains("=== Page 1 ==="));
    }

    #[test]
    fn huge_span_ends_at_last_page() {
        let pages = vec![
            page(1, "Relevé des formalités - Charge PAGE 1 À PAGE 30000000"),
            page(2, "Formalité 1 : Hypothèque"),
        ];
        let formalities = segment_formalities(&pages, &[1]);
        assert_eq!((formalities[0].start_page, formalities[0].end_page), (1, 2));
    }

    #[test]
    fn unknown_label_kept_and_missing_page_skipped() {
        let pages = vec![page(1, "Relevé des formalités - Inscription spéciale\n")];
        let formalities = segment_formalities(&pages, &[1, 7]);
        assert_eq!(formalities.len(), 1);
        assert_eq!(
            formalities[0].category,
            Category::Other("Inscription spéciale".to_string())
        );
        assert!(matches!(formalities[0].facts, FormalityFacts::Other));
    }
}
