use crate::pages::{PageTable, PageText};

const FLUX_HEADING: &str = "Immeubles issus de la demande - formalités du flux";

/// A table listing the properties covered by the request.
pub type FluxTable = PageTable;

/// Flux tables found on the first `scan_pages` pages.
pub fn extract(pages: &[PageText], scan_pages: usize) -> Vec<FluxTable> {
    pages
        .iter()
        .take(scan_pages)
        .filter(|p| p.text.contains(FLUX_HEADING))
        .flat_map(PageText::page_tables)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: usize, text: &str, tables: usize) -> PageText {
        PageText {
            number,
            text: text.to_string(),
            tables: vec![vec![vec![Some("Commune".to_string())]]; tables],
        }
    }

    #[test]
    fn only_leading_pages_with_heading() {
        let pages = vec![
            page(1, "Demande", 1),
            page(2, "Immeubles issus de la demande - formalités du flux", 2),
            page(3, "Immeubles issus de la demande - formalités du flux", 1),
        ];
        let tables = extract(&pages, 2);
        assert_eq!(tables.len(), 2);
        assert!(tables.iter().all(|t| t.page == 2));
        assert_eq!(tables[1].index, 2);
        assert_eq!(extract(&pages, 5).len(), 3);
    }
}
