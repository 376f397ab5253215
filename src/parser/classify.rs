use crate::pages::PageText;

use super::patterns;

/// Page numbers whose text opens a formality section, in document order.
/// The category is resolved later, during segmentation.
pub fn formality_start_pages(pages: &[PageText]) -> Vec<usize> {
    pages
        .iter()
        .filter(|p| !p.text.trim().is_empty() && patterns::is_formality_header(&p.text))
        .map(|p| p.number)
        .collect()
}
