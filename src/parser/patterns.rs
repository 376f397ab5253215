//! Pattern families over the free text of a land-registry filing.
//!
//! Each family sits behind one function so callers never touch a regex directly.
//! All matching is case-insensitive and accent-aware; dates are `DD/MM/YYYY`.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)Relevé\s+des\s+formalités\s*[-–—]\s*(?:Publication|Volumétrie|Copropriété|Lotissement|Charge|Formalités en attente|rejet définitif)",
    )
    .unwrap()
});
static CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Relevé\s+des\s+formalités\s*[-–—]\s*([^\n\r]+?)(?:\s+PAGE|\n|\r|$)").unwrap()
});
static PAGE_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)PAGE\s+(\d+)\s+(?:À|A|TO)\s+PAGE\s+(\d+)").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static DEED_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)date de l['’]acte\s*:\s*(\d{2}/\d{2}/\d{4})").unwrap()
});
static FILING_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)date de dépôt\s*:\s*(\d{2}/\d{2}/\d{4})").unwrap());
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)prix[^:]*:\s*([\d\s,.]+)\s*eur").unwrap());
static BIRTH_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}").unwrap());
static IDENTITY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{9,}$").unwrap());
static SHORT_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,3}\s+\d+$").unwrap());
static BENEFICIARY_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)bénéficiaire\s*:\s*(\d+)").unwrap());
static LOT_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)\s*(?:à|to)\s*(\d+)$").unwrap());

static RADIATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)radiation\s+(?:totale|simplifi[eé]e\s+totale)").unwrap()
});
static SUB_CHARGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Formalité\s+(\d+)[^:\n]*:([^\n]+)").unwrap());
static SUB_CHARGE_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Formalité\s+\d+").unwrap());
static EXIGIBILITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)date d['’]extrême exigibilité\s*:\s*(\d{2}/\d{2}/\d{4})").unwrap()
});
static EFFECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)date d['’]extrême effet\s*:\s*(\d{2}/\d{2}/\d{4})").unwrap()
});
static PRINCIPAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)montant\s+principal\s*:\s*([\d\s,.]+)\s*eur").unwrap());

// ── Headers ──

pub fn normalize_whitespace(text: &str) -> String {
    WS_RE.replace_all(text, " ").into_owned()
}

/// True when the page opens a formality of one of the known categories.
pub fn is_formality_header(text: &str) -> bool {
    HEADER_RE.is_match(&normalize_whitespace(text))
}

/// Free-text category label following the header prefix, without trailing page markers.
pub fn category_label(text: &str) -> Option<&str> {
    CATEGORY_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// First `PAGE a À PAGE b` marker.
pub fn page_span(text: &str) -> Option<(usize, usize)> {
    let caps = PAGE_SPAN_RE.captures(text)?;
    let start = caps[1].parse().ok()?;
    let end = caps[2].parse().ok()?;
    Some((start, end))
}

pub fn has_page_span(text: &str) -> bool {
    PAGE_SPAN_RE.is_match(text)
}

// ── Transfer facts ──

pub fn deed_date(cell: &str) -> Option<&str> {
    first_group(&DEED_DATE_RE, cell)
}

pub fn filing_date(cell: &str) -> Option<&str> {
    first_group(&FILING_DATE_RE, cell)
}

pub fn price(cell: &str) -> Option<String> {
    first_group(&PRICE_RE, cell).map(|p| p.trim().to_string())
}

pub fn is_birth_date(s: &str) -> bool {
    BIRTH_DATE_RE.is_match(s)
}

/// Nine or more digits once spaces are removed (`123 456 789`, `123456789`).
pub fn is_identity_number(s: &str) -> bool {
    IDENTITY_RE.is_match(&s.replace(' ', ""))
}

/// Street or parcel codes such as `BD 10` that land in the name column.
pub fn is_short_code(s: &str) -> bool {
    SHORT_CODE_RE.is_match(s)
}

pub fn beneficiary_ref(cell: &str) -> Option<&str> {
    first_group(&BENEFICIARY_REF_RE, cell)
}

/// True when the token is written as a range (`145 à 147`, `145 to 147`).
pub fn looks_like_range(token: &str) -> bool {
    let lower = token.to_lowercase();
    lower.contains('à') || lower.contains("to")
}

/// Widest range that is still expanded lot by lot.
pub const MAX_LOT_RANGE_WIDTH: u32 = 10_000;

/// Inclusive bounds of a well-formed, ascending lot range no wider than
/// [`MAX_LOT_RANGE_WIDTH`].
pub fn lot_range(token: &str) -> Option<(u32, u32)> {
    let caps = LOT_RANGE_RE.captures(token.trim())?;
    let start: u32 = caps[1].parse().ok()?;
    let end: u32 = caps[2].parse().ok()?;
    (start <= end && end - start <= MAX_LOT_RANGE_WIDTH).then_some((start, end))
}

// ── Charges ──

pub fn has_total_radiation(text: &str) -> bool {
    RADIATION_RE.is_match(text)
}

/// A `Formalité N ...: description` marker with the window of text it governs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubChargeMarker<'a> {
    pub number: &'a str,
    pub description: &'a str,
    pub window: &'a str,
}

pub fn sub_charge_markers(text: &str) -> Vec<SubChargeMarker<'_>> {
    SUB_CHARGE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let start = whole.end();
            let end = SUB_CHARGE_START_RE
                .find(&text[start..])
                .map(|m| start + m.start())
                .unwrap_or(text.len());
            Some(SubChargeMarker {
                number: caps.get(1)?.as_str(),
                description: caps.get(2)?.as_str().trim(),
                window: &text[start..end],
            })
        })
        .collect()
}

pub fn exigibility_dates(window: &str) -> Vec<String> {
    all_groups(&EXIGIBILITY_RE, window)
}

pub fn effect_dates(window: &str) -> Vec<String> {
    all_groups(&EFFECT_RE, window)
}

pub fn principal_amounts(window: &str) -> Vec<String> {
    all_groups(&PRINCIPAL_RE, window)
}

// ── Dates ──

pub fn parse_dmy(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").ok()
}

fn first_group<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn all_groups(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_across_line_breaks() {
        assert!(is_formality_header("Relevé des\nformalités -   Publication\nPAGE 3"));
        assert!(is_formality_header("RELEVÉ DES FORMALITÉS - CHARGE"));
        assert!(is_formality_header("Relevé des formalités — Volumétrie"));
        assert!(!is_formality_header("Relevé des formalités - Sommaire"));
        assert!(!is_formality_header("Immeubles issus de la demande"));
    }

    #[test]
    fn category_strips_page_marker() {
        assert_eq!(
            category_label("Relevé des formalités - Publication PAGE 3 À PAGE 4\nsuite"),
            Some("Publication")
        );
        assert_eq!(
            category_label("Relevé des formalités - Formalités en attente\nx"),
            Some("Formalités en attente")
        );
        assert_eq!(category_label("Relevé des formalités - Charge"), Some("Charge"));
        assert_eq!(category_label("nothing here"), None);
    }

    #[test]
    fn page_spans() {
        assert_eq!(page_span("VENTE PAGE 3 À PAGE 5"), Some((3, 5)));
        assert_eq!(page_span("page 12 à page 14"), Some((12, 14)));
        assert_eq!(page_span("PAGE 7 A PAGE 7"), Some((7, 7)));
        assert_eq!(page_span("PAGE 2 TO PAGE 9"), Some((2, 9)));
        assert_eq!(page_span("PAGE 3"), None);
    }

    #[test]
    fn deed_and_filing_dates() {
        assert_eq!(deed_date("Date de l'acte : 12/03/2015"), Some("12/03/2015"));
        assert_eq!(deed_date("date de l’acte: 01/01/2020 Nature"), Some("01/01/2020"));
        assert_eq!(deed_date("date de l'acte : 2015-03-12"), None);
        assert_eq!(filing_date("Date de dépôt : 20/04/2015"), Some("20/04/2015"));
        assert_eq!(filing_date("DATE DE DÉPÔT : 20/04/2015"), Some("20/04/2015"));
    }

    #[test]
    fn price_phrase() {
        assert_eq!(price("Prix / évaluation : 250 000,00 EUR").as_deref(), Some("250 000,00"));
        assert_eq!(price("prix : 1.500 eur").as_deref(), Some("1.500"));
        assert_eq!(price("prix non communiqué"), None);
    }

    #[test]
    fn beneficiary_row_shapes() {
        assert!(is_birth_date("02/05/1961"));
        assert!(!is_birth_date("1961"));
        assert!(is_identity_number("552 100 554"));
        assert!(is_identity_number("552100554"));
        assert!(is_identity_number("55210055400012"));
        assert!(!is_identity_number("5521"));
        assert!(!is_identity_number("SCI 552"));
        assert!(is_short_code("BD 10"));
        assert!(is_short_code("AB 123"));
        assert!(!is_short_code("DUPONT Jean"));
    }

    #[test]
    fn beneficiary_reference() {
        assert_eq!(beneficiary_ref("Bénéficiaire : 2 - Toute propriété"), Some("2"));
        assert_eq!(beneficiary_ref("BÉNÉFICIAIRE: 11"), Some("11"));
        assert_eq!(beneficiary_ref("Bénéficiaire : - usufruit"), None);
    }

    #[test]
    fn lot_ranges() {
        assert_eq!(lot_range("145 à 147"), Some((145, 147)));
        assert_eq!(lot_range("145 to 147"), Some((145, 147)));
        assert_eq!(lot_range(" 3à5 "), Some((3, 5)));
        assert_eq!(lot_range("12 à 9"), None);
        assert_eq!(lot_range("1 à x"), None);
        assert_eq!(lot_range("1 à 10001"), Some((1, 10_001)));
        assert_eq!(lot_range("1 à 10002"), None);
        assert_eq!(lot_range("1 à 60000000"), None);
        assert!(looks_like_range("1 à x"));
        assert!(looks_like_range("4 TO 6"));
        assert!(!looks_like_range("144"));
    }

    #[test]
    fn radiation_marker() {
        assert!(has_total_radiation("Radiation totale le 03/02/2010"));
        assert!(has_total_radiation("RADIATION SIMPLIFIÉE TOTALE"));
        assert!(has_total_radiation("radiation simplifiee   totale"));
        assert!(!has_total_radiation("Radiation partielle"));
        assert!(!has_total_radiation("radiation simplifiée partielle"));
    }

    #[test]
    fn sub_charge_windows() {
        let text = "Formalité 1 du 02/02/2010 : Hypothèque conventionnelle\n\
                    Date d'extrême exigibilité : 01/01/2020\n\
                    Montant principal : 150 000,00 EUR\n\
                    Formalité 2 : Privilège de prêteur de deniers\n\
                    Date d'extrême effet : 01/01/2030\n\
                    Date d'extrême effet : 01/01/2030\n";
        let markers = sub_charge_markers(text);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].number, "1");
        assert_eq!(markers[0].description, "Hypothèque conventionnelle");
        assert_eq!(exigibility_dates(markers[0].window), vec!["01/01/2020"]);
        assert_eq!(principal_amounts(markers[0].window), vec!["150 000,00"]);
        assert!(effect_dates(markers[0].window).is_empty());
        assert_eq!(markers[1].description, "Privilège de prêteur de deniers");
        assert_eq!(effect_dates(markers[1].window), vec!["01/01/2030", "01/01/2030"]);
    }

    #[test]
    fn dmy_dates() {
        assert_eq!(parse_dmy("01/02/2020"), NaiveDate::from_ymd_opt(2020, 2, 1));
        assert_eq!(parse_dmy("31/02/2020"), None);
        assert_eq!(parse_dmy("2020-02-01"), None);
    }
}
