//! Per-page identifier extraction.
//!
//! A DSLIP page carries its policy number on a line that starts with the
//! `COMPAGNIA` label, followed by whitespace separated tokens (company name,
//! policy number, ...). Only tokens that are known identifiers count, so the
//! lookup set constrains what is extracted.

use lazy_static::lazy_static;
use regex::Regex;

use crate::reference::{normalize, IdentifierLookup};
use crate::source::PageSource;

/// Label that starts the candidate line.
pub const COMPANY_LABEL: &str = "COMPAGNIA";

lazy_static! {
    /// `CLIENTE` followed by the client name
    static ref CLIENT_RE: Regex = Regex::new(r"CLIENTE\s+([A-Z0-9' .,&/-]+)").unwrap();
}

/// What was extracted from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// 1-based page number
    pub page_number: u32,
    /// First valid identifier on the `COMPAGNIA` line
    pub extracted_identifier: Option<String>,
    /// First token containing a digit on the `COMPAGNIA` line, kept when no
    /// valid identifier matched (informational, never used for matching)
    pub candidate_identifier: Option<String>,
    /// Client name printed after `CLIENTE` (informational)
    pub extracted_client_label: Option<String>,
}

/// Extract the record of one page from its text.
pub fn extract_page<L>(page_number: u32, text: &str, identifiers: &L) -> PageRecord
where
    L: IdentifierLookup + ?Sized,
{
    let line = company_line(text);
    let extracted_identifier = line.and_then(|line| find_identifier(line, identifiers));
    let candidate_identifier = match extracted_identifier {
        Some(_) => None,
        None => line.and_then(find_candidate),
    };

    PageRecord {
        page_number,
        extracted_identifier,
        candidate_identifier,
        extracted_client_label: find_client_label(text),
    }
}

/// First line starting with the `COMPAGNIA` label.
pub fn company_line(text: &str) -> Option<&str> {
    text.lines().find(|line| line.starts_with(COMPANY_LABEL))
}

/// Leftmost valid token of a `COMPAGNIA` line, label token excluded.
pub fn find_identifier<L>(line: &str, identifiers: &L) -> Option<String>
where
    L: IdentifierLookup + ?Sized,
{
    line.split_whitespace()
        .skip(1)
        .map(normalize)
        .find(|candidate| {
            let known = identifiers.contains_identifier(candidate);
            log::debug!("Token {:?}: {}", candidate, if known { "known" } else { "unknown" });
            known
        })
}

fn find_candidate(line: &str) -> Option<String> {
    line.split_whitespace()
        .skip(1)
        .find(|token| token.chars().any(|c| c.is_ascii_digit()))
        .map(normalize)
}

/// Client name following the `CLIENTE` label anywhere on the page.
pub fn find_client_label(text: &str) -> Option<String> {
    CLIENT_RE
        .captures(text)
        .map(|caps| normalize(&caps[1]))
        .filter(|label| !label.is_empty())
}

/// Extract one record per page of `source`, in page order.
///
/// A page whose text cannot be extracted is treated as empty.
pub fn extract_pages<S, L>(source: &S, identifiers: &L) -> Vec<PageRecord>
where
    S: PageSource + ?Sized,
    L: IdentifierLookup + ?Sized,
{
    (1..=source.page_count())
        .map(|page_number| {
            let text = source.page_text(page_number).unwrap_or_else(|e| {
                log::warn!("Page {}: text extraction failed: {}", page_number, e);
                String::new()
            });
            let record = extract_page(page_number, &text, identifiers);
            match &record.extracted_identifier {
                Some(id) => log::info!("Page {}: found identifier {}", page_number, id),
                None => log::warn!("Page {}: no identifier found", page_number),
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_leftmost_valid_token_wins() {
        let text = "COMPAGNIA AAA BBB";
        assert_eq!(find_identifier(text, &ids(&["BBB"])), Some("BBB".to_string()));
        assert_eq!(find_identifier(text, &ids(&["AAA", "BBB"])), Some("AAA".to_string()));
    }

    #[test]
    fn test_tokens_are_normalized_before_lookup() {
        let text = "COMPAGNIA Generali ab-12 altro";
        assert_eq!(find_identifier(text, &ids(&["AB-12"])), Some("AB-12".to_string()));
    }

    #[test]
    fn test_label_token_is_never_a_candidate() {
        let text = "COMPAGNIA X1";
        assert_eq!(find_identifier(text, &ids(&["COMPAGNIA"])), None);
        assert_eq!(find_identifier("COMPAGNIA: X1", &ids(&["X1"])), Some("X1".to_string()));
    }

    #[test]
    fn test_only_first_label_line_is_scanned() {
        let text = "intestazione\nCOMPAGNIA nulla qui\nCOMPAGNIA X1\n";
        assert_eq!(company_line(text), Some("COMPAGNIA nulla qui"));
        assert_eq!(extract_page(1, text, &ids(&["X1"])).extracted_identifier, None);
    }

    #[test]
    fn test_label_is_case_sensitive_and_anchored() {
        assert_eq!(company_line("compagnia X1"), None);
        assert_eq!(company_line("  COMPAGNIA X1"), None);
    }

    #[test]
    fn test_no_label_line() {
        let record = extract_page(2, "CLIENTE ROSSI\nX1", &ids(&["X1"]));
        assert_eq!(record.extracted_identifier, None);
        assert_eq!(record.candidate_identifier, None);
        assert_eq!(extract_page(3, "", &ids(&["X1"])).extracted_identifier, None);
    }

    #[test]
    fn test_unknown_identifier_kept_as_candidate() {
        let record = extract_page(3, "COMPAGNIA ALLIANZ x9 ROMA", &ids(&["X1"]));
        assert_eq!(record.extracted_identifier, None);
        assert_eq!(record.candidate_identifier.as_deref(), Some("X9"));

        let matched = extract_page(1, "COMPAGNIA ALLIANZ X1 Q2", &ids(&["X1"]));
        assert_eq!(matched.extracted_identifier.as_deref(), Some("X1"));
        assert_eq!(matched.candidate_identifier, None);
    }

    #[test]
    fn test_client_label() {
        assert_eq!(
            find_client_label("POLIZZA\nCLIENTE O'BRIEN & FIGLI S.R.L.\nALTRO"),
            Some("O'BRIEN & FIGLI S.R.L.".to_string())
        );
        assert_eq!(find_client_label("CLIENTE   ROSSI MARIO  \n"), Some("ROSSI MARIO".to_string()));
        assert_eq!(find_client_label("nessun cliente"), None);
    }

    #[test]
    fn test_client_label_stops_at_disallowed_character() {
        assert_eq!(find_client_label("CLIENTE ROSSI (MI)"), Some("ROSSI".to_string()));
    }

    #[test]
    fn test_extract_page_is_deterministic() {
        let text = "COMPAGNIA ACME X1 X2\nCLIENTE ROSSI";
        let set = ids(&["X1", "X2"]);
        let first = extract_page(4, text, &set);
        let second = extract_page(4, text, &set);
        assert_eq!(first, second);
        assert_eq!(first.page_number, 4);
        assert_eq!(first.extracted_identifier.as_deref(), Some("X1"));
        assert_eq!(first.extracted_client_label.as_deref(), Some("ROSSI"));
    }

    #[test]
    fn test_client_label_independent_of_identifier() {
        let record = extract_page(1, "CLIENTE BIANCHI", &ids(&[]));
        assert_eq!(record.extracted_identifier, None);
        assert_eq!(record.extracted_client_label.as_deref(), Some("BIANCHI"));
    }
}
