//! Candidate lead extraction from spreadsheet rows

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ImportError;
use crate::services::header_mapper::HeaderMapping;
use crate::types::{LeadInput, NEW_STATUS};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex compiles"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Split a full name into (first, last). The first token is the first name,
/// the rest joined by single spaces is the last name.
pub fn split_full_name(full: &str) -> (String, String) {
    let mut tokens = full.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_string();
    let last = tokens.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Rows that survived extraction, plus counts for the user
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub leads: Vec<LeadInput>,
    pub total_rows: usize,
    pub skipped: usize,
}

fn cell(row: &[String], column: Option<usize>) -> Option<&str> {
    column
        .and_then(|idx| row.get(idx))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn resolve_name(row: &[String], mapping: &HeaderMapping) -> Option<(String, String)> {
    if let Some(full) = cell(row, mapping.name) {
        return Some(split_full_name(full));
    }
    let first = cell(row, mapping.first_name)?;
    let last = cell(row, mapping.last_name).unwrap_or_default();
    Some((first.to_string(), last.to_string()))
}

/// Extract one row, or None when it must be skipped
pub fn extract_row(row: &[String], mapping: &HeaderMapping) -> Option<LeadInput> {
    let (first_name, last_name) = resolve_name(row, mapping)?;
    let email = cell(row, mapping.email).filter(|e| is_valid_email(e))?;

    Some(LeadInput {
        first_name,
        last_name,
        email: email.to_string(),
        phone: cell(row, mapping.phone).unwrap_or_default().to_string(),
        country: cell(row, mapping.country).unwrap_or_default().to_string(),
        source: cell(row, mapping.source).map(str::to_string),
        status: Some(cell(row, mapping.status).unwrap_or(NEW_STATUS).to_string()),
        comments: cell(row, mapping.comments).map(str::to_string),
        import_id: None,
    })
}

/// Extract all rows. Invalid rows are counted, not reported.
pub fn extract_leads(rows: &[Vec<String>], mapping: &HeaderMapping) -> Result<Extraction, ImportError> {
    let leads: Vec<LeadInput> = rows.iter().filter_map(|row| extract_row(row, mapping)).collect();

    if leads.is_empty() {
        return Err(ImportError::NoValidLeads);
    }

    Ok(Extraction {
        total_rows: rows.len(),
        skipped: rows.len() - leads.len(),
        leads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::header_mapper::map_headers;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn standard_mapping() -> HeaderMapping {
        map_headers(&["Full Name", "Email", "Phone", "Country", "Status", "Notes"])
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada lovelace@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_split_full_name() {
        assert_eq!(split_full_name("Ada Lovelace"), ("Ada".into(), "Lovelace".into()));
        assert_eq!(
            split_full_name("  Juan   Carlos  de la Cruz "),
            ("Juan".into(), "Carlos de la Cruz".into())
        );
        assert_eq!(split_full_name("Cher"), ("Cher".into(), String::new()));
    }

    #[test]
    fn test_invalid_email_rows_are_skipped() {
        let rows = vec![
            row(&["Ada Lovelace", "ada@example.com", "123", "UK", "", ""]),
            row(&["Bad Row", "not-an-email", "456", "US", "", ""]),
            row(&["No Mail", "", "789", "US", "", ""]),
            row(&["", "nameless@example.com", "000", "US", "", ""]),
        ];
        let extraction = extract_leads(&rows, &standard_mapping()).unwrap();
        assert_eq!(extraction.total_rows, 4);
        assert_eq!(extraction.skipped, 3);
        assert_eq!(extraction.leads.len(), 1);
        assert_eq!(extraction.leads[0].email, "ada@example.com");
    }

    #[test]
    fn test_status_defaults_to_new() {
        let rows = vec![
            row(&["Ada Lovelace", "ada@example.com", "123", "UK", "  ", "VIP"]),
            row(&["Bo Diddley", "bo@example.com", "456", "US", "Contacted", ""]),
        ];
        let extraction = extract_leads(&rows, &standard_mapping()).unwrap();
        assert_eq!(extraction.leads[0].status.as_deref(), Some(NEW_STATUS));
        assert_eq!(extraction.leads[0].comments.as_deref(), Some("VIP"));
        assert_eq!(extraction.leads[1].status.as_deref(), Some("Contacted"));
        assert_eq!(extraction.leads[1].comments, None);
    }

    #[test]
    fn test_status_defaults_when_unmapped() {
        let mapping = map_headers(&["Name", "Email", "Phone", "Country"]);
        let lead = extract_row(&row(&["Cher", "cher@example.com", "1", "US"]), &mapping).unwrap();
        assert_eq!(lead.status.as_deref(), Some(NEW_STATUS));
        assert_eq!(lead.first_name, "Cher");
        assert_eq!(lead.last_name, "");
    }

    #[test]
    fn test_separate_name_columns() {
        let mapping = map_headers(&["First Name", "Last Name", "Email", "Phone", "Country"]);
        let lead = extract_row(
            &row(&[" Grace ", "Hopper", "grace@navy.mil", "1", "US"]),
            &mapping,
        )
        .unwrap();
        assert_eq!(lead.first_name, "Grace");
        assert_eq!(lead.last_name, "Hopper");
    }

    #[test]
    fn test_short_rows_do_not_panic() {
        let lead = extract_row(&row(&["Ada Lovelace", "ada@example.com"]), &standard_mapping()).unwrap();
        assert_eq!(lead.phone, "");
        assert_eq!(lead.country, "");
    }

    #[test]
    fn test_no_valid_rows() {
        let rows = vec![row(&["Bad Row", "not-an-email", "456", "US", "", ""])];
        assert_eq!(
            extract_leads(&rows, &standard_mapping()).unwrap_err(),
            ImportError::NoValidLeads
        );
        assert_eq!(extract_leads(&[], &standard_mapping()).unwrap_err(), ImportError::NoValidLeads);
    }
}
