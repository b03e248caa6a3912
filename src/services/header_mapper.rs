//! Spreadsheet header to lead field mapping
//!
//! Headers are compared case- and whitespace-insensitively against a static
//! alias table. For each field the first header (left to right) that matches
//! one of its aliases wins.

use serde::Serialize;

use crate::error::ImportError;

/// Lead field a spreadsheet column can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Name,
    FirstName,
    LastName,
    Email,
    Phone,
    Source,
    Status,
    Country,
    Comments,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::FirstName => "firstName",
            CanonicalField::LastName => "lastName",
            CanonicalField::Email => "email",
            CanonicalField::Phone => "phone",
            CanonicalField::Source => "source",
            CanonicalField::Status => "status",
            CanonicalField::Country => "country",
            CanonicalField::Comments => "comments",
        }
    }

    /// Header spellings accepted for this field, already normalized
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::Name => &[
                "name", "fullname", "leadname", "contactname", "clientname", "customername",
                "contact",
            ],
            CanonicalField::FirstName => &["firstname", "first", "givenname", "forename", "fname"],
            CanonicalField::LastName => &["lastname", "last", "surname", "familyname", "lname"],
            CanonicalField::Email => &["email", "e-mail", "emailaddress", "e-mailaddress", "mail"],
            CanonicalField::Phone => &[
                "phone", "phonenumber", "telephone", "tel", "mobile", "mobilenumber", "cell",
                "contactnumber", "number",
            ],
            // "origin" is shared with country on purpose: some exports use it for either
            CanonicalField::Source => &["source", "leadsource", "origin", "channel", "campaign", "utmsource"],
            CanonicalField::Status => &["status", "leadstatus", "stage"],
            CanonicalField::Country => &["country", "countryname", "countrycode", "nation", "origin", "geo"],
            CanonicalField::Comments => &["comments", "comment", "notes", "note", "remarks", "description"],
        }
    }
}

/// Lowercase and drop all whitespace
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn find_column(normalized: &[String], field: CanonicalField) -> Option<usize> {
    let aliases = field.aliases();
    normalized.iter().position(|h| aliases.contains(&h.as_str()))
}

/// Column index per lead field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMapping {
    pub name: Option<usize>,
    pub first_name: Option<usize>,
    pub last_name: Option<usize>,
    pub email: Option<usize>,
    pub phone: Option<usize>,
    pub source: Option<usize>,
    pub status: Option<usize>,
    pub country: Option<usize>,
    pub comments: Option<usize>,
}

/// Resolve the columns of a header row
pub fn map_headers<S: AsRef<str>>(headers: &[S]) -> HeaderMapping {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();

    let country = find_column(&normalized, CanonicalField::Country);
    let source = find_column(&normalized, CanonicalField::Source).filter(|&idx| Some(idx) != country);

    HeaderMapping {
        name: find_column(&normalized, CanonicalField::Name),
        first_name: find_column(&normalized, CanonicalField::FirstName),
        last_name: find_column(&normalized, CanonicalField::LastName),
        email: find_column(&normalized, CanonicalField::Email),
        phone: find_column(&normalized, CanonicalField::Phone),
        source,
        status: find_column(&normalized, CanonicalField::Status),
        country,
        comments: find_column(&normalized, CanonicalField::Comments),
    }
}

impl HeaderMapping {
    /// Name is satisfied by a full-name column or by first and last name columns.
    pub fn has_name(&self) -> bool {
        self.name.is_some() || (self.first_name.is_some() && self.last_name.is_some())
    }

    /// Required fields that did not resolve, in canonical order
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        let mut missing = Vec::new();
        if !self.has_name() {
            missing.push(CanonicalField::Name);
        }
        if self.email.is_none() {
            missing.push(CanonicalField::Email);
        }
        if self.phone.is_none() {
            missing.push(CanonicalField::Phone);
        }
        if self.country.is_none() {
            missing.push(CanonicalField::Country);
        }
        missing
    }

    pub fn validate(&self) -> Result<(), ImportError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingHeaders(missing))
        }
    }
}
