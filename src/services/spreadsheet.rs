//! Reading uploaded lead files into header + rows of text cells

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::ImportError;

/// First worksheet (or the CSV) as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    /// Data rows, fully blank rows removed
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Workbook,
    Delimited,
}

fn file_kind(file_name: &str) -> Result<FileKind, ImportError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xlsx" | "xls" => Ok(FileKind::Workbook),
        "csv" | "txt" => Ok(FileKind::Delimited),
        _ => Err(ImportError::UnsupportedFormat(file_name.to_string())),
    }
}

/// Read a file by its extension (.xlsx, .xls, .csv, .txt)
pub fn read_spreadsheet(file_name: &str, bytes: &[u8]) -> Result<Sheet, ImportError> {
    let rows = match file_kind(file_name)? {
        FileKind::Workbook => read_workbook(bytes)?,
        FileKind::Delimited => read_delimited(bytes)?,
    };
    Ok(into_sheet(rows))
}

fn into_sheet(rows: Vec<Vec<String>>) -> Sheet {
    let mut rows = rows.into_iter();
    let headers = rows
        .next()
        .map(|h| h.into_iter().map(|c| c.trim().to_string()).collect())
        .unwrap_or_default();
    let rows = rows
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .collect();
    Sheet { headers, rows }
}

/// Render a cell the way a user sees it. Whole floats lose their ".0".
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<String>>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Read(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Read("workbook has no worksheets".to_string()))?
        .map_err(|e| ImportError::Read(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

/// Pick the delimiter occurring most often in the header line
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    [b',', b';', b'\t']
        .into_iter()
        .map(|d| (d, header.bytes().filter(|&b| b == d).count()))
        .fold((b',', 0), |best, cur| if cur.1 > best.1 { cur } else { best })
        .0
}

fn read_delimited(bytes: &[u8]) -> Result<Vec<Vec<String>>, ImportError> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}');

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(text))
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ImportError::Read(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_csv() {
        let csv = "Full Name,Email,Phone,Country\nAda Lovelace,ada@example.com,123,UK\n";
        let sheet = read_spreadsheet("leads.csv", csv.as_bytes()).unwrap();
        assert_eq!(sheet.headers, vec!["Full Name", "Email", "Phone", "Country"]);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0][1], "ada@example.com");
    }

    #[test]
    fn test_semicolon_and_tab_are_sniffed() {
        let csv = "Name;Email;Phone;Country\nAda;ada@example.com;1;UK\n";
        let sheet = read_spreadsheet("leads.CSV", csv.as_bytes()).unwrap();
        assert_eq!(sheet.headers.len(), 4);
        assert_eq!(sheet.rows[0][3], "UK");

        let tsv = "Name\tEmail\tPhone\tCountry\nAda\tada@example.com\t1\tUK\n";
        let sheet = read_spreadsheet("leads.txt", tsv.as_bytes()).unwrap();
        assert_eq!(sheet.rows[0], vec!["Ada", "ada@example.com", "1", "UK"]);
    }

    #[test]
    fn test_quoted_fields_keep_commas() {
        let csv = "Name,Email,Phone,Country\n\"Lovelace, Ada\",ada@example.com,1,UK\n";
        let sheet = read_spreadsheet("leads.csv", csv.as_bytes()).unwrap();
        assert_eq!(sheet.rows[0][0], "Lovelace, Ada");
    }

    #[test]
    fn test_blank_rows_dropped_and_bom_stripped() {
        let csv = "\u{feff}Name,Email\n\n , \nAda,ada@example.com\n";
        let sheet = read_spreadsheet("leads.csv", csv.as_bytes()).unwrap();
        assert_eq!(sheet.headers[0], "Name");
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn test_empty_file_has_no_headers() {
        let sheet = read_spreadsheet("leads.csv", b"").unwrap();
        assert!(sheet.headers.is_empty());
        assert!(sheet.rows.is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        assert_eq!(
            read_spreadsheet("leads.pdf", b"%PDF").unwrap_err(),
            ImportError::UnsupportedFormat("leads.pdf".to_string())
        );
        assert!(matches!(
            read_spreadsheet("leads", b"x"),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_corrupt_workbook_is_read_error() {
        assert!(matches!(
            read_spreadsheet("leads.xlsx", b"definitely not a zip"),
            Err(ImportError::Read(_))
        ));
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell_to_string(&Data::Float(420123456.0)), "420123456");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("x".into())), "x");
    }
}
