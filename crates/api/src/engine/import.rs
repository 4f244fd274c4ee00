//! Recipient spreadsheet parsing.
//!
//! Imports tolerate messy real-world files: flexible column names,
//! arbitrary extra columns, and bad rows that are reported instead of
//! aborting the upload. Row numbers in errors are 1-based file rows
//! with the header counted, so they match what the organizer sees in
//! their spreadsheet program.

use std::collections::HashSet;

use sherehe_core::error::CoreError;
use sherehe_core::phone::normalize_phone;
use sherehe_db::models::recipient::ImportRowError;

/// Recognized header names for the phone column.
const PHONE_HEADERS: &[&str] = &["phone", "phone_number", "phonenumber", "msisdn", "mobile", "number", "simu"];

/// Recognized header names for the optional name column.
const NAME_HEADERS: &[&str] = &["name", "guest", "guest_name", "guestname", "full_name", "jina"];

/// One importable row that survived validation.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedRecipient {
    /// 1-based file row (header is row 1).
    pub row: usize,
    /// Canonical `255XXXXXXXXX` phone.
    pub phone: String,
    pub name: Option<String>,
}

/// Outcome of parsing one uploaded file against the campaign's
/// existing recipients.
#[derive(Debug)]
pub struct ImportPlan {
    pub rows: Vec<ParsedRecipient>,
    pub errors: Vec<ImportRowError>,
    /// Data rows seen in the file (header excluded).
    pub total: usize,
}

/// Parse a CSV upload into an import plan.
///
/// `existing` holds the canonical phones already on the campaign;
/// rows colliding with it, or with an earlier row of the same file,
/// become row errors rather than duplicates in the plan.
pub fn parse_recipients(bytes: &[u8], existing: &HashSet<String>) -> Result<ImportPlan, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| CoreError::Validation(format!("Unreadable file header: {e}")))?
        .clone();

    let phone_col = find_column(&headers, PHONE_HEADERS)
        .ok_or_else(|| CoreError::Validation("No phone column found in file".to_string()))?;
    let name_col = find_column(&headers, NAME_HEADERS);

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut total = 0;

    for (index, record) in reader.records().enumerate() {
        total += 1;
        // Header is file row 1, first data row is 2.
        let row = index + 2;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                errors.push(ImportRowError {
                    row,
                    error: format!("Unreadable row: {e}"),
                });
                continue;
            }
        };

        let raw_phone = record.get(phone_col).unwrap_or("").trim();
        if raw_phone.is_empty() {
            errors.push(ImportRowError {
                row,
                error: "Missing phone number".to_string(),
            });
            continue;
        }

        let Some(phone) = normalize_phone(raw_phone) else {
            errors.push(ImportRowError {
                row,
                error: format!("Invalid phone number: {raw_phone}"),
            });
            continue;
        };

        if existing.contains(&phone) {
            errors.push(ImportRowError {
                row,
                error: format!("Phone {phone} is already in this campaign"),
            });
            continue;
        }
        if !seen.insert(phone.clone()) {
            errors.push(ImportRowError {
                row,
                error: format!("Duplicate phone {phone} in file"),
            });
            continue;
        }

        let name = name_col
            .and_then(|col| record.get(col))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        rows.push(ParsedRecipient { row, phone, name });
    }

    Ok(ImportPlan {
        rows,
        errors,
        total,
    })
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let normalized = header.trim().to_lowercase().replace([' ', '-'], "_");
        candidates.contains(&normalized.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_existing() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn parses_well_formed_file() {
        let csv = b"name,phone\nAmina,0712345678\nJuma,+255 765 432 109\n";
        let plan = parse_recipients(csv, &no_existing()).unwrap();

        assert_eq!(plan.total, 2);
        assert!(plan.errors.is_empty());
        assert_eq!(plan.rows[0].phone, "255712345678");
        assert_eq!(plan.rows[0].name.as_deref(), Some("Amina"));
        assert_eq!(plan.rows[1].phone, "255765432109");
    }

    #[test]
    fn flexible_header_names_are_accepted() {
        let csv = b"Guest Name,Phone Number\nAmina,0712345678\n";
        let plan = parse_recipients(csv, &no_existing()).unwrap();
        assert_eq!(plan.rows.len(), 1);
        assert_eq!(plan.rows[0].name.as_deref(), Some("Amina"));
    }

    #[test]
    fn missing_phone_column_rejects_the_file() {
        let csv = b"name,email\nAmina,amina@example.com\n";
        let err = parse_recipients(csv, &no_existing()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn bad_rows_are_reported_not_fatal() {
        let csv = b"phone,name\n0712345678,Amina\n,\n12345,Bad\n0712345678,Dup\n";
        let plan = parse_recipients(csv, &no_existing()).unwrap();

        assert_eq!(plan.total, 4);
        assert_eq!(plan.rows.len(), 1);
        assert_eq!(plan.errors.len(), 3);
        // Row numbers count the header, so the first data row is 2.
        assert_eq!(plan.errors[0].row, 3);
        assert!(plan.errors[0].error.contains("Missing phone"));
        assert!(plan.errors[1].error.contains("Invalid phone"));
        assert!(plan.errors[2].error.contains("Duplicate phone"));
    }

    #[test]
    fn phones_already_on_the_campaign_are_rejected() {
        let mut existing = HashSet::new();
        existing.insert("255712345678".to_string());

        let csv = b"phone\n0712345678\n";
        let plan = parse_recipients(csv, &existing).unwrap();
        assert!(plan.rows.is_empty());
        assert!(plan.errors[0].error.contains("already in this campaign"));
    }

    #[test]
    fn missing_name_cell_is_none() {
        let csv = b"phone,name\n0712345678,\n";
        let plan = parse_recipients(csv, &no_existing()).unwrap();
        assert_eq!(plan.rows[0].name, None);
    }
}
