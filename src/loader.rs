use std::path::Path;

use sqlx::{Pool, Sqlite};

use crate::{
    actions::{create_ingredient, create_tag},
    error::{Error, HtmlError},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub created: usize,
    pub skipped: usize,
}

/// Splits CSV text into records of trimmed fields. Double quotes group fields, may span
/// lines, and `""` inside them is a literal quote. Blank lines are dropped.
pub fn split_csv(content: &str) -> Vec<Vec<String>> {
    let mut records = vec![];
    let mut record = vec![];
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = content.chars().peekable();

    let mut end_record = |record: &mut Vec<String>, field: &mut String| {
        record.push(std::mem::take(field).trim().to_string());
        let done = std::mem::take(record);
        if done.iter().any(|field| !field.is_empty()) {
            records.push(done);
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => record.push(std::mem::take(&mut field).trim().to_string()),
            '\r' if !quoted && chars.peek() == Some(&'\n') => {}
            '\n' if !quoted => end_record(&mut record, &mut field),
            c => field.push(c),
        }
    }
    end_record(&mut record, &mut field);

    records
}

async fn read_records(path: &Path) -> Result<Vec<Vec<String>>, Error> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        HtmlError::InvalidRequest.new(&format!("Failed to read {}: {e}", path.display()))
    })?;

    Ok(split_csv(&content))
}

/// Loads `name,measurement_unit` rows. Existing pairs are skipped.
pub async fn load_ingredients(path: &Path, pool: &Pool<Sqlite>) -> Result<LoadReport, Error> {
    let mut report = LoadReport::default();

    for (index, record) in read_records(path).await?.iter().enumerate() {
        match record.as_slice() {
            [name, unit] if !name.is_empty() && !unit.is_empty() => {
                if create_ingredient(name, unit, pool).await? {
                    report.created += 1;
                } else {
                    report.skipped += 1;
                }
            }
            _ => {
                log::warn!("Skipping malformed ingredient record {}", index + 1);
                report.skipped += 1;
            }
        }
    }

    log::info!(
        "Loaded ingredients from {}: {} created, {} skipped",
        path.display(),
        report.created,
        report.skipped
    );
    Ok(report)
}

/// Loads `name,color,slug` rows. Colors are `#` followed by 3 or 6 hex digits.
pub async fn load_tags(path: &Path, pool: &Pool<Sqlite>) -> Result<LoadReport, Error> {
    let mut report = LoadReport::default();

    for (index, record) in read_records(path).await?.iter().enumerate() {
        match record.as_slice() {
            [name, color, slug] if !name.is_empty() && is_hex_color(color) && is_slug(slug) => {
                if create_tag(name, &color.to_uppercase(), slug, pool).await? {
                    report.created += 1;
                } else {
                    report.skipped += 1;
                }
            }
            _ => {
                log::warn!("Skipping malformed tag record {}", index + 1);
                report.skipped += 1;
            }
        }
    }

    log::info!(
        "Loaded tags from {}: {} created, {} skipped",
        path.display(),
        report.created,
        report.skipped
    );
    Ok(report)
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
