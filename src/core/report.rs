use crate::domain::model::ScanResult;
use crate::utils::error::{Result, ScanError};

pub const NO_PAIRS_MESSAGE: &str = "No new pairs found or unable to fetch data.";

/// 純文字表格：Pair | Status
pub fn render_table(results: &[ScanResult]) -> String {
    if results.is_empty() {
        return NO_PAIRS_MESSAGE.to_string();
    }

    let statuses: Vec<String> = results.iter().map(|r| r.verdict.to_string()).collect();
    let name_width = results
        .iter()
        .map(|r| r.name.chars().count())
        .chain(std::iter::once("Pair".len()))
        .max()
        .unwrap_or(4);

    let mut lines = vec![
        format!("{:<width$}  {}", "Pair", "Status", width = name_width),
        format!("{}  {}", "-".repeat(name_width), "-".repeat(6)),
    ];
    for (result, status) in results.iter().zip(&statuses) {
        lines.push(format!("{:<width$}  {}", result.name, status, width = name_width));
    }

    lines.join("\n")
}

pub fn render_json(results: &[ScanResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

pub fn render_csv(results: &[ScanResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "contract_address", "status"])?;

    for result in results {
        writer.write_record([
            result.name.as_str(),
            result.contract_address.as_str(),
            result.verdict.label(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| ScanError::IoError(e.into_error()))?;
    into_text(bytes)
}

fn into_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| ScanError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
