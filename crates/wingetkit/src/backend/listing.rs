//! Parser for the tabular output of `winget list`.
//!
//! winget prints a header row, a dashed separator, then fixed-width rows.
//! Column boundaries are taken from where each header word starts, which
//! keeps the parser independent of the header's display language. Spinner
//! frames written with carriage returns before the table are discarded.

use crate::error::{Error, Result};
use crate::types::InstalledPackage;

const MIN_SEPARATOR_LEN: usize = 10;

/// Parse `winget list` output into installed packages.
pub fn parse_list_output(output: &str) -> Result<Vec<InstalledPackage>> {
    let lines: Vec<&str> = output.lines().map(strip_progress).collect();

    let separator = lines
        .iter()
        .position(|line| is_separator(line))
        .ok_or_else(|| Error::ListingParse {
            message: "no table separator in output".to_string(),
        })?;

    let header = lines[..separator]
        .iter()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| Error::ListingParse {
            message: "no header above table separator".to_string(),
        })?;

    let columns = column_starts(header);
    if columns.len() < 3 {
        return Err(Error::ListingParse {
            message: format!("expected at least 3 columns, found {}", columns.len()),
        });
    }
    let has_available = columns.len() >= 5;

    let mut packages = Vec::new();
    for line in &lines[separator + 1..] {
        if line.trim().is_empty() {
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        let name = field(&chars, &columns, 0);
        let id = field(&chars, &columns, 1);
        let version = field(&chars, &columns, 2);

        if id.is_empty() || version.is_empty() {
            log::debug!("skipping listing row: {}", line.trim());
            continue;
        }
        // A truncated id names no real package
        if id.ends_with('…') {
            log::warn!("skipping {name}: package id truncated in listing ({id})");
            continue;
        }

        let available = if has_available {
            Some(field(&chars, &columns, 3)).filter(|v| !v.is_empty())
        } else {
            None
        };

        packages.push(InstalledPackage {
            id: id.into(),
            name,
            current_version: version,
            available_version: available,
        });
    }

    Ok(packages)
}

/// Keep only what was drawn after the last carriage return.
fn strip_progress(line: &str) -> &str {
    line.rsplit('\r').next().unwrap_or(line).trim_end()
}

fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= MIN_SEPARATOR_LEN && trimmed.chars().all(|c| c == '-')
}

/// Character offsets where header words begin.
fn column_starts(header: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut previous_was_space = true;
    for (i, c) in header.chars().enumerate() {
        let is_space = c.is_whitespace();
        if !is_space && previous_was_space {
            starts.push(i);
        }
        previous_was_space = is_space;
    }
    starts
}

fn field(chars: &[char], columns: &[usize], index: usize) -> String {
    let start = columns[index].min(chars.len());
    let end = columns
        .get(index + 1)
        .copied()
        .unwrap_or(chars.len())
        .min(chars.len());
    chars[start..end].iter().collect::<String>().trim().to_string()
}
