// Source CSV import

use std::path::Path;
use std::sync::OnceLock;

use encoding_rs::Encoding;
use regex::Regex;
use tracing::{debug, warn};
use vinmerge_recon::{RawTable, Source};

use crate::error::IoError;

static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();

fn whitespace_run() -> &'static Regex {
    WHITESPACE_RUN.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

/// Canonical header name: BOM stripped, trimmed, lowercased, inner
/// whitespace runs collapsed to `_`.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    whitespace_run()
        .replace_all(&trimmed.to_lowercase(), "_")
        .into_owned()
}

/// Decode raw file bytes. Valid UTF-8 is taken as is; anything else is
/// decoded with the encoding named by `label` (e.g. `windows-1252`, `latin1`).
pub fn decode(bytes: Vec<u8>, label: &str) -> Result<String, IoError> {
    let encoding =
        Encoding::for_label(label.as_bytes()).ok_or_else(|| IoError::Encoding(label.into()))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, used, had_errors) = encoding.decode(&bytes);
            if had_errors {
                warn!(encoding = used.name(), "replacement characters inserted while decoding");
            }
            debug!(encoding = used.name(), "decoded non-UTF-8 input");
            Ok(decoded.into_owned())
        }
    }
}

/// Parse delimited text into a [`RawTable`]. The first record is the header.
/// Short and long rows are kept as-is; missing cells read as blank.
pub fn parse_table(
    source: Source,
    path: &Path,
    content: &str,
    delimiter: u8,
) -> Result<RawTable, IoError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers = reader
        .headers()
        .map_err(|e| IoError::csv(path, e))?
        .iter()
        .map(normalize_header)
        .collect::<Vec<_>>();
    // A blank first line is no header at all.
    if headers.iter().all(|h| h.is_empty()) {
        headers.clear();
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IoError::csv(path, e))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(%source, columns = headers.len(), rows = rows.len(), "parsed table");
    Ok(RawTable::new(source, headers, rows))
}
