use std::io::Read;
use std::path::Path;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use crate::drivers::error::{open_input, AnalysisError};
/// Header/footer sizes of an instrument text export.
///
/// The defaults match the frequency-response analyser in the lab: 84 header lines
/// (instrument settings, channel setup) and a 7 line footer. Other export versions
/// may differ, so the layout travels with the configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    pub header_lines: usize,
    pub footer_lines: usize,
}
impl Default for TableLayout {
    fn default() -> Self {
        Self {
            header_lines: 84,
            footer_lines: 7,
        }
    }
}
/// Frequency response of one capture, split into parallel columns.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyResponse {
    pub frequencies_hz: Vec<f64>,
    pub real: Vec<f64>,
    pub imag: Vec<f64>,
}
impl FrequencyResponse {
    pub fn len(&self) -> usize {
        self.frequencies_hz.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }
}
const FREQUENCY_COLUMN: usize = 1;
const REAL_COLUMN: usize = 2;
const IMAG_COLUMN: usize = 3;
pub fn load_text_table(path: &Path, layout: TableLayout) -> Result<FrequencyResponse, AnalysisError> {
    let mut bytes = Vec::new();
    open_input(path)?.read_to_end(&mut bytes)?;
    let lines = split_lines(&bytes);
    let response = parse_text_table(&lines, layout).map_err(|reason| AnalysisError::Format {
        path: path.to_path_buf(),
        reason,
    })?;
    if response.is_empty() {
        warn!("{} has no data rows between header and footer", path.display());
    }
    debug!(
        "loaded {} rows from {} ({} lines total)",
        response.len(),
        path.display(),
        lines.len()
    );
    Ok(response)
}
/// Splits raw file content into lines without decoding it.
///
/// Header and footer lines may carry instrument text in any encoding; only body rows
/// are decoded later.
fn split_lines(bytes: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = bytes
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect();
    if bytes.is_empty() || bytes.ends_with(b"\n") {
        lines.pop();
    }
    lines
}
/// Parses the body of a text export once the raw lines are in memory.
///
/// Errors are plain strings; [`load_text_table`] attaches the path.
pub fn parse_text_table<S: AsRef<[u8]>>(
    lines: &[S],
    layout: TableLayout,
) -> Result<FrequencyResponse, String> {
    let skipped = layout.header_lines + layout.footer_lines;
    if lines.len() < skipped {
        return Err(format!(
            "expected at least {skipped} lines ({} header + {} footer), found {}",
            layout.header_lines,
            layout.footer_lines,
            lines.len()
        ));
    }
    let body = &lines[layout.header_lines..lines.len() - layout.footer_lines];
    let mut response = FrequencyResponse {
        frequencies_hz: Vec::with_capacity(body.len()),
        real: Vec::with_capacity(body.len()),
        imag: Vec::with_capacity(body.len()),
    };
    for (offset, line) in body.iter().enumerate() {
        let line_no = layout.header_lines + offset + 1;
        let text = std::str::from_utf8(line.as_ref())
            .map_err(|err| format!("line {line_no}: not valid UTF-8: {err}"))?;
        let row = text
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|err| format!("line {line_no}: {err}"))?;
        if row.len() <= IMAG_COLUMN {
            return Err(format!(
                "line {line_no}: expected at least {} columns, found {}",
                IMAG_COLUMN + 1,
                row.len()
            ));
        }
        response.frequencies_hz.push(row[FREQUENCY_COLUMN]);
        response.real.push(row[REAL_COLUMN]);
        response.imag.push(row[IMAG_COLUMN]);
    }
    Ok(response)
}
