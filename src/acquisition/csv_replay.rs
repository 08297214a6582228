//! Recorded tracker output in CSV form
//!
//! Expected format, header optional:
//! ```text
//! timestamp,position[,confidence]
//! 0.000,0.512
//! 0.033,0.498,0.91
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::AcquisitionError;
use crate::types::Observation;

/// Load every parsable row. Unreadable or malformed rows are logged and skipped.
pub fn read_csv_observations(path: &Path) -> Result<Vec<Observation>, AcquisitionError> {
    let file = File::open(path).map_err(|source| AcquisitionError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let reader = BufReader::new(file);
    let mut observations = Vec::new();
    let mut skipped = 0usize;

    for (idx, line_result) in reader.lines().enumerate() {
        let line_num = idx + 1;

        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "Error reading CSV line");
                skipped += 1;
                continue;
            }
        };

        if line_num == 1 && line.trim_start().starts_with("timestamp") {
            continue;
        }
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        match parse_csv_line(&line, line_num) {
            Ok(obs) => observations.push(obs),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping CSV row");
                skipped += 1;
            }
        }
    }

    tracing::info!(
        count = observations.len(),
        skipped,
        path = %path.display(),
        "Loaded observations from CSV"
    );
    Ok(observations)
}

/// Parse `timestamp,position[,confidence]`.
pub fn parse_csv_line(line: &str, line_num: usize) -> Result<Observation, AcquisitionError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if !(2..=3).contains(&fields.len()) {
        return Err(AcquisitionError::Parse {
            line: line_num,
            message: format!("expected 2 or 3 fields, found {}", fields.len()),
        });
    }

    let timestamp = parse_f64(fields[0], "timestamp", line_num)?;
    let position = parse_f64(fields[1], "position", line_num)?;
    let confidence = match fields.get(2) {
        Some(raw) if !raw.is_empty() => parse_f64(raw, "confidence", line_num)?,
        _ => 1.0,
    };

    Ok(Observation {
        position,
        timestamp,
        confidence,
    })
}

fn parse_f64(s: &str, field: &str, line_num: usize) -> Result<f64, AcquisitionError> {
    s.parse::<f64>().map_err(|_| AcquisitionError::Parse {
        line: line_num,
        message: format!("cannot parse {} as f64: '{}'", field, s),
    })
}
