//! CSV loaders for swipe records and station metadata.
//!
//! Rows are deserialized into typed records and checked at the boundary so
//! the aggregation code never sees a row without a remote id or a station
//! without usable coordinates.

use std::io::Read;
use std::path::Path;

use swipe_map_swipes_models::{Station, SwipeRecord};
use thiserror::Error;

/// Errors that can occur while loading swipe inputs.
#[derive(Debug, Error)]
pub enum LoadError {
    /// I/O failure opening or reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV or a field that failed to deserialize.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row parsed but failed validation.
    #[error("Invalid row {row}: {message}")]
    Invalid {
        /// 1-based data row number (header excluded).
        row: usize,
        /// Description of what went wrong.
        message: String,
    },
}

/// Reads swipe records from CSV with a header row.
///
/// # Errors
///
/// Returns [`LoadError`] if a row cannot be parsed or has an empty remote id.
pub fn read_records(reader: impl Read) -> Result<Vec<SwipeRecord>, LoadError> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for (idx, row) in csv.deserialize::<SwipeRecord>().enumerate() {
        let record = row?;
        if record.remote.trim().is_empty() {
            return Err(LoadError::Invalid {
                row: idx + 1,
                message: "empty REMOTE".to_string(),
            });
        }
        records.push(record);
    }

    Ok(records)
}

/// Reads station metadata from CSV with a header row.
///
/// # Errors
///
/// Returns [`LoadError`] if a row cannot be parsed or has non-finite
/// coordinates.
pub fn read_stations(reader: impl Read) -> Result<Vec<Station>, LoadError> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut stations = Vec::new();

    for (idx, row) in csv.deserialize::<Station>().enumerate() {
        let station = row?;
        if !station.lat.is_finite() || !station.long.is_finite() {
            return Err(LoadError::Invalid {
                row: idx + 1,
                message: format!("station {} has no usable coordinates", station.unit),
            });
        }
        stations.push(station);
    }

    Ok(stations)
}

/// Loads swipe records from a CSV file.
///
/// # Errors
///
/// See [`read_records`].
pub fn load_records(path: &Path) -> Result<Vec<SwipeRecord>, LoadError> {
    let records = read_records(std::fs::File::open(path)?)?;
    log::info!("Loaded {} swipe records from {}", records.len(), path.display());
    Ok(records)
}

/// Loads station metadata from a CSV file.
///
/// # Errors
///
/// See [`read_stations`].
pub fn load_stations(path: &Path) -> Result<Vec<Station>, LoadError> {
    let stations = read_stations(std::fs::File::open(path)?)?;
    log::info!("Loaded {} stations from {}", stations.len(), path.display());
    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_records() {
        let data = "REMOTE,WEEK,swipes,swipes_baseline,swipes_pct_chg\n\
                    R001,2020-03-07,1200,2400,-50\n\
                    R002,2020-03-07,,,\n";
        let records = read_records(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].swipes, Some(1200.0));
        assert_eq!(records[1].swipes_pct_chg, None);
    }

    #[test]
    fn rejects_blank_remote() {
        let data = "REMOTE,WEEK,swipes_pct_chg\n ,2020-03-07,1\n";
        let err = read_records(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Invalid { row: 1, .. }));
    }

    #[test]
    fn rejects_malformed_week() {
        let data = "REMOTE,WEEK,swipes_pct_chg\nR001,last tuesday,1\n";
        assert!(matches!(
            read_records(data.as_bytes()),
            Err(LoadError::Csv(_))
        ));
    }

    #[test]
    fn rejects_station_without_coordinates() {
        let data = "unit,name,borough,lat,long\nR001,X,Manhattan,NaN,-74.0\n";
        assert!(matches!(
            read_stations(data.as_bytes()),
            Err(LoadError::Invalid { .. })
        ));
    }
}
