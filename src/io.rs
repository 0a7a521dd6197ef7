//! Headerless CSV matrices.
//!
//! Demonstrations arrive as dense numeric CSV files, rows are timesteps and
//! columns are DOFs, no header row. Values are written through `Display`,
//! which produces the shortest representation that parses back to the same
//! `f64`, so written files round-trip losslessly.

use std::path::Path;

use nalgebra::DMatrix;

use crate::error::{PrompError, Result};
use crate::trajectory::Trajectory;

/// Read a dense numeric matrix from a headerless CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a row has a different width
/// than the first, a field does not parse as a number, or the file is empty.
pub fn read_matrix(path: &Path) -> Result<DMatrix<f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_path(path)?;

    let mut values = Vec::new();
    let mut cols = 0;
    let mut rows = 0;
    for (r, record) in reader.records().enumerate() {
        let record = record?;
        if r == 0 {
            cols = record.len();
        }
        for (c, field) in record.iter().enumerate() {
            let value: f64 = field.parse().map_err(|_| PrompError::Parse {
                path: path.to_path_buf(),
                row: r,
                col: c,
            })?;
            values.push(value);
        }
        rows += 1;
    }
    if rows == 0 {
        return Err(PrompError::trajectory_too_short(1, 0));
    }
    Ok(DMatrix::from_row_slice(rows, cols, &values))
}

/// Write a matrix as headerless comma-separated text with full precision.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_matrix(path: &Path, matrix: &DMatrix<f64>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    for r in 0..matrix.nrows() {
        let record: Vec<String> = matrix.row(r).iter().map(f64::to_string).collect();
        writer.write_record(&record)?;
    }
    writer.flush().map_err(PrompError::Io)?;
    Ok(())
}

/// Read a trajectory from a headerless CSV file with the given time step.
///
/// # Errors
///
/// Propagates [`read_matrix`] errors and trajectory construction errors.
pub fn read_trajectory(path: &Path, dt: f64) -> Result<Trajectory> {
    Trajectory::new(read_matrix(path)?, dt)
}

/// Write a trajectory's sample matrix as headerless CSV.
///
/// # Errors
///
/// Propagates [`write_matrix`] errors.
pub fn write_trajectory(path: &Path, trajectory: &Trajectory) -> Result<()> {
    write_matrix(path, trajectory.matrix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traj.csv");
        let matrix = DMatrix::from_row_slice(
            3,
            2,
            &[0.1, -2.5, std::f64::consts::PI, 1e-17, 3.0, -0.0625],
        );
        write_matrix(&path, &matrix).unwrap();
        let back = read_matrix(&path).unwrap();
        assert_eq!(back.shape(), (3, 2));
        for r in 0..3 {
            for c in 0..2 {
                assert_relative_eq!(back[(r, c)], matrix[(r, c)]);
            }
        }
    }

    #[test]
    fn test_rejects_non_numeric_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "1.0,2.0\n3.0,oops\n").unwrap();
        assert!(matches!(
            read_matrix(&path),
            Err(PrompError::Parse { row: 1, col: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "1.0,2.0\n3.0\n").unwrap();
        assert!(read_matrix(&path).is_err());
    }

    #[test]
    fn test_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();
        assert!(read_matrix(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let missing = Path::new("/nonexistent/never.csv");
        assert!(read_matrix(missing).is_err());
    }
}
