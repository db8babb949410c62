//! Tab-separated results file.

use crate::{ResultsError, ResultsResult};
use cl_sim::{LoopResults, LoopRow};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Column order of every results line.
pub const COLUMNS: [&str; 7] = [
    "time",
    "temperature_e",
    "temperature_i",
    "density",
    "pressure_e",
    "pressure_i",
    "heat",
];

/// One line per row: `time Te Ti n Pe Pi heat`, tab separated, newline terminated.
/// Missing parent directories are created.
pub fn write_results(path: &Path, results: &LoopResults) -> ResultsResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut w = BufWriter::new(File::create(path)?);
    for row in results.rows() {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.time,
            row.temperature_e,
            row.temperature_i,
            row.density,
            row.pressure_e,
            row.pressure_i,
            row.heat
        )?;
    }
    w.flush()?;
    tracing::debug!(path = %path.display(), rows = results.len(), "wrote results");
    Ok(())
}

/// Read a file written by [`write_results`].
pub fn read_results(path: &Path) -> ResultsResult<LoopResults> {
    let content = fs::read_to_string(path)?;
    let mut results = LoopResults::default();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parse_err = |message: String| ResultsError::Parse {
            path: path.display().to_string(),
            line: idx + 1,
            message,
        };
        let values = line
            .split('\t')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| parse_err(e.to_string()))?;
        let [time, temperature_e, temperature_i, density, pressure_e, pressure_i, heat] =
            values[..]
        else {
            return Err(parse_err(format!(
                "expected {} columns, found {}",
                COLUMNS.len(),
                values.len()
            )));
        };
        results.push(LoopRow {
            time,
            heat,
            temperature_e,
            temperature_i,
            pressure_e,
            pressure_i,
            density,
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LoopResults {
        let mut results = LoopResults::with_estimate(2);
        for i in 0..3 {
            let t = i as f64;
            results.push(LoopRow {
                time: t,
                heat: 0.01,
                temperature_e: 3.0e6 + t,
                temperature_i: 2.9e6 + t,
                pressure_e: 1.2,
                pressure_i: 1.1,
                density: 3.0e9,
            });
        }
        results
    }

    #[test]
    fn seven_tab_separated_columns() {
        let dir = std::env::temp_dir().join("cl_results_writer").join("nested");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("loop.txt");
        write_results(&path, &sample()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with('\n'));
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(first.len(), 7);
        assert_eq!(first[0], "0");
        assert_eq!(first[1], "3000000");
        assert_eq!(first[3], "3000000000");
        assert_eq!(first[6], "0.01");
    }

    #[test]
    fn read_back() {
        let path = std::env::temp_dir().join("cl_results_read_back.txt");
        let original = sample();
        write_results(&path, &original).unwrap();
        let loaded = read_results(&path).unwrap();
        assert_eq!(loaded.len(), original.len());
        assert_eq!(loaded.row(2), original.row(2));
    }

    #[test]
    fn short_line_is_reported() {
        let path = std::env::temp_dir().join("cl_results_short_line.txt");
        fs::write(&path, "0\t1\t2\n").unwrap();
        let err = read_results(&path).unwrap_err();
        assert!(matches!(err, ResultsError::Parse { line: 1, .. }));
    }
}
