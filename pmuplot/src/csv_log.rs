use std::{io::Write, path::Path};

use anyhow::Result;
use pmu::DerivedSeries;

/// Saves the derived table with its positional index as the first column.
pub fn write_log(path: &Path, series: &DerivedSeries) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    write_series(&mut writer, series)?;
    writer.flush()?;

    Ok(())
}

pub fn write_series<W: Write>(
    writer: &mut csv::Writer<W>,
    series: &DerivedSeries,
) -> csv::Result<()> {
    let stat = &series.stat;
    writer.write_record([
        "",
        stat.name.as_str(),
        stat.numerator.as_str(),
        stat.denominator.as_str(),
    ])?;

    for row in &series.rows {
        writer.write_record([
            row.index.to_string(),
            row.ratio.to_string(),
            row.numerator.to_string(),
            row.denominator.to_string(),
        ])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmu::{RawSample, StatDefinition};

    fn series() -> DerivedSeries {
        let stat = StatDefinition {
            name: "branch-mpki".to_string(),
            numerator: "cpu/event=0xC5,umask=0x0/".to_string(),
            denominator: "cpu/event=0xc0,umask=0x0/".to_string(),
            scale: 1000.0,
        };

        let samples = [(0.0, 100.0), (5.0, 0.0), (7.0, 3000.0)]
            .iter()
            .enumerate()
            .flat_map(|(i, (num, den))| {
                [(*num, &stat.numerator), (*den, &stat.denominator)].map(|(count, event)| {
                    RawSample {
                        timestamp: i as f64,
                        count,
                        event: event.clone(),
                        fraction_running: 100.0,
                    }
                })
            })
            .collect::<Vec<_>>();

        DerivedSeries::derive(&samples, &stat)
    }

    #[test]
    fn log_round_trip() {
        let series = series();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("branch.csv");

        write_log(&path, &series).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "",
                "branch-mpki",
                "cpu/event=0xC5,umask=0x0/",
                "cpu/event=0xc0,umask=0x0/"
            ]
        );

        let rows = reader
            .records()
            .map(|record| {
                record
                    .unwrap()
                    .iter()
                    .map(|field| field.parse::<f64>().unwrap())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows.len(), series.len());
        for (row, expected) in rows.iter().zip(&series.rows) {
            assert_eq!(row[0] as usize, expected.index);
            assert!((row[1] - expected.ratio).abs() < 1e-9);
            assert!((row[2] - expected.numerator).abs() < 1e-9);
            assert!((row[3] - expected.denominator).abs() < 1e-9);
        }
    }

    #[test]
    fn index_keeps_gaps() {
        let mut buffer = csv::Writer::from_writer(vec![]);
        write_series(&mut buffer, &series()).unwrap();
        let text = String::from_utf8(buffer.into_inner().unwrap()).unwrap();

        let indices = text
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect::<Vec<_>>();

        // a zero numerator is a valid ratio, a zero denominator is not
        assert_eq!(indices, vec!["0", "2"]);
        assert!(text.starts_with(",branch-mpki,\"cpu/event=0xC5,umask=0x0/\""));
    }
}
