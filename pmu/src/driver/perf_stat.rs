use std::process::Command;

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error};

use crate::{Error, StatDefinition};

const PERF: &str = "perf";
const LSCPU: &str = "lscpu";

lazy_static! {
    static ref CPU_ID: Regex = Regex::new(r"^(\d+)$").unwrap();
}

/// Runs `perf stat` in interval mode over a fixed window for a pair of events.
#[derive(Debug, Clone)]
pub struct PerfStatDriver {
    duration_secs: u64,
    period_ms: u64,
    cpus: Option<Vec<u32>>,
    numerator: String,
    denominator: String,
}

pub struct PerfStatDriverBuilder {
    duration_secs: u64,
    period_ms: u64,
    cpus: Option<Vec<u32>>,
    numerator: String,
    denominator: String,
}

impl PerfStatDriver {
    pub fn builder(stat: &StatDefinition) -> PerfStatDriverBuilder {
        PerfStatDriverBuilder {
            duration_secs: 60,
            period_ms: 1000,
            cpus: None,
            numerator: stat.numerator.clone(),
            denominator: stat.denominator.clone(),
        }
    }

    /// Command line passed to `perf` for the given CPU set.
    pub fn args(&self, cpus: &[u32]) -> Vec<String> {
        vec![
            "stat".to_string(),
            format!("-C{}", cpus.iter().join(",")),
            format!("-I{}", self.period_ms),
            "-x|".to_string(),
            "-a".to_string(),
            "-e".to_string(),
            self.numerator.clone(),
            "-e".to_string(),
            self.denominator.clone(),
            "--".to_string(),
            "sleep".to_string(),
            self.duration_secs.to_string(),
        ]
    }

    /// Blocks for the whole measurement window and returns the raw interval
    /// output. Any failure is reported to the operator and yields `None`.
    pub fn run(&self) -> Option<String> {
        match self.try_run() {
            Ok(output) => Some(output),
            Err(err) => {
                error!(%err, "perf stat failed");
                eprintln!("Failed to measure performance counters.");
                eprintln!("Please check that perf is installed and in your PATH");
                None
            }
        }
    }

    fn try_run(&self) -> Result<String, Error> {
        let cpus = match &self.cpus {
            Some(cpus) => cpus.clone(),
            None => discover_cpus()?,
        };

        if cpus.is_empty() {
            return Err(Error::MeasurementFailed("no CPUs to measure".to_string()));
        }

        if let Err(err) = which::which(PERF) {
            return Err(Error::MeasurementFailed(format!("{PERF}: {err}")));
        }

        let args = self.args(&cpus);
        debug!(?args, "running {PERF}");

        let output = Command::new(PERF).args(&args).output()?;

        if !output.status.success() {
            return Err(Error::MeasurementFailed(format!(
                "{PERF} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // perf stat reports on stderr
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(text)
    }
}

impl PerfStatDriverBuilder {
    pub fn duration_secs(self, duration_secs: u64) -> Self {
        Self {
            duration_secs,
            ..self
        }
    }

    pub fn period_ms(self, period_ms: u64) -> Self {
        Self { period_ms, ..self }
    }

    /// Restricts measurement to `cpus`; `None` measures every logical CPU.
    pub fn cpus(self, cpus: Option<Vec<u32>>) -> Self {
        Self { cpus, ..self }
    }

    pub fn build(self) -> PerfStatDriver {
        PerfStatDriver {
            duration_secs: self.duration_secs,
            period_ms: self.period_ms,
            cpus: self.cpus,
            numerator: self.numerator,
            denominator: self.denominator,
        }
    }
}

/// Lists every logical CPU id of the host via `lscpu -p=CPU`.
pub fn discover_cpus() -> Result<Vec<u32>, Error> {
    let output = Command::new(LSCPU).arg("-p=CPU").output()?;

    if !output.status.success() {
        return Err(Error::MeasurementFailed(format!(
            "{LSCPU} exited with {}",
            output.status
        )));
    }

    let cpus = parse_cpu_list(&String::from_utf8_lossy(&output.stdout));
    debug!(count = cpus.len(), "discovered CPUs");

    Ok(cpus)
}

/// Keeps only lines that are a bare CPU id; `lscpu` prefixes its output with
/// `#` comments.
pub fn parse_cpu_list(output: &str) -> Vec<u32> {
    output
        .lines()
        .filter_map(|line| CPU_ID.captures(line.trim_end()))
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipc() -> StatDefinition {
        StatDefinition {
            name: "ipc".to_string(),
            numerator: "armv8_pmuv3_0/event=0x8/".to_string(),
            denominator: "armv8_pmuv3_0/event=0x11/".to_string(),
            scale: 1.0,
        }
    }

    #[test]
    fn perf_arguments() {
        let driver = PerfStatDriver::builder(&ipc())
            .duration_secs(5)
            .period_ms(250)
            .build();

        assert_eq!(
            driver.args(&[0, 1, 3]),
            vec![
                "stat",
                "-C0,1,3",
                "-I250",
                "-x|",
                "-a",
                "-e",
                "armv8_pmuv3_0/event=0x8/",
                "-e",
                "armv8_pmuv3_0/event=0x11/",
                "--",
                "sleep",
                "5",
            ]
        );
    }

    #[test]
    fn builder_defaults() {
        let driver = PerfStatDriver::builder(&ipc()).build();
        let args = driver.args(&[0]);

        assert_eq!(args[2], "-I1000");
        assert_eq!(args.last().map(String::as_str), Some("60"));
        assert!(driver.cpus.is_none());
    }

    #[test]
    fn lscpu_output() {
        let output = "# The following is the parsable format, which can be fed to other
# programs. Each different item in every column has an unique ID
# starting from zero.
# CPU
0
1
2
3
";
        assert_eq!(parse_cpu_list(output), vec![0, 1, 2, 3]);
    }

    #[test]
    fn lscpu_output_ignores_noise() {
        assert_eq!(parse_cpu_list("0\n 1\nx\n2,3\n\n4\r\n"), vec![0, 4]);
    }

    #[test]
    fn explicit_empty_cpu_set_fails() {
        let driver = PerfStatDriver::builder(&ipc()).cpus(Some(vec![])).build();

        assert!(driver.run().is_none());
    }
}
