use std::{
    fs::File,
    io::{BufRead, BufReader},
};

use tracing::debug;

use crate::{catalog::platform_entries, Error};

pub const CPUINFO_PATH: &str = "/proc/cpuinfo";

const AMD_MARKER: &str = "AMD EPYC";

/// Classifies the host from `/proc/cpuinfo`.
pub fn get_host_platform() -> Result<String, Error> {
    let file = File::open(CPUINFO_PATH)?;
    identify_platform(BufReader::new(file))
}

/// Returns the catalog key of the first `model name` or `CPU part` line.
///
/// AMD EPYC model names and ARM part ids are translated to codenames, any
/// other model name is returned verbatim.
pub fn identify_platform<R: BufRead>(reader: R) -> Result<String, Error> {
    for line in reader.lines() {
        let line = line?;
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "model name" => {
                debug!(model = value, "found model name");

                if !value.contains(AMD_MARKER) {
                    return Ok(value.to_string());
                }

                // AMD EPYC <model> ...
                return value
                    .split_whitespace()
                    .nth(2)
                    .and_then(amd_codename)
                    .map(String::from)
                    .ok_or_else(|| Error::UnsupportedPlatform(value.to_string()));
            }
            "CPU part" => {
                debug!(part = value, "found CPU part");

                return arm_codename(value)
                    .map(String::from)
                    .ok_or_else(|| Error::UnsupportedPlatform(format!("CPU part {value}")));
            }
            _ => {}
        }
    }

    Err(Error::UnsupportedPlatform("unknown CPU".to_string()))
}

pub fn amd_codename(model: &str) -> Option<&'static str> {
    platform_entries()
        .iter()
        .find(|entry| entry.amd_model == Some(model))
        .map(|entry| entry.name)
}

pub fn arm_codename(part: &str) -> Option<&'static str> {
    platform_entries()
        .iter()
        .find(|entry| entry.cpu_part.is_some_and(|p| p.eq_ignore_ascii_case(part)))
        .map(|entry| entry.name)
}
