//! Per-platform tables of derived counter stats.
//!
//! Every platform's table is its architecture's universal table with zero or
//! more overlays applied on top, later overlays replacing earlier entries of
//! the same name. The raw tables live in `events/` and are compiled in by
//! `build.rs`.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use lazy_static::lazy_static;
use pmu_data::scale_parser::parse_scale;

use crate::Error;

/// A ratio of two raw PMU events: `numerator / denominator * scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatDefinition {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
    pub scale: f64,
}

pub type StatTable = HashMap<String, StatDefinition>;

#[derive(Debug)]
pub struct PlatformEntry {
    pub name: &'static str,
    pub vendor: &'static str,
    pub arch: &'static str,
    pub base: &'static str,
    pub overlays: &'static [&'static str],
    pub cpu_part: Option<&'static str>,
    pub amd_model: Option<&'static str>,
}

include!(concat!(env!("OUT_DIR"), "/catalog.rs"));

lazy_static! {
    static ref CATALOG: HashMap<&'static str, PlatformCatalog> = compose_catalog();
}

/// The effective stat table of a single platform.
#[derive(Debug)]
pub struct PlatformCatalog {
    pub platform: &'static PlatformEntry,
    stats: BTreeMap<String, StatDefinition>,
}

impl PlatformCatalog {
    pub fn name(&self) -> &'static str {
        self.platform.name
    }

    /// Valid stat names, sorted.
    pub fn stat_names(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(String::as_str)
    }

    pub fn stats(&self) -> impl Iterator<Item = &StatDefinition> {
        self.stats.values()
    }

    pub fn get(&self, stat: &str) -> Option<&StatDefinition> {
        self.stats.get(stat)
    }

    pub fn lookup(&self, stat: &str) -> Result<&StatDefinition, Error> {
        self.get(stat).ok_or_else(|| Error::UnknownStat {
            platform: self.platform.name.to_string(),
            stat: stat.to_string(),
        })
    }
}

pub(crate) fn platform_entries() -> &'static [PlatformEntry] {
    PLATFORMS
}

pub fn find_platform(name: &str) -> Option<&'static PlatformCatalog> {
    let catalog: &'static HashMap<&'static str, PlatformCatalog> = &CATALOG;
    catalog.get(name)
}

/// All known platforms in declaration order.
pub fn platforms() -> impl Iterator<Item = &'static PlatformCatalog> {
    PLATFORMS.iter().filter_map(|platform| find_platform(platform.name))
}

pub fn lookup(platform: &str, stat: &str) -> Result<&'static StatDefinition, Error> {
    find_platform(platform)
        .ok_or_else(|| Error::UnsupportedPlatform(platform.to_string()))?
        .lookup(stat)
}

/// Folds `tables` into one, entries of later tables replacing earlier ones.
pub fn merge_overlays<'a, I>(tables: I) -> BTreeMap<String, StatDefinition>
where
    I: IntoIterator<Item = &'a StatTable>,
{
    let mut merged = BTreeMap::new();
    for table in tables {
        for (name, stat) in table {
            merged.insert(name.clone(), stat.clone());
        }
    }

    merged
}

fn compose_catalog() -> HashMap<&'static str, PlatformCatalog> {
    PLATFORMS
        .iter()
        .map(|platform| {
            let tables = std::iter::once(platform.base)
                .chain(platform.overlays.iter().copied())
                .filter_map(|id| STAT_TABLES.get(id));

            let catalog = PlatformCatalog {
                platform,
                stats: merge_overlays(tables),
            };

            (platform.name, catalog)
        })
        .collect()
}

/// Parses a user supplied `name|numerator|denominator|scale` definition.
impl FromStr for StatDefinition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.split('|').collect::<Vec<_>>();

        let [name, numerator, denominator, scale] = fields.as_slice() else {
            return Err(Error::InvalidCustomCounter(s.to_string()));
        };

        if name.is_empty() || numerator.is_empty() || denominator.is_empty() {
            return Err(Error::InvalidCustomCounter(s.to_string()));
        }

        Ok(StatDefinition {
            name: name.to_string(),
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
            scale: parse_scale(scale)?,
        })
    }
}
