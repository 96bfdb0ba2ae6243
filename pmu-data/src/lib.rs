pub mod scale_parser;

use serde::{Deserialize, Serialize};

// Well-known platform codenames
pub const GRAVITON2: &str = "Graviton2";
pub const GRAVITON3: &str = "Graviton3";
pub const GRAVITON4: &str = "Graviton4";

// a.k.a. Zen 3 / Zen 4 server parts
pub const AMD_MILAN: &str = "Milan";
pub const AMD_GENOA: &str = "Genoa";

/// A set of derived stats that either forms the universal table of an
/// architecture family or overlays one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatTableDesc {
    pub id: String,
    pub arch: String,
    pub stats: Vec<StatDesc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatDesc {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
    /// Arithmetic expression, see [`scale_parser`].
    pub scale: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlatformDesc {
    pub name: String,
    pub vendor: String,
    pub arch: String,
    pub base: String,
    #[serde(default)]
    pub overlays: Vec<String>,
    /// ARM `CPU part` id reported by cpuinfo.
    #[serde(default)]
    pub cpu_part: Option<String>,
    /// AMD EPYC model token, e.g. `7R13`.
    #[serde(default)]
    pub amd_model: Option<String>,
}
