use std::{
    collections::HashSet,
    error::Error,
    fs::{self, File},
};

use glob::glob;
use pmu_data::{scale_parser::parse_scale, PlatformDesc, StatTableDesc};
use proc_macro2::TokenStream;
use quote::quote;

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=events/");

    let mut table_ids = HashSet::new();
    let mut tables = vec![];
    for entry in glob("events/tables/*.json")? {
        let path = entry?;
        println!("cargo:rerun-if-changed={}", path.display());

        let file = File::open(&path)?;
        let data: StatTableDesc = serde_json::from_reader(file)?;

        let mut stats = vec![];

        for stat in data.stats {
            let name = &stat.name;
            let numerator = &stat.numerator;
            let denominator = &stat.denominator;
            let scale = parse_scale(&stat.scale)
                .map_err(|err| format!("{}: stat '{}': {}", path.display(), name, err))?;

            if numerator.is_empty() || denominator.is_empty() || numerator == denominator {
                return Err(format!(
                    "{}: stat '{}' needs two distinct non-empty events",
                    path.display(),
                    name
                )
                .into());
            }

            stats.push(quote! {
                stats.insert(#name.to_string(), StatDefinition {
                    name: #name.to_string(),
                    numerator: #numerator.to_string(),
                    denominator: #denominator.to_string(),
                    scale: #scale,
                });
            });
        }

        let id = &data.id;
        table_ids.insert(data.id.clone());

        tables.push(quote! {
            let mut stats = HashMap::new();
            #(#stats)*

            tables.insert(#id.to_string(), stats);
        });
    }

    let file = File::open("events/platforms.json")?;
    let platform_descs: Vec<PlatformDesc> = serde_json::from_reader(file)?;

    let mut platforms = vec![];
    for desc in platform_descs {
        for table in std::iter::once(&desc.base).chain(desc.overlays.iter()) {
            if !table_ids.contains(table) {
                return Err(format!(
                    "platform '{}' references unknown stat table '{}'",
                    desc.name, table
                )
                .into());
            }
        }

        let name = &desc.name;
        let vendor = &desc.vendor;
        let arch = &desc.arch;
        let base = &desc.base;
        let overlays = &desc.overlays;
        let cpu_part = optional_str(&desc.cpu_part);
        let amd_model = optional_str(&desc.amd_model);

        platforms.push(quote! {
            PlatformEntry {
                name: #name,
                vendor: #vendor,
                arch: #arch,
                base: #base,
                overlays: &[#(#overlays),*],
                cpu_part: #cpu_part,
                amd_model: #amd_model,
            }
        });
    }

    let catalog = quote! {
        static PLATFORMS: &[PlatformEntry] = &[#(#platforms),*];

        lazy_static! {
            static ref STAT_TABLES: HashMap<String, StatTable> = create_stat_tables();
        }

        fn create_stat_tables() -> HashMap<String, StatTable> {
            let mut tables = HashMap::new();

            #({ #tables })*

            tables
        }
    };

    let file = syn::parse2(catalog)?;
    let formatted = prettyplease::unparse(&file);

    fs::write(
        format!("{}/catalog.rs", std::env::var("OUT_DIR")?),
        formatted,
    )?;

    Ok(())
}

fn optional_str(value: &Option<String>) -> TokenStream {
    match value {
        Some(value) => quote! { Some(#value) },
        None => quote! { None },
    }
}
