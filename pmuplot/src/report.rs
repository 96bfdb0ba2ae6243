use comfy_table::{presets::UTF8_FULL_CONDENSED, CellAlignment, Table};
use num_format::{Locale, ToFormattedString};
use pmu::{DerivedSeries, PlatformCatalog, SummaryStats};

pub fn stats_table(catalog: &PlatformCatalog) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec!["stat", "numerator", "denominator", "scale"]);

    for stat in catalog.stats() {
        table.add_row(vec![
            stat.name.clone(),
            stat.numerator.clone(),
            stat.denominator.clone(),
            format!("{}", stat.scale),
        ]);
    }

    table
}

pub fn summary_table(series: &DerivedSeries, summary: &SummaryStats) -> Table {
    let total = |value: fn(&pmu::DerivedRow) -> f64| {
        (series.rows.iter().map(value).sum::<f64>() as u64).to_formatted_string(&Locale::en)
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec![series.stat.name.as_str(), ""]);

    let rows = [
        ("samples".to_string(), series.len().to_formatted_string(&Locale::en)),
        ("gmean".to_string(), format!("{:.2}", summary.geomean)),
        ("p50".to_string(), format!("{:.2}", summary.p50)),
        ("p90".to_string(), format!("{:.2}", summary.p90)),
        ("p99".to_string(), format!("{:.2}", summary.p99)),
        (series.stat.numerator.clone(), total(|row| row.numerator)),
        (series.stat.denominator.clone(), total(|row| row.denominator)),
    ];

    for (name, value) in rows {
        table.add_row(vec![name, value]);
    }

    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    table
}
