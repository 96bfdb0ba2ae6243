use pmu::{DerivedSeries, SummaryStats};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Style, Stylize},
    symbols::Marker,
    text::Line,
    widgets::{Axis, Block, Chart, Dataset, GraphType, Widget},
};

pub const PLOT_WIDTH: u16 = 100;
pub const PLOT_HEIGHT: u16 = 30;

pub fn print_plot(series: &DerivedSeries, summary: &SummaryStats) {
    let area = Rect::new(0, 0, PLOT_WIDTH, PLOT_HEIGHT);
    println!("{}", buffer_to_string(&render_plot(series, summary, area)));
}

/// Scatter of the ratio against its sample index, titled with the stat name
/// and captioned with the summary.
pub fn render_plot(series: &DerivedSeries, summary: &SummaryStats, area: Rect) -> Buffer {
    let points = series
        .rows
        .iter()
        .map(|row| (row.index as f64, row.ratio))
        .collect::<Vec<_>>();

    let x_max = points.iter().map(|p| p.0).fold(1.0, f64::max);
    let [y_min, y_max] = value_bounds(&points);

    let dataset = Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Scatter)
        .style(Style::default().cyan())
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(Block::bordered().title(Line::from(series.stat.name.as_str()).centered().bold()))
        .x_axis(
            Axis::default()
                .title(summary.to_string())
                .bounds([0.0, x_max])
                .labels(["0".to_string(), format!("{x_max}")]),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels([
                    format!("{y_min:.2}"),
                    format!("{:.2}", (y_min + y_max) / 2.0),
                    format!("{y_max:.2}"),
                ]),
        );

    let mut buf = Buffer::empty(area);
    chart.render(area, &mut buf);
    buf
}

fn value_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let (min, max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
            (min.min(p.1), max.max(p.1))
        });

    if min > max {
        return [0.0, 1.0];
    }

    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    [min - pad, max + pad]
}

pub fn buffer_to_string(buf: &Buffer) -> String {
    let area = buf.area;

    (area.top()..area.bottom())
        .map(|y| {
            let line = (area.left()..area.right())
                .map(|x| buf[(x, y)].symbol())
                .collect::<String>();
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
