use chrono::Local;
use clap::Args;
use devconsole::format::chart_date;
use devconsole::metrics::{
    api_request_series, axis_label, chart_window_start, error_distribution_series,
    tooltip_value, webhook_request_series, webhook_timing_series, Series,
};
use devconsole::resources::{ApiRequestLog, ResourceQuery, WebhookRequestLog};
use devconsole::Config;
use eyre::Result;
use prettytable::{Cell, Row, Table};

use super::{client, print_json, Format};

#[derive(Debug, Args)]
pub struct MetricsArgs {
    /// Print every data point of each series
    #[arg(long)]
    pub points: bool,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,
}

impl MetricsArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let client = client(config);
        let after = chart_window_start(Local::now()).to_rfc3339();

        let api_logs = client.list_all::<ApiRequestLog>(
            &ResourceQuery::new()
                .column("uuid")
                .column("status_code")
                .column("method")
                .column("created_at")
                .filter("after", after.clone()),
        )?;
        let webhook_logs = client.list_all::<WebhookRequestLog>(
            &ResourceQuery::new()
                .column("uuid")
                .column("status_code")
                .column("duration")
                .column("created_at")
                .filter("after", after),
        )?;

        let charts = [
            ("API Requests", api_request_series(&api_logs)),
            ("API Errors", error_distribution_series(&api_logs)),
            ("Webhook Requests", webhook_request_series(&webhook_logs)),
            ("Webhook Response Times", vec![webhook_timing_series(&webhook_logs)]),
        ];

        if self.format == Format::Json {
            let charts: Vec<_> = charts
                .iter()
                .map(|(title, series)| serde_json::json!({ "chart": title, "series": series }))
                .collect();
            return print_json(&charts);
        }

        let mut summary = Table::new();
        summary.add_row(Row::new(vec![
            Cell::new("Chart"),
            Cell::new("Series"),
            Cell::new("Total"),
            Cell::new("Peak"),
            Cell::new("Points"),
        ]));
        for (title, series) in &charts {
            for s in series {
                summary.add_row(Row::new(vec![
                    Cell::new(title),
                    Cell::new(&s.label),
                    Cell::new(&axis_label(s.total())),
                    Cell::new(&axis_label(peak(s))),
                    Cell::new(&s.points.len().to_string()),
                ]));
            }
        }
        println!("\nLast 7 days:");
        summary.printstd();

        if self.points {
            for (title, series) in &charts {
                for s in series.iter().filter(|s| !s.points.is_empty()) {
                    println!("\n{} / {}:", title, s.label);
                    print_points(s);
                }
            }
        }

        Ok(())
    }
}

fn peak(series: &Series) -> f64 {
    series.points.iter().map(|p| p.y).fold(0.0, f64::max)
}

fn print_points(series: &Series) {
    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("Time"), Cell::new("Value")]));
    for point in &series.points {
        table.add_row(Row::new(vec![
            Cell::new(&chart_date(&point.x.with_timezone(&Local))),
            Cell::new(&tooltip_value(point.y)),
        ]));
    }
    table.printstd();
}
