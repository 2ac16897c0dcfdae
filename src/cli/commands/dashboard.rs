//! Dashboard command implementation.

use std::fmt::Write as _;

use anyhow::{Result, bail};

use iterion_lib::DashboardMetrics;
use iterion_lib::model::Organization;

use crate::cli::{DashboardArgs, Session};
use crate::format::{DashboardOutput, column_width, pad_right, progress_bar};

const BAR_WIDTH: usize = 10;

/// Execute the dashboard command.
///
/// # Errors
///
/// Returns an error if `--limit` is zero or JSON serialization fails.
pub fn execute(args: &DashboardArgs, session: &Session, json: bool) -> Result<()> {
    let limit = args.limit.unwrap_or(session.config.dashboard.delivery_limit);
    if limit == 0 {
        bail!("--limit must be at least 1");
    }

    let scope = session.scope();
    let metrics = DashboardMetrics::compute(&scope, session.workspace.sprints(), limit);

    if json {
        let output = DashboardOutput {
            org: (&session.org).into(),
            metrics: &metrics,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render(&session.org, &metrics));
    }
    Ok(())
}

fn render(org: &Organization, metrics: &DashboardMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} ({})", org.logo, org.name, org.id);
    let _ = writeln!(out);
    let _ = writeln!(out, "Active epics:       {}", metrics.active_epics);
    let _ = writeln!(out, "Completion rate:    {}%", metrics.completion_rate);
    let _ = writeln!(
        out,
        "Delivered points:   {} / {}",
        metrics.delivered_points, metrics.total_points
    );
    let _ = writeln!(out, "Critical blockers:  {}", metrics.critical_blockers);

    if !metrics.velocity_trend.is_empty() {
        let width = column_width(metrics.velocity_trend.iter().map(|p| p.sprint.as_str()));
        let _ = writeln!(out, "\nVelocity");
        for point in &metrics.velocity_trend {
            let _ = writeln!(
                out,
                "  {}  {:>3} / {:<3} {}",
                pad_right(&point.sprint, width),
                point.delivered,
                point.target,
                progress_bar(point.delivered, point.target, BAR_WIDTH)
            );
        }
    }

    if !metrics.priority_mix.is_empty() {
        let _ = writeln!(out, "\nEpics by priority");
        for bucket in &metrics.priority_mix {
            let _ = writeln!(out, "  {}  {}", pad_right(bucket.priority.as_str(), 6), bucket.count);
        }
    }

    if !metrics.delivery_by_epic.is_empty() {
        let width = column_width(metrics.delivery_by_epic.iter().map(|d| d.name.as_str()));
        let _ = writeln!(out, "\nDelivery by epic");
        for delivery in &metrics.delivery_by_epic {
            let _ = writeln!(
                out,
                "  {}  {}/{} {}  {} remaining",
                pad_right(&delivery.name, width),
                delivery.completed,
                delivery.total,
                progress_bar(delivery.completed, delivery.total, BAR_WIDTH),
                delivery.remaining
            );
        }
    }
    out
}
