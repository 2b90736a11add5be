//! `roster stats`: headline numbers and plan distribution.

use crate::output::{self, OutputMode, pretty_kv, pretty_section};
use anyhow::Result;
use clap::Args;
use roster_core::config::ProjectConfig;
use roster_core::stats::{PlanDistribution, SummaryStats};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug, Default)]
pub struct StatsArgs {
    /// Width of the distribution bars.
    #[arg(long, default_value = "30")]
    pub width: usize,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    summary: SummaryStats,
    distribution: PlanDistribution,
    #[serde(skip)]
    width: usize,
}

pub fn run_stats(
    args: &StatsArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> Result<()> {
    let records = super::load_records(project_root, &config.data)?;
    let report = StatsReport {
        summary: SummaryStats::from_records(&records),
        distribution: PlanDistribution::from_records(&records),
        width: args.width.max(1),
    };
    output::render_mode(output, &report, render_text, render_pretty)
}

fn bar(percentage: f64, width: usize) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = ((percentage / 100.0) * width as f64).round().clamp(0.0, width as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn render_text(report: &StatsReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "total  {}", report.summary.total_subscribers)?;
    writeln!(w, "active  {}", report.summary.active_subscribers)?;
    writeln!(w, "revenue  {}", report.summary.total_revenue)?;
    for share in &report.distribution.shares {
        writeln!(w, "{}  {}  {}%", share.plan, share.count, share.rounded_percentage())?;
    }
    if report.distribution.unlisted > 0 {
        writeln!(w, "unlisted  {}", report.distribution.unlisted)?;
    }
    Ok(())
}

fn render_pretty(report: &StatsReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Summary")?;
    pretty_kv(w, "Subscribers", report.summary.total_subscribers.to_string())?;
    pretty_kv(w, "Active", report.summary.active_subscribers.to_string())?;
    pretty_kv(w, "Revenue", report.summary.total_revenue.to_string())?;
    writeln!(w)?;

    pretty_section(w, "Plan distribution")?;
    for share in &report.distribution.shares {
        writeln!(
            w,
            "{:<14} {} {:>3}%  ({})",
            share.plan.as_str(),
            bar(share.percentage, report.width),
            share.rounded_percentage(),
            share.count
        )?;
    }
    if report.distribution.unlisted > 0 {
        writeln!(w, "{} record(s) on an unlisted plan", report.distribution.unlisted)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_args_defaults() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: StatsArgs,
        }
        let w = Wrapper::parse_from(["test"]);
        assert_eq!(w.args.width, 30);
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(0.0, 4), "░░░░");
        assert_eq!(bar(50.0, 4), "██░░");
        assert_eq!(bar(100.0, 4), "████");
        assert_eq!(bar(250.0, 4), "████");
    }

    #[test]
    fn text_output_lists_every_plan() {
        let report = StatsReport {
            summary: SummaryStats::default(),
            distribution: PlanDistribution::from_records(&[]),
            width: 10,
        };
        let mut buf = Vec::new();
        render_text(&report, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Plan 1  0  0%"));
        assert!(text.contains("Unlimited  0  0%"));
        assert!(!text.contains("unlisted"));
    }
}
