//! `roster link`: inspect and normalize a query fragment.

use crate::output::{self, OutputMode, pretty_kv, pretty_section};
use anyhow::Result;
use clap::Args;
use roster_core::codec;
use roster_core::config::{EffectiveConfig, ProjectConfig};
use roster_core::store::{FileUrlStore, UrlStateStore};
use roster_core::QueryState;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Fragment or full URL to decode; defaults to the saved view.
    #[arg(value_name = "FRAGMENT")]
    pub fragment: Option<String>,
}

#[derive(Debug, Serialize)]
struct LinkReport {
    input: String,
    query: QueryState,
    /// Canonical encoding without the leading `?`.
    fragment: String,
    link: String,
    normalized: bool,
}

impl LinkReport {
    fn new(input: String) -> Self {
        let query = codec::decode(&input);
        let fragment = codec::encode(&query);
        let link = codec::encode_link(&query);
        let normalized = input != fragment && input != link;
        Self {
            input,
            query,
            fragment,
            link,
            normalized,
        }
    }
}

pub fn run_link(
    args: &LinkArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> Result<()> {
    let input = match &args.fragment {
        Some(fragment) => fragment.clone(),
        None => FileUrlStore::new(EffectiveConfig::resolve_path(
            project_root,
            &config.state.file,
        ))
        .read()?,
    };
    let report = LinkReport::new(input);
    output::render_mode(output, &report, render_text, render_pretty)
}

fn render_text(report: &LinkReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", report.link)
}

fn render_pretty(report: &LinkReport, w: &mut dyn Write) -> io::Result<()> {
    let q = &report.query;
    pretty_section(w, "Query state")?;
    pretty_kv(w, "Search", format!("{:?}", q.search_text()))?;
    pretty_kv(w, "Plan", q.plan().as_str())?;
    pretty_kv(w, "Status", q.status().as_str())?;
    pretty_kv(
        w,
        "Sort",
        format!("{} {}", q.sort_field().label(), q.sort_direction().indicator()),
    )?;
    pretty_kv(w, "Page", q.page().to_string())?;
    writeln!(w)?;
    pretty_kv(
        w,
        "Link",
        if report.link.is_empty() { "(default view)" } else { report.link.as_str() },
    )?;
    if report.normalized {
        pretty_kv(w, "Input", &report.input)?;
    }
    Ok(())
}
