//! `roster list`: one page of the subscriber table.

use crate::output::{self, OutputMode, coded, pretty_rule, truncate};
use anyhow::Result;
use clap::Args;
use roster_core::config::{EffectiveConfig, ProjectConfig};
use roster_core::debounce::WallScheduler;
use roster_core::error::ErrorCode;
use roster_core::paginate::PageLink;
use roster_core::store::{FileUrlStore, MemoryUrlStore, UrlStateStore};
use roster_core::{
    DashboardSession, DashboardView, PlanFilter, SessionSettings, SortField, StatusFilter,
    SubscriberRecord,
};
use std::env;
use std::io::{self, Write};
use std::ops::Range;
use std::path::Path;
use tracing::warn;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Search text matched against name and email.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Plan filter: "All" or a plan such as "Plan 3".
    #[arg(short, long)]
    pub plan: Option<String>,

    /// Status filter: All, Active or Expired.
    #[arg(long)]
    pub status: Option<String>,

    /// Click a column header (repeatable): name, email, plan, status,
    /// expiresOn, joinDate, country, revenue.
    #[arg(long = "sort", value_name = "FIELD")]
    pub sort: Vec<String>,

    /// Page to show; out-of-range values snap to the nearest page.
    #[arg(long, allow_negative_numbers = true)]
    pub page: Option<i64>,

    /// Start from this query fragment instead of the saved view.
    #[arg(long, value_name = "FRAGMENT", conflicts_with = "reset")]
    pub url: Option<String>,

    /// Start from the default view.
    #[arg(long)]
    pub reset: bool,

    /// Do not save the resulting view.
    #[arg(long)]
    pub no_save: bool,
}

fn parse_flag<T>(raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .map_err(|err| coded(ErrorCode::InvalidArgument, err))
}

pub fn run_list(
    args: &ListArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> Result<()> {
    // Validate every flag before touching the data files.
    let plan = args.plan.as_deref().map(parse_flag::<PlanFilter>).transpose()?;
    let status = args.status.as_deref().map(parse_flag::<StatusFilter>).transpose()?;
    let sorts = args
        .sort
        .iter()
        .map(|raw| parse_flag::<SortField>(raw))
        .collect::<Result<Vec<_>>>()?;

    let records = super::load_records(project_root, &config.data)?;

    let mut state = FileUrlStore::new(EffectiveConfig::resolve_path(
        project_root,
        &config.state.file,
    ));
    let initial = if args.reset {
        String::new()
    } else if let Some(url) = &args.url {
        url.clone()
    } else {
        state.read().unwrap_or_else(|err| {
            warn!(error = %err, "could not read saved view, using defaults");
            String::new()
        })
    };

    let mut session = DashboardSession::open(
        records,
        MemoryUrlStore::new(initial),
        WallScheduler::new(),
        SessionSettings::from(config),
    );

    if let Some(text) = &args.search {
        session.submit_search(text.as_str());
    }
    if let Some(plan) = plan {
        session.set_plan(plan);
    }
    if let Some(status) = status {
        session.set_status(status);
    }
    for field in sorts {
        session.click_sort(field);
    }
    if let Some(page) = args.page {
        session.go_to_page(page);
    }

    let view = session.view();
    if !args.no_save {
        let fragment = session.store().fragment();
        state
            .write(fragment)
            .map_err(|err| coded(ErrorCode::StateWriteFailed, err))?;
    }

    output::render_mode(output, &view, render_text, render_pretty)
}

const COLUMNS: [(SortField, usize); 8] = [
    (SortField::Name, 20),
    (SortField::Email, 26),
    (SortField::Plan, 10),
    (SortField::Status, 8),
    (SortField::ExpiresOn, 11),
    (SortField::JoinDate, 11),
    (SortField::Country, 10),
    (SortField::Revenue, 9),
];

fn cell(record: &SubscriberRecord, field: SortField) -> String {
    match field {
        SortField::Name => record.name.clone(),
        SortField::Email => record.email.clone(),
        SortField::Plan => record.plan.to_string(),
        SortField::Status => record.status.to_string(),
        SortField::ExpiresOn => record
            .expires_on
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string()),
        SortField::JoinDate => record.join_date.format("%Y-%m-%d").to_string(),
        SortField::Country => record.country.clone(),
        SortField::Revenue => record.revenue.to_string(),
    }
}

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Byte range of the first case-insensitive occurrence of `needle` in `text`.
fn match_span(text: &str, needle: &str) -> Option<Range<usize>> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    for (start, &(start_byte, _)) in chars.iter().enumerate() {
        let mut folded = Vec::with_capacity(needle.len());
        for (pos, &(_, c)) in chars.iter().enumerate().skip(start) {
            folded.extend(c.to_lowercase());
            if folded.len() >= needle.len() {
                if folded == needle {
                    let end = chars.get(pos + 1).map_or(text.len(), |&(i, _)| i);
                    return Some(start_byte..end);
                }
                break;
            }
        }
    }
    None
}

/// Pad `text` to `width` columns, bolding the search match when there is one.
fn padded_cell(text: &str, width: usize, needle: Option<&str>) -> String {
    let text = truncate(text, width);
    let pad = " ".repeat(width.saturating_sub(text.chars().count()));
    match needle.and_then(|n| match_span(&text, n)) {
        Some(span) => format!(
            "{}{BOLD}{}{RESET}{}{pad}",
            &text[..span.start],
            &text[span.clone()],
            &text[span.end..]
        ),
        None => format!("{text}{pad}"),
    }
}

fn header(view: &DashboardView, field: SortField) -> String {
    if view.query.sort_field() == field {
        format!("{}{}", field.label(), view.query.sort_direction().indicator())
    } else {
        field.label().to_string()
    }
}

fn pager(view: &DashboardView) -> String {
    let mut parts = Vec::with_capacity(view.page_links.len() + 2);
    if view.page > 1 {
        parts.push("«".to_string());
    }
    for link in &view.page_links {
        parts.push(match link {
            PageLink::Page(n) if *n == view.page => format!("[{n}]"),
            other => other.to_string(),
        });
    }
    if view.page < view.total_pages {
        parts.push("»".to_string());
    }
    parts.join(" ")
}

fn render_text(view: &DashboardView, w: &mut dyn Write) -> io::Result<()> {
    if !view.rows.is_empty() {
        let headers: Vec<String> = COLUMNS.iter().map(|&(f, _)| header(view, f)).collect();
        writeln!(w, "{}", headers.join("  "))?;
    }
    for record in &view.rows {
        let cells: Vec<String> = COLUMNS.iter().map(|&(f, _)| cell(record, f)).collect();
        writeln!(w, "{}", cells.join("  "))?;
    }
    writeln!(
        w,
        "page {}/{}  items {}  link {}",
        view.page,
        view.total_pages,
        view.total_items,
        if view.link.is_empty() { "-" } else { view.link.as_str() }
    )
}

fn render_pretty(view: &DashboardView, w: &mut dyn Write) -> io::Result<()> {
    let mut filters = Vec::new();
    if !view.query.search_text().is_empty() {
        filters.push(format!("search \"{}\"", view.query.search_text()));
    }
    if view.query.plan() != PlanFilter::All {
        filters.push(format!("plan {}", view.query.plan()));
    }
    if view.query.status() != StatusFilter::All {
        filters.push(format!("status {}", view.query.status()));
    }
    let heading = if filters.is_empty() {
        format!("Subscribers ({})", view.total_items)
    } else {
        format!("Subscribers ({}) · {}", view.total_items, filters.join(" · "))
    };
    writeln!(w, "{heading}")?;
    pretty_rule(w)?;

    if view.rows.is_empty() {
        writeln!(w, "No subscribers match the current filters.")?;
    } else {
        let line: Vec<String> = COLUMNS
            .iter()
            .map(|&(f, width)| format!("{:<width$}", truncate(&header(view, f), width)))
            .collect();
        writeln!(w, "{}", line.join(" ").trim_end())?;
        let needle = Some(view.query.search_text())
            .filter(|text| !text.is_empty() && env::var_os("NO_COLOR").is_none());
        for record in &view.rows {
            let line: Vec<String> = COLUMNS
                .iter()
                .map(|&(f, width)| {
                    let searched = matches!(f, SortField::Name | SortField::Email);
                    padded_cell(&cell(record, f), width, needle.filter(|_| searched))
                })
                .collect();
            writeln!(w, "{}", line.join(" ").trim_end())?;
        }
    }

    pretty_rule(w)?;
    writeln!(w, "{}   page {} of {}", pager(view), view.page, view.total_pages)?;
    if !view.link.is_empty() {
        writeln!(w, "link: {}", view.link)?;
    }
    Ok(())
}
