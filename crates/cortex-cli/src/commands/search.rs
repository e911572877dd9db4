//! The `cortex search` command.

use anyhow::Result;
use serde::Serialize;

use cortex_core::config::CortexConfig;
use cortex_core::search::{self, group_hits, NavigationTarget, SearchIndex, MIN_QUERY_CHARS};

use super::load_content;

#[derive(Serialize)]
struct JsonHit<'a> {
    kind: search::EntryKind,
    score: u32,
    title: &'a str,
    region: &'a str,
    system: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'a str>,
    target: &'a NavigationTarget,
}

pub fn execute(config: &CortexConfig, query: Vec<String>, json: bool) -> Result<()> {
    let content = load_content(config)?;
    let index = SearchIndex::build(&content);
    let query = query.join(" ");
    let hits = index.search(&query);

    if json {
        let rows: Vec<JsonHit<'_>> = hits
            .iter()
            .map(|hit| JsonHit {
                kind: hit.entry.kind,
                score: hit.score,
                title: &hit.entry.title,
                region: &hit.entry.region,
                system: &hit.entry.system,
                mode: hit.entry.mode.as_deref(),
                target: &hit.entry.target,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if query.trim().chars().count() < MIN_QUERY_CHARS {
        println!("Type at least {MIN_QUERY_CHARS} characters to search.");
        return Ok(());
    }
    if hits.is_empty() {
        println!("No results for \"{}\".", query.trim());
        return Ok(());
    }

    println!("{} result(s) for \"{}\"", hits.len(), query.trim());
    let mut n = 0;
    for (kind, group) in group_hits(&hits) {
        println!("\n{}", kind.heading());
        for hit in group {
            n += 1;
            let entry = hit.entry;
            let mode = entry
                .mode
                .as_deref()
                .map(|m| format!(" [{m}]"))
                .unwrap_or_default();
            println!(
                "  {n:>2}. {}  ({} / {}){mode}",
                emphasize(&entry.title, &query),
                entry.region,
                entry.system
            );
            let snippet = entry.snippet();
            if !snippet.is_empty() {
                println!("      {}", emphasize(&snippet, &query));
            }
        }
    }
    Ok(())
}

/// Terminal rendering of search highlights.
pub(crate) fn emphasize(text: &str, query: &str) -> String {
    search::highlight(text, query)
        .replace("<mark>", "*")
        .replace("</mark>", "*")
}
