//! The `cortex show` command: follow a search hit to its content.

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use cortex_core::clock::SystemClock;
use cortex_core::config::CortexConfig;
use cortex_core::navigator::format_options;
use cortex_core::search::{group_hits, NavigationTarget, SearchIndex};
use cortex_core::QuizEngine;

use super::{load_content, open_storage};

pub fn execute(config: &CortexConfig, query: Vec<String>, hit: usize) -> Result<()> {
    let content = load_content(config)?;
    let index = SearchIndex::build(&content);
    let query = query.join(" ");
    let hits = index.search(&query);

    // Same numbering as `cortex search`, which lists hits grouped by kind.
    let ordered: Vec<_> = group_hits(&hits)
        .into_iter()
        .flat_map(|(_, group)| group)
        .collect();
    if ordered.is_empty() {
        bail!("no results for \"{}\"", query.trim());
    }
    let chosen = hit
        .checked_sub(1)
        .and_then(|i| ordered.get(i))
        .with_context(|| format!("hit {hit} out of range (1-{})", ordered.len()))?;

    match &chosen.entry.target {
        NavigationTarget::Atlas {
            region,
            system,
            topic,
        } => {
            let topic = content
                .atlas_topic(region, system, topic)
                .with_context(|| format!("atlas topic '{topic}' not found"))?;
            println!("{}", topic.title);
            println!("{region} / {system}");
            if let Some(subtitle) = &topic.subtitle {
                println!("{subtitle}");
            }
            if let Some(description) = &topic.description {
                println!("\n{description}");
            }
            for detail in &topic.details {
                if let Some(text) = &detail.text {
                    println!("\n{text}");
                }
                for point in detail.points.iter().filter_map(|p| p.text()) {
                    println!("  - {point}");
                }
            }
            if let Some(clinical) = &topic.clinical {
                println!("\nClinical: {clinical}");
            }
        }
        NavigationTarget::Why { id, title } => {
            let card = id
                .as_ref()
                .and_then(|id| content.why_card(id))
                .or_else(|| content.why_cards().iter().find(|c| &c.title == title))
                .with_context(|| format!("why card '{title}' not found"))?;
            println!("{}", card.title);
            println!("{} / {}", card.category, card.comparison);
            println!("\n{}", card.why);
        }
        target @ NavigationTarget::Quiz { mode, .. } => {
            let mut engine = QuizEngine::new(content.clone(), open_storage(config), Arc::new(SystemClock));
            engine.navigate_to(target)?;
            let selection = engine.selection().clone();
            let (Some(region), Some(system)) = (selection.region, selection.system) else {
                bail!("quiz target did not select a region and system");
            };
            println!("Quiz: {region} - {system}");
            for option in format_options(&content, region, system) {
                let marker = if option.choice == *mode { " <" } else { "" };
                println!("  {:<18} {:>4} question(s){marker}", option.label, option.count);
            }
            println!(
                "\nStart with: cortex quiz --region \"{region}\" --system \"{system}\" --format {mode}"
            );
        }
    }
    Ok(())
}
