//! The `guuk history`, `guuk results` and `guuk download` commands.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use comfy_table::{Cell, Table};

use guuk_core::history::{filter_quiz_results, HistoryAggregator};
use guuk_core::model::HistoryEntry;

use super::{truncate, App};

async fn fetch(app: &App) -> Result<HistoryAggregator> {
    let session = app.session()?;
    let mut history = HistoryAggregator::new();
    history.refresh(&*app.backend, session).await?;
    Ok(history)
}

fn when(entry: &HistoryEntry) -> String {
    entry
        .created_at
        .or(entry.submitted_at)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

pub async fn show(
    config_path: Option<&Path>,
    kind: Option<String>,
    json: Option<PathBuf>,
) -> Result<()> {
    let app = App::load(config_path)?;
    let history = fetch(&app).await?;

    if let Some(path) = json {
        history.save_json(&path)?;
        println!("Wrote {} entries to {}", history.len(), path.display());
    }
    if history.is_empty() {
        println!("No history yet.");
        return Ok(());
    }

    let entries = history.entries();
    for (group, members) in history.group_by_kind() {
        if kind.as_deref().is_some_and(|k| k != group) {
            continue;
        }
        let mut table = Table::new();
        table.set_header(vec!["#", "When", "Provider", "Prompt", "Content"]);
        for entry in members {
            let number = entries
                .iter()
                .position(|e| std::ptr::eq(e, entry))
                .map_or(0, |i| i + 1);
            let content = entry
                .storage_url
                .as_deref()
                .or(entry.output.as_deref())
                .map(|c| truncate(c, 60))
                .unwrap_or_else(|| score_label(entry));
            table.add_row(vec![
                Cell::new(number),
                Cell::new(when(entry)),
                Cell::new(entry.provider.as_deref().unwrap_or("")),
                Cell::new(truncate(
                    entry.prompt.as_deref().or(entry.title.as_deref()).unwrap_or(""),
                    40,
                )),
                Cell::new(content),
            ]);
        }
        println!("{group}\n{table}\n");
    }
    Ok(())
}

fn score_label(entry: &HistoryEntry) -> String {
    match (entry.score, entry.total) {
        (Some(score), Some(total)) => format!("{score}/{total}"),
        (Some(score), None) => score.to_string(),
        _ => String::new(),
    }
}

pub async fn results(config_path: Option<&Path>) -> Result<()> {
    let app = App::load(config_path)?;
    let history = fetch(&app).await?;
    let results = filter_quiz_results(history.entries());

    if results.is_empty() {
        println!("No quiz results yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Quiz", "Score", "Submitted"]);
    for entry in results {
        let quiz = entry
            .title
            .as_deref()
            .or(entry.quiz_id.as_deref())
            .unwrap_or("");
        table.add_row(vec![
            Cell::new(truncate(quiz, 40)),
            Cell::new(score_label(entry)),
            Cell::new(when(entry)),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn download(config_path: Option<&Path>, index: usize, dir: PathBuf) -> Result<()> {
    let app = App::load(config_path)?;
    let history = fetch(&app).await?;
    let entry = index
        .checked_sub(1)
        .and_then(|i| history.entries().get(i))
        .ok_or_else(|| {
            anyhow!(
                "no history entry #{index} (history has {} entries)",
                history.len()
            )
        })?;

    let path = app.backend.download_media(entry, &dir).await?;
    println!("Saved {}", path.display());
    Ok(())
}
