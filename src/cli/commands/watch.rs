//! Watch command - cold bootstrap, then stream registry changes.

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;

use super::output::{print_projection, use_color};
use crate::bootstrap::{BootstrapMode, Bootstrapper};
use crate::config::Settings;
use crate::registry::Projection;
use crate::watcher::RegistryEvent;

pub async fn run_watch(config: &Settings, json: bool) -> anyhow::Result<()> {
    let mut bootstrapper = Bootstrapper::from_settings(config)?;
    let outcome = bootstrapper
        .run(BootstrapMode::Cold)
        .await
        .context("Cold bootstrap failed")?;

    print_projection(
        &Projection {
            aliases: outcome.aliases,
            duplicates: outcome.duplicates,
        },
        json,
    );

    let Some(watcher) = outcome.watcher else {
        anyhow::bail!("Cold bootstrap returned no watcher");
    };

    for root in watcher.watched_roots() {
        eprintln!("Watching {}", root.display());
    }
    eprintln!("Press Ctrl+C to stop.");

    let color = use_color();
    let mut events = watcher.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Stopping.");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(line) = describe(&event, color) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[watch] missed {skipped} registry events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    Ok(())
}

fn describe(event: &RegistryEvent, color: bool) -> Option<String> {
    use owo_colors::OwoColorize;

    let (tag, text) = match event {
        RegistryEvent::AliasAdded { key, path } => ("+", format!("{key} -> {}", path.display())),
        RegistryEvent::AliasRemoved { key, path } => ("-", format!("{key} -> {}", path.display())),
        RegistryEvent::PersistFailed { reason } => ("!", format!("persist failed: {reason}")),
        RegistryEvent::Synced { .. } | RegistryEvent::ScanComplete { .. } => return None,
    };

    if !color {
        return Some(format!("{tag} {text}"));
    }
    let tag = match tag {
        "+" => tag.green().to_string(),
        "-" => tag.red().to_string(),
        _ => tag.yellow().bold().to_string(),
    };
    Some(format!("{tag} {text}"))
}
