//! Scan, Show and Resolve commands.

use anyhow::Context;

use super::output::print_projection;
use crate::bootstrap::{BootstrapMode, Bootstrapper};
use crate::config::Settings;
use crate::registry::{Projection, project};

/// Cold bootstrap: scan every root, write the persisted file, print aliases.
pub async fn run_scan(config: &Settings, json: bool) -> anyhow::Result<()> {
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
    if !json {
        eprintln!(
            "Wrote {}",
            bootstrapper.persisted_file().path().display()
        );
    }
    Ok(())
}

/// Warm bootstrap: print aliases from the persisted file.
pub async fn run_show(config: &Settings, json: bool) -> anyhow::Result<()> {
    let mut bootstrapper = Bootstrapper::from_settings(config)?;
    let outcome = bootstrapper
        .run(BootstrapMode::Warm)
        .await
        .with_context(|| {
            format!(
                "Could not read {} (run `aliasmap scan` first)",
                config.resolved_persisted_path().display()
            )
        })?;

    print_projection(
        &Projection {
            aliases: outcome.aliases,
            duplicates: outcome.duplicates,
        },
        json,
    );
    Ok(())
}

/// Resolve one key against the persisted file.
///
/// Returns false when the key is unknown.
pub async fn run_resolve(config: &Settings, key: &str, json: bool) -> anyhow::Result<bool> {
    let map = config
        .persisted_file()
        .load()
        .await
        .context("Failed to load persisted aliases")?;

    let Some(winner) = map.winner(key) else {
        eprintln!("Unknown module key: {key}");
        return Ok(false);
    };

    if json {
        let projection = project(&map);
        let entry = projection.aliases.iter().find(|entry| entry.find == key);
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("{}", winner.display());
    }

    if let Some(candidates) = map.get(key).filter(|c| c.len() > 1) {
        eprintln!(
            "note: '{key}' has {} candidates, using the first",
            candidates.len()
        );
    }
    Ok(true)
}
