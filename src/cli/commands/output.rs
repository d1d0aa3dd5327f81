//! Shared alias/diagnostic printing for the registry commands.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::registry::{AliasEntry, DuplicateReport, Projection};

/// Colors are off when NO_COLOR is set or stdout is not a terminal.
pub fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

pub fn alias_line(entry: &AliasEntry, color: bool) -> String {
    let path = entry.replacement.display().to_string();
    if color {
        format!("{} -> {}", entry.find.green(), path)
    } else {
        format!("{} -> {path}", entry.find)
    }
}

pub fn duplicate_block(report: &DuplicateReport, color: bool) -> String {
    let mut out = String::new();
    let header = format!(
        "duplicate module key '{}' ({} candidates):",
        report.key,
        report.candidates.len()
    );
    if color {
        out.push_str(&format!("{}\n", header.yellow().bold()));
    } else {
        out.push_str(&header);
        out.push('\n');
    }
    for (i, candidate) in report.candidates.iter().enumerate() {
        let path = candidate.display().to_string();
        match (i == 0, color) {
            (true, true) => out.push_str(&format!("  - {} {}\n", path, "(in use)".cyan())),
            (true, false) => out.push_str(&format!("  - {path} (in use)\n")),
            (false, true) => out.push_str(&format!("  - {}\n", path.dimmed())),
            (false, false) => out.push_str(&format!("  - {path}\n")),
        }
    }
    out
}

/// Print a projection as text lines or as a JSON document.
pub fn print_projection(projection: &Projection, json: bool) {
    if json {
        match serde_json::to_string_pretty(projection) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Error serializing aliases: {e}"),
        }
        return;
    }

    let color = use_color();
    if projection.aliases.is_empty() {
        println!("No aliases found.");
    }
    for entry in &projection.aliases {
        println!("{}", alias_line(entry, color));
    }
    if projection.has_duplicates() {
        println!();
        for report in &projection.duplicates {
            print!("{}", duplicate_block(report, color));
        }
    }
}
