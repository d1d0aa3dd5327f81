//! Init and Config commands.

use std::path::Path;

use crate::config::{LOCAL_DIR_NAME, SETTINGS_FILE_NAME, Settings};

/// Run init command - create configuration file in `root`.
pub fn run_init(root: &Path, force: bool) {
    let config_path = root.join(LOCAL_DIR_NAME).join(SETTINGS_FILE_NAME);

    if config_path.exists() && !force {
        eprintln!(
            "Configuration file already exists at: {}",
            config_path.display()
        );
        eprintln!("Use --force to overwrite");
        std::process::exit(1);
    }

    match Settings::init_config_file(root, force) {
        Ok(path) => {
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
            ensure_persisted_file(&path);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Warm starts need the persisted file to exist; seed an empty one.
fn ensure_persisted_file(config_path: &Path) {
    let settings = match Settings::load_from(config_path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let file = settings.persisted_file();
    match file.ensure_exists() {
        Ok(true) => println!("Created empty alias file at: {}", file.path().display()),
        Ok(false) => {}
        Err(e) => eprintln!("Warning: {e}"),
    }
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    match toml::to_string_pretty(config) {
        Ok(toml_str) => println!("{toml_str}"),
        Err(e) => eprintln!("Error displaying config: {e}"),
    }
}
