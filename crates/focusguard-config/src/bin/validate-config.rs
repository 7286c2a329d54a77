//! Config validation CLI tool
//!
//! Validates a focusguardd configuration file and reports any errors.

use focusguard_config::{ConfigError, CURRENT_CONFIG_VERSION};
use focusguard_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a focusguardd configuration file.");
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match focusguard_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!(
                "  Session: {} min default, {} min max",
                policy.session.default_duration_minutes, policy.session.max_duration_minutes
            );
            println!(
                "  Verification phrases: {}",
                policy.session.verification_phrases.len()
            );
            println!(
                "  Rules: ids from {}, redirect to {}",
                policy.rules.id_offset, policy.rules.redirect_path
            );

            if !policy.predefined_groups.is_empty() {
                println!();
                println!("Predefined groups:");
                for group in &policy.predefined_groups {
                    println!(
                        "  - {} ({} sites, {} min)",
                        group.name,
                        group.websites.len(),
                        group.time_limit_minutes
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
