//! Configuration command implementations
//!
//! Inspect and sanity-check the merged headertest configuration.

use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

use crate::cli::Output;
use crate::compile::is_compiler_available;
use crate::config::{HeaderTestConfig, Settings};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the merged configuration as JSON
    Show {
        /// Only print this section (dot-separated path, e.g. `includeDirs`)
        #[arg(long)]
        section: Option<String>,
    },
    /// Check that the compiler and include directories exist
    Validate,
}

/// Execute config commands
pub async fn execute(cmd: ConfigCommands, config_path: Option<&str>, output: &Output) -> Result<()> {
    let config = HeaderTestConfig::load_with(config_path, None::<()>)?;
    match cmd {
        ConfigCommands::Show { section } => show(&config, section.as_deref()),
        ConfigCommands::Validate => validate(&config, output),
    }
}

fn show(config: &HeaderTestConfig, section: Option<&str>) -> Result<()> {
    let value = match section {
        Some(path) => config.get_section(path)?,
        None => config.get_full_config()?,
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn validate(config: &HeaderTestConfig, output: &Output) -> Result<()> {
    output.header("Validating Configuration");

    let settings = config.settings()?;
    let problems = check_settings(&settings, output);

    output.key_value("Strategy", &settings.strategy().describe(), false);
    match settings.timeout() {
        Some(limit) => output.key_value("Timeout", &format!("{}s", limit.as_secs()), false),
        None => output.key_value("Timeout", "none", false),
    }

    if problems > 0 {
        anyhow::bail!("Configuration has {problems} problem(s)");
    }
    output.success("Configuration is valid");
    Ok(())
}

/// Report each check and return how many failed
fn check_settings(settings: &Settings, output: &Output) -> usize {
    let mut problems = 0;

    let found = is_compiler_available(&settings.compiler);
    output.status_indicator(
        if found { "FOUND" } else { "MISSING" },
        &format!("compiler '{}'", settings.compiler),
        found,
    );
    problems += usize::from(!found);

    if settings.include_dirs.is_empty() {
        output.warning("No include directories configured");
    }

    for dir in settings.include_dirs.iter().chain(&settings.imported_include_dirs) {
        let exists = Path::new(dir).is_dir();
        output.status_indicator(
            if exists { "OK" } else { "MISSING" },
            &format!("include directory {dir}"),
            exists,
        );
        problems += usize::from(!exists);
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(json: &str) -> Settings {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_compiler_and_dirs_counted() {
        let output = Output::new(false, true);
        let settings = settings(
            r#"{
                "compiler": "headertest-absent-compiler-42aa",
                "includeDirs": ["/definitely/not/here/include"],
                "importedIncludeDirs": ["/definitely/not/here/imported"]
            }"#,
        );
        assert_eq!(check_settings(&settings, &output), 3);
    }

    #[test]
    fn test_existing_dirs_pass() {
        let dir = tempfile::tempdir().unwrap();
        let output = Output::new(false, true);
        let mut settings = settings(r#"{"compiler": "headertest-absent-compiler-42aa"}"#);
        settings.include_dirs = vec![dir.path().display().to_string()];
        // Only the compiler is missing
        assert_eq!(check_settings(&settings, &output), 1);
    }
}
