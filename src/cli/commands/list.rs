use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::{load_settings, select_headers};
use crate::cli::Output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Include directory to scan (repeatable, replaces includeDirs)
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    pub include_dirs: Vec<String>,

    /// Descend into subdirectories
    #[arg(long)]
    pub recursive: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListOverrides {
    include_dirs: Vec<String>,
    recursive: Option<bool>,
}

/// Print one discovered header per line, as it would be passed to `#include`
pub async fn execute(args: ListArgs, config_path: Option<&str>, output: &Output) -> Result<()> {
    let overrides = ListOverrides {
        include_dirs: args.include_dirs,
        recursive: args.recursive.then_some(true),
    };
    let settings = load_settings(config_path, Some(overrides))?;
    let headers = select_headers(&[], &settings)?;

    if headers.is_empty() {
        output.warning(&format!(
            "No header files found in include directories: {}",
            settings.include_dirs.join(", ")
        ));
        return Ok(());
    }

    for header in &headers {
        println!("{header}");
    }
    output.verbose(&format!("{} headers", headers.len()));
    Ok(())
}
