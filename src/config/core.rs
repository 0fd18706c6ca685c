use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::Serialize;
use std::path::Path;

use super::Settings;
use super::overrides::filter_unset;
use super::smart_load;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const ENV_PREFIX: &str = "HEADERTEST_";

pub struct HeaderTestConfig {
    figment: Figment,
}

impl HeaderTestConfig {
    pub fn load() -> Result<Self> {
        Self::load_with(None, None::<()>)
    }

    /// Load the layered configuration.
    ///
    /// With `custom_config`, only that file is read on top of the defaults and it
    /// must exist. `cli_overrides` is serialized and applied last; `None` fields and
    /// empty lists in it are ignored so unset flags do not clobber file values.
    pub fn load_with<T: Serialize>(custom_config: Option<&str>, cli_overrides: Option<T>) -> Result<Self> {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(custom_path) = custom_config {
            if !Path::new(custom_path).is_file() {
                bail!("Config file not found: {custom_path}");
            }
            figment = figment.merge(smart_load::auto(custom_path));
        } else {
            figment = figment
                // Legacy location read by earlier releases
                .merge(Json::file("config.json"))
                .merge(Toml::file("headertest.toml"))
                .merge(Json::file("headertest.json"))
                .merge(Yaml::file("headertest.yaml"))
                .merge(Yaml::file("headertest.yml"));
        }

        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .lowercase(false)
                .map(|key| env_key_to_camel(key.as_str()).into()),
        );

        if let Some(overrides) = cli_overrides {
            tracing::trace!("CONFIG LOAD: Applying CLI overrides");
            figment = figment.merge(Serialized::defaults(filter_unset(overrides)));
        }

        Ok(HeaderTestConfig { figment })
    }

    /// Extract typed settings; malformed values surface here
    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract::<Settings>()
            .context("Invalid headertest configuration")
    }

    /// Get a nested object/section as JSON
    pub fn get_section(&self, path: &str) -> Result<serde_json::Value> {
        Ok(self.figment.extract_inner(path)?)
    }

    /// Get the full merged configuration as a structured value
    pub fn get_full_config(&self) -> Result<serde_json::Value> {
        Ok(self.figment.extract()?)
    }
}

/// `BATCH_SIZE` -> `batchSize`
fn env_key_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch.to_ascii_lowercase());
        }
    }
    out
}
