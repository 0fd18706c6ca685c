use figment::providers::{Format, Json, Toml, Yaml};
use std::path::Path;

/// Pick a figment provider for `path` from its extension, falling back to a look
/// at the content for unknown extensions. Returns a provider for `figment.merge()`.
pub fn auto<P: AsRef<Path>>(path: P) -> impl figment::Provider {
    let path = path.as_ref();
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "toml" => SmartProvider::Toml(Toml::file(path)),
        "json" => SmartProvider::Json(Json::file(path)),
        "yaml" | "yml" => SmartProvider::Yaml(Yaml::file(path)),
        _ => {
            let detected = std::fs::read_to_string(path)
                .ok()
                .and_then(|content| detect_format_from_content(&content));
            tracing::debug!(
                "Config {} has no known extension, detected format: {:?}",
                path.display(),
                detected
            );
            match detected {
                Some(ConfigFormat::Json) => SmartProvider::Json(Json::file(path)),
                Some(ConfigFormat::Yaml) => SmartProvider::Yaml(Yaml::file(path)),
                Some(ConfigFormat::Toml) | None => SmartProvider::Toml(Toml::file(path)),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

/// Wrapper enum to handle different provider types
enum SmartProvider {
    Toml(figment::providers::Data<Toml>),
    Json(figment::providers::Data<Json>),
    Yaml(figment::providers::Data<Yaml>),
}

impl figment::Provider for SmartProvider {
    fn metadata(&self) -> figment::Metadata {
        match self {
            SmartProvider::Toml(p) => p.metadata(),
            SmartProvider::Json(p) => p.metadata(),
            SmartProvider::Yaml(p) => p.metadata(),
        }
    }

    fn data(
        &self,
    ) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        match self {
            SmartProvider::Toml(p) => p.data(),
            SmartProvider::Json(p) => p.data(),
            SmartProvider::Yaml(p) => p.data(),
        }
    }
}

fn detect_format_from_content(content: &str) -> Option<ConfigFormat> {
    let trimmed = content.trim();

    if (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']') && !trimmed.contains('='))
    {
        return Some(ConfigFormat::Json);
    }

    // key = value or [table] lines
    if trimmed.lines().any(|line| {
        let line = line.trim();
        (line.starts_with('[') && line.ends_with(']')) || (line.contains('=') && !line.contains(':'))
    }) {
        return Some(ConfigFormat::Toml);
    }

    if trimmed.starts_with("---") || trimmed.lines().any(|line| line.trim().contains(": ") || line.trim().ends_with(':')) {
        return Some(ConfigFormat::Yaml);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Figment;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            detect_format_from_content(r#"{"compiler": "g++"}"#),
            Some(ConfigFormat::Json)
        );
        assert_eq!(detect_format_from_content("compiler: g++"), Some(ConfigFormat::Yaml));
        assert_eq!(
            detect_format_from_content("compiler = \"g++\"\nbatchSize = 2"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(detect_format_from_content(""), None);
    }

    #[test]
    fn test_extensionless_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("headertestrc");
        std::fs::write(&path, r#"{"compiler": "clang++"}"#).unwrap();

        let compiler: String = Figment::new()
            .merge(auto(&path))
            .extract_inner("compiler")
            .unwrap();
        assert_eq!(compiler, "clang++");
    }
}
