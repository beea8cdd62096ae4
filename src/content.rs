use std::path::Path;

use anyhow::Context as _;

use crate::error::PortraitResult;

/// Externally supplied default content, fetched once at load. Both fields
/// are optional; absence leaves the corresponding input unset.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ContentConfig {
    #[serde(default)]
    pub default_text: Option<String>,
    #[serde(default)]
    pub default_image_url: Option<String>,
}

pub fn load_content_config(path: &Path) -> PortraitResult<ContentConfig> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read content config '{}'", path.display()))?;
    let config: ContentConfig =
        serde_json::from_slice(&bytes).with_context(|| "parse content config JSON")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_unset_fields() {
        let config: ContentConfig = serde_json::from_str("{}").unwrap();
        assert!(config.default_text.is_none());
        assert!(config.default_image_url.is_none());
    }

    #[test]
    fn known_fields_deserialize() {
        let config: ContentConfig = serde_json::from_str(
            r#"{"default_text": "words words", "default_image_url": "portrait.jpg"}"#,
        )
        .unwrap();
        assert_eq!(config.default_text.as_deref(), Some("words words"));
        assert_eq!(config.default_image_url.as_deref(), Some("portrait.jpg"));
    }
}
