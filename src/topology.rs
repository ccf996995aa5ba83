// Pipeline layout module
// Typed view over the persisted pipeline configuration document.
// The raw document is parsed once at the boundary so the rest of the crate
// never walks untyped maps.
//
// Numan Thabit 2025 Nov

use crate::errors::MetricsError;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct PipelineLayout {
    pub id: u64,
    pub name: String,
    pub config: PipelineConfig,
}

/// Layout document as stored; `config` is checked by `PipelineConfig::parse`.
#[derive(Deserialize)]
struct StoredLayout {
    id: u64,
    name: String,
    #[serde(default)]
    config: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub id: String,
    pub name: String,
}

impl Component {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub data_sources: Vec<DataSourceConfig>,
}

#[derive(Deserialize)]
struct StoredPipelineConfig {
    #[serde(rename = "dataSources", default)]
    data_sources: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceConfig {
    #[serde(rename = "uiname")]
    pub ui_name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub config: Map<String, Value>,
}

impl PipelineConfig {
    /// Parse the raw configuration document stored for `pipeline`.
    ///
    /// Data sources are checked one record at a time so a failure names the
    /// offending source by its `uiname` when it has one.
    pub fn parse(pipeline: &str, value: Value) -> Result<Self, MetricsError> {
        let malformed = |component: Option<String>, reason: String| MetricsError::ConfigMalformed {
            pipeline: pipeline.to_string(),
            component,
            reason,
        };

        let stored: StoredPipelineConfig =
            serde_json::from_value(value).map_err(|e| malformed(None, e.to_string()))?;
        let data_sources = stored
            .data_sources
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let ui_name = record
                    .get("uiname")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                serde_json::from_value(record)
                    .map_err(|e| malformed(ui_name, format!("data source #{index}: {e}")))
            })
            .collect::<Result<Vec<DataSourceConfig>, _>>()?;

        Ok(Self { data_sources })
    }
}

impl StoredLayout {
    fn into_layout(self) -> Result<PipelineLayout, MetricsError> {
        let config = match self.config {
            Some(value) => PipelineConfig::parse(&self.name, value)?,
            None => PipelineConfig::default(),
        };
        Ok(PipelineLayout {
            id: self.id,
            name: self.name,
            config,
        })
    }
}

impl PipelineLayout {
    pub fn from_json(raw: &str) -> Result<Self> {
        let stored: StoredLayout = serde_json::from_str(raw).context("parse pipeline layout JSON")?;
        Ok(stored.into_layout()?)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let stored: StoredLayout = serde_yaml::from_str(raw).context("parse pipeline layout YAML")?;
        Ok(stored.into_layout()?)
    }

    /// Load a layout file, picking the format from the extension.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read pipeline layout {}", path.display()))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&raw),
            _ => Self::from_json(&raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_layout_json() {
        let raw = json!({
            "id": 7,
            "name": "clickstream",
            "config": {
                "dataSources": [
                    { "uiname": "clicks", "type": "KAFKA", "config": { "topic": "clicks-v1" } }
                ],
                "processors": []
            }
        })
        .to_string();

        let layout = PipelineLayout::from_json(&raw).unwrap();
        assert_eq!(layout.id, 7);
        assert_eq!(layout.config.data_sources.len(), 1);
        assert_eq!(layout.config.data_sources[0].ui_name, "clicks");
        assert_eq!(layout.config.data_sources[0].config["topic"], "clicks-v1");
    }

    #[test]
    fn test_parse_layout_yaml_without_sources() {
        let raw = "id: 3\nname: empty\n";
        let layout = PipelineLayout::from_yaml(raw).unwrap();
        assert!(layout.config.data_sources.is_empty());
    }

    #[test]
    fn test_data_source_missing_type_is_rejected() {
        let value = json!({
            "dataSources": [
                { "uiname": "ok", "type": "HDFS", "config": {} },
                { "uiname": "x", "config": {} }
            ]
        });
        match PipelineConfig::parse("p1", value).unwrap_err() {
            MetricsError::ConfigMalformed { pipeline, component, reason } => {
                assert_eq!(pipeline, "p1");
                assert_eq!(component.as_deref(), Some("x"));
                assert!(reason.contains("#1"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unnamed_data_source_has_no_component() {
        let value = json!({ "dataSources": [ { "type": "KAFKA", "config": {} } ] });
        assert!(matches!(
            PipelineConfig::parse("p1", value),
            Err(MetricsError::ConfigMalformed { component: None, .. })
        ));

        let value = json!({ "dataSources": { "uiname": "x" } });
        assert!(matches!(
            PipelineConfig::parse("p1", value),
            Err(MetricsError::ConfigMalformed { component: None, .. })
        ));
    }

    #[test]
    fn test_layout_file_with_bad_source_is_config_malformed() {
        let raw = json!({
            "id": 7,
            "name": "clickstream",
            "config": { "dataSources": [ { "uiname": "clicks", "type": "KAFKA" } ] }
        })
        .to_string();

        let err = PipelineLayout::from_json(&raw).unwrap_err();
        match err.downcast_ref::<MetricsError>() {
            Some(MetricsError::ConfigMalformed { pipeline, component, .. }) => {
                assert_eq!(pipeline, "clickstream");
                assert_eq!(component.as_deref(), Some("clicks"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let yaml = "id: 7\nname: clickstream\nconfig:\n  dataSources:\n    - uiname: clicks\n      type: KAFKA\n      config: nope\n";
        let err = PipelineLayout::from_yaml(yaml).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MetricsError>(),
            Some(MetricsError::ConfigMalformed { .. })
        ));
    }

    #[test]
    fn test_null_config_is_empty() {
        let layout = PipelineLayout::from_json(r#"{"id": 1, "name": "p", "config": null}"#).unwrap();
        assert!(layout.config.data_sources.is_empty());
    }

    #[test]
    fn test_data_source_non_object_config_is_rejected() {
        let value = json!({ "dataSources": [ { "uiname": "x", "type": "KAFKA", "config": "nope" } ] });
        assert!(PipelineConfig::parse("p1", value).is_err());
    }
}
