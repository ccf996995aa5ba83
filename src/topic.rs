// Kafka topic lookup
// Finds the topic bound to a named data source in a pipeline configuration
//
// Numan Thabit 2025 Nov

use crate::topology::PipelineConfig;
use thiserror::Error;
use tracing::warn;

const KAFKA_TYPE: &str = "KAFKA";
const TOPIC_KEY: &str = "topic";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("type of data source should be KAFKA, found {0}")]
    NotKafka(String),
    #[error("data source config has no string `topic` field")]
    MissingTopic,
}

impl PipelineConfig {
    /// Topic of the Kafka data source whose display name is `source_name`.
    ///
    /// `Ok(None)` means no data source carries that name. When several
    /// records share the name, the first one in document order is used.
    pub fn find_topic(&self, source_name: &str) -> Result<Option<String>, TopicError> {
        let mut matches = self
            .data_sources
            .iter()
            .filter(|source| source.ui_name == source_name);

        let Some(source) = matches.next() else {
            return Ok(None);
        };

        let shadowed = matches.count();
        if shadowed > 0 {
            warn!(
                source = source_name,
                shadowed = shadowed,
                "multiple data sources share a display name; using the first"
            );
        }

        if !source.source_type.eq_ignore_ascii_case(KAFKA_TYPE) {
            return Err(TopicError::NotKafka(source.source_type.clone()));
        }

        source
            .config
            .get(TOPIC_KEY)
            .and_then(|topic| topic.as_str())
            .map(|topic| Some(topic.to_string()))
            .ok_or(TopicError::MissingTopic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(sources: serde_json::Value) -> PipelineConfig {
        PipelineConfig::parse("p", json!({ "dataSources": sources })).unwrap()
    }

    #[test]
    fn test_finds_kafka_topic() {
        let cfg = config(json!([
            { "uiname": "files", "type": "HDFS", "config": { "path": "/in" } },
            { "uiname": "clicks", "type": "KAFKA", "config": { "topic": "t1" } }
        ]));
        assert_eq!(cfg.find_topic("clicks"), Ok(Some("t1".to_string())));
    }

    #[test]
    fn test_kafka_type_is_case_insensitive() {
        let cfg = config(json!([
            { "uiname": "clicks", "type": "kafka", "config": { "topic": "t1" } }
        ]));
        assert_eq!(cfg.find_topic("clicks"), Ok(Some("t1".to_string())));
    }

    #[test]
    fn test_non_kafka_match_is_an_error() {
        let cfg = config(json!([
            { "uiname": "clicks", "type": "KINESIS", "config": { "topic": "t1" } },
            { "uiname": "other", "type": "KAFKA", "config": { "topic": "t2" } }
        ]));
        assert_eq!(
            cfg.find_topic("clicks"),
            Err(TopicError::NotKafka("KINESIS".to_string()))
        );
    }

    #[test]
    fn test_no_match_is_none() {
        let cfg = config(json!([
            { "uiname": "clicks", "type": "KAFKA", "config": { "topic": "t1" } }
        ]));
        assert_eq!(cfg.find_topic("views"), Ok(None));
        assert_eq!(PipelineConfig::default().find_topic("views"), Ok(None));
    }

    #[test]
    fn test_missing_or_non_string_topic() {
        let cfg = config(json!([
            { "uiname": "a", "type": "KAFKA", "config": {} },
            { "uiname": "b", "type": "KAFKA", "config": { "topic": 42 } }
        ]));
        assert_eq!(cfg.find_topic("a"), Err(TopicError::MissingTopic));
        assert_eq!(cfg.find_topic("b"), Err(TopicError::MissingTopic));
    }

    #[test]
    fn test_duplicate_names_use_first_match() {
        let cfg = config(json!([
            { "uiname": "clicks", "type": "KAFKA", "config": { "topic": "first" } },
            { "uiname": "clicks", "type": "KAFKA", "config": { "topic": "second" } }
        ]));
        assert_eq!(cfg.find_topic("clicks"), Ok(Some("first".to_string())));
    }
}
