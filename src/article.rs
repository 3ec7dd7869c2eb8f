// src/article.rs
//! Article input model as delivered by the aggregation backend (camelCase JSON).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    /// "organization" | "person" | "location" | "city" | "country" | ...
    #[serde(rename = "type")]
    pub kind: String,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Storage key; not used for prompting.
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub source: Option<ArticleSource>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub sentiment_assessment: Option<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Article {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }

    /// Entity names whose type matches any of `kinds` (case-insensitive), in input order.
    pub fn entity_names<'a>(&'a self, kinds: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
        self.entities
            .iter()
            .filter(move |e| kinds.iter().any(|k| e.kind.trim().eq_ignore_ascii_case(k)))
            .map(|e| e.name.trim())
            .filter(|n| !n.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_shape() {
        let raw = r#"{
            "_id": "a-1",
            "title": "Chipmaker beats estimates",
            "source": {"name": "Reuters"},
            "categories": ["business", "technology"],
            "sentimentAssessment": "positive",
            "entities": [{"name": "Nvidia", "type": "organization"}],
            "description": "Quarterly revenue rose."
        }"#;
        let a: Article = serde_json::from_str(raw).unwrap();
        assert_eq!(a.id.as_deref(), Some("a-1"));
        assert_eq!(a.source_name(), Some("Reuters"));
        assert_eq!(a.sentiment_assessment.as_deref(), Some("positive"));
        assert_eq!(a.entities[0].kind, "organization");
    }

    #[test]
    fn only_title_is_required() {
        let a: Article = serde_json::from_str(r#"{"title":"t"}"#).unwrap();
        assert!(a.categories.is_empty());
        assert!(a.entities.is_empty());
        assert_eq!(a.source_name(), None);
        assert!(serde_json::from_str::<Article>(r#"{"categories":[]}"#).is_err());
    }

    #[test]
    fn entity_names_filters_by_kind() {
        let mut a = Article::new("t");
        a.entities = vec![
            Entity::new("Paris", "city"),
            Entity::new("ACME", "Organization"),
            Entity::new("France", "country"),
            Entity::new("  ", "country"),
        ];
        let locs: Vec<_> = a.entity_names(&["location", "city", "country"]).collect();
        assert_eq!(locs, vec!["Paris", "France"]);
        let orgs: Vec<_> = a.entity_names(&["organization"]).collect();
        assert_eq!(orgs, vec!["ACME"]);
    }
}
