// src/prompt.rs
//! Prompt builder: article fields -> deterministic instruction block.
//!
//! The same article always yields the same bytes. No clocks, no randomness.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use crate::article::Article;
use crate::insight::InsightType;

pub const NONE_IDENTIFIED: &str = "None identified";

const ORGANIZATION_KINDS: &[&str] = &["organization", "organisation", "company"];
const PERSON_KINDS: &[&str] = &["person"];
const LOCATION_KINDS: &[&str] = &["location", "city", "country", "region", "state"];

/// Immutable prompt text, cheap to share across provider attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(Arc<str>);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when both handles point at the same allocation.
    pub fn same_allocation(&self, other: &Prompt) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Prompt {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

/// Collapse whitespace, decode HTML entities and drop markup from a field.
fn clean_field(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    let stripped = re_tags.replace_all(&decoded, "");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&stripped, " ").trim().to_string()
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let cleaned: Vec<String> = items
        .map(clean_field)
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.is_empty() {
        NONE_IDENTIFIED.to_string()
    } else {
        cleaned.join(", ")
    }
}

fn field_or(value: Option<&str>, fallback: &str) -> String {
    value
        .map(clean_field)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Build the prompt for one article.
pub fn build_prompt(article: &Article) -> Prompt {
    let organizations = join_or_none(article.entity_names(ORGANIZATION_KINDS));
    let people = join_or_none(article.entity_names(PERSON_KINDS));
    let locations = join_or_none(article.entity_names(LOCATION_KINDS));
    let categories = join_or_none(article.categories.iter().map(String::as_str));

    let title = clean_field(&article.title);
    let source = field_or(article.source_name(), "Unknown");
    let sentiment = field_or(article.sentiment_assessment.as_deref(), "Not assessed");
    let description = field_or(article.description.as_deref(), "No description available");

    let types = InsightType::ALL
        .iter()
        .map(|t| format!("\"{}\"", t.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    let text = format!(
        concat!(
            "Analyze the following news article and predict its most likely consequences.\n",
            "\n",
            "ARTICLE\n",
            "Title: {title}\n",
            "Source: {source}\n",
            "Categories: {categories}\n",
            "Sentiment: {sentiment}\n",
            "Organizations: {organizations}\n",
            "People: {people}\n",
            "Locations: {locations}\n",
            "Description: {description}\n",
            "\n",
            "INSTRUCTIONS\n",
            "1. Focus on concrete consequences of this news (markets, companies, policy, society, technology, law).\n",
            "2. Name the specific entity each prediction is about (company, person, market, country, sector).\n",
            "3. Give brief reasoning (one or two sentences) for each prediction.\n",
            "4. Only include predictions you are highly confident about; fewer strong predictions beat many weak ones.\n",
            "5. Include a numeric confidence between 0 and 1 for each prediction.\n",
            "\n",
            "OUTPUT FORMAT\n",
            "Respond with a JSON array of objects. Each object must have exactly these fields:\n",
            "  \"type\": one of {types}\n",
            "  \"entity\": string, the entity the prediction concerns\n",
            "  \"prediction\": string, the predicted consequence\n",
            "  \"confidence\": number between 0 and 1\n",
            "  \"reasoning\": string, brief justification\n",
            "Return only the JSON array, with no text before or after it.\n",
            "If you have no confident predictions, return an empty array: []\n",
        ),
        title = title,
        source = source,
        categories = categories,
        sentiment = sentiment,
        organizations = organizations,
        people = people,
        locations = locations,
        description = description,
        types = types,
    );

    Prompt::from(text)
}
