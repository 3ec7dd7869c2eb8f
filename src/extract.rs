// src/extract.rs
//! Tolerant extraction of insight records from free-form model output.
//!
//! Order:
//! 1) Scan for balanced `[ ... ]` regions (string- and escape-aware) and take the
//!    first one that parses as a JSON array.
//! 2) No region parsed -> parse the whole reply as JSON.
//! 3) Nothing parsed, or the value is not an array -> `Unparseable`.
//! 4) Validate each element; invalid elements are dropped, never fatal.

use serde_json::Value;

use crate::error::ExtractionError;
use crate::insight::{Insight, InsightType};

/// Extraction outcome with drop count for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub insights: Vec<Insight>,
    pub dropped: usize,
}

/// Parse `raw` into validated insights.
pub fn extract_insights(raw: &str) -> Result<Vec<Insight>, ExtractionError> {
    extract_with_stats(raw).map(|e| e.insights)
}

pub fn extract_with_stats(raw: &str) -> Result<Extracted, ExtractionError> {
    let text = raw.trim().trim_start_matches('\u{feff}');
    let items = parse_array(text)?;

    let total = items.len();
    let insights: Vec<Insight> = items.iter().filter_map(validate_candidate).collect();
    let dropped = total - insights.len();
    if dropped > 0 {
        tracing::debug!(total, dropped, "dropped invalid insight candidates");
    }
    Ok(Extracted { insights, dropped })
}

fn parse_array(text: &str) -> Result<Vec<Value>, ExtractionError> {
    let mut regions = 0usize;
    for region in bracket_regions(text) {
        regions += 1;
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(region) {
            return Ok(items);
        }
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(ExtractionError::Unparseable(format!(
            "expected a JSON array, got {}",
            value_kind(&other)
        ))),
        Err(e) if regions > 0 => Err(ExtractionError::Unparseable(format!(
            "{regions} bracketed region(s) found but none parsed as an array; whole text: {e}"
        ))),
        Err(e) => Err(ExtractionError::Unparseable(format!(
            "no JSON array found: {e}"
        ))),
    }
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Every balanced `[ ... ]` slice, ordered by its opening bracket.
///
/// One pass with a stack of open offsets. String literals are tracked only inside
/// an open bracket, so quotes in surrounding prose never hide a later array.
fn bracket_regions(text: &str) -> impl Iterator<Item = &str> + '_ {
    let mut open: Vec<usize> = Vec::new();
    let mut closed: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if !open.is_empty() => in_string = true,
            '[' => open.push(i),
            ']' => {
                if let Some(start) = open.pop() {
                    closed.push((start, i + c.len_utf8()));
                }
            }
            _ => {}
        }
    }

    closed.sort_unstable_by_key(|&(start, _)| start);
    closed.into_iter().map(move |(start, end)| &text[start..end])
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    let s = v?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Number, or numeric string (e.g. "0.5"); must be finite and within [0, 1].
fn coerce_confidence(v: Option<&Value>) -> Option<f32> {
    let n = match v? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && (0.0..=1.0).contains(&n)).then_some(n as f32)
}

/// Schema check for one candidate; `None` means drop.
pub fn validate_candidate(v: &Value) -> Option<Insight> {
    let obj = v.as_object()?;
    let kind = InsightType::parse(obj.get("type")?.as_str()?)?;
    let entity = non_empty_str(obj.get("entity"))?;
    let prediction = non_empty_str(obj.get("prediction"))?;
    let confidence = coerce_confidence(obj.get("confidence"))?;
    let reasoning = obj
        .get("reasoning")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    Some(Insight {
        kind,
        entity,
        prediction,
        confidence,
        reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ignores_surrounding_prose() {
        let raw = "Here you go:\n[{\"type\":\"other\",\"entity\":\"X\",\"prediction\":\"Y\",\"confidence\":0.8,\"reasoning\":\"Z\"}]\nThanks!";
        let out = extract_insights(raw).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, InsightType::Other);
        assert_eq!(out[0].entity, "X");
        assert_eq!(out[0].prediction, "Y");
        assert_eq!(out[0].reasoning, "Z");
        assert!((out[0].confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn invalid_enum_is_dropped_not_fatal() {
        let raw = r#"[{"type":"invalid_enum_value","entity":"X","prediction":"Y","confidence":0.8,"reasoning":"Z"}]"#;
        let out = extract_with_stats(raw).unwrap();
        assert!(out.insights.is_empty());
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn confidence_bounds_and_numeric_strings() {
        let raw = r#"[
            {"type":"market_trend","entity":"A","prediction":"up","confidence":1.4,"reasoning":"r"},
            {"type":"market_trend","entity":"B","prediction":"up","confidence":"0.5","reasoning":"r"},
            {"type":"market_trend","entity":"C","prediction":"up","confidence":-0.1,"reasoning":"r"},
            {"type":"market_trend","entity":"D","prediction":"up","confidence":"high","reasoning":"r"},
            {"type":"market_trend","entity":"E","prediction":"up","reasoning":"r"}
        ]"#;
        let out = extract_insights(raw).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].entity, "B");
        assert_eq!(out[0].confidence, 0.5);
    }

    #[test]
    fn boundary_confidences_are_accepted() {
        let raw = r#"[
            {"type":"other","entity":"A","prediction":"p","confidence":0,"reasoning":""},
            {"type":"other","entity":"B","prediction":"p","confidence":1,"reasoning":""}
        ]"#;
        assert_eq!(extract_insights(raw).unwrap().len(), 2);
    }

    #[test]
    fn missing_entity_or_prediction_is_dropped() {
        let raw = r#"[
            {"type":"other","prediction":"p","confidence":0.9},
            {"type":"other","entity":"  ","prediction":"p","confidence":0.9},
            {"type":"other","entity":"A","confidence":0.9},
            {"type":"other","entity":"A","prediction":"p","confidence":0.9},
            "not an object",
            42
        ]"#;
        let out = extract_with_stats(raw).unwrap();
        assert_eq!(out.insights.len(), 1);
        assert_eq!(out.insights[0].reasoning, "");
        assert_eq!(out.dropped, 5);
    }

    #[test]
    fn empty_array_is_success() {
        assert!(extract_insights("[]").unwrap().is_empty());
        assert!(extract_insights("No predictions: []").unwrap().is_empty());
    }

    #[test]
    fn brackets_inside_strings_do_not_confuse_scanner() {
        let raw = r#"Result: [{"type":"other","entity":"X [ltd]","prediction":"see ] here","confidence":0.7,"reasoning":"quote \" ["}] done"#;
        let out = extract_insights(raw).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].entity, "X [ltd]");
    }

    #[test]
    fn nested_array_inside_bracketed_note_is_found() {
        let raw = r#"[Note: answer is [{"type":"other","entity":"A","prediction":"p","confidence":0.5}]]"#;
        assert_eq!(extract_insights(raw).unwrap().len(), 1);
    }

    #[test]
    fn long_unclosed_prefix_does_not_hide_the_array() {
        let raw = format!(
            "{}\n[{{\"type\":\"other\",\"entity\":\"A\",\"prediction\":\"p\",\"confidence\":0.5}}]",
            "[".repeat(20_000)
        );
        let out = extract_insights(&raw).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].entity, "A");
    }

    #[test]
    fn stray_quote_in_prose_is_ignored() {
        let raw = r#"The model said "here you go: [{"type":"other","entity":"A","prediction":"p","confidence":0.5}]"#;
        assert_eq!(extract_insights(raw).unwrap().len(), 1);
    }

    #[test]
    fn skips_non_json_bracket_regions() {
        let raw = r#"[Note] Analysis follows.
```json
[{"type":"social_impact","entity":"Town","prediction":"Protests","confidence":0.6,"reasoning":"r"}]
```"#;
        let out = extract_insights(raw).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, InsightType::SocialImpact);
    }

    #[test]
    fn non_array_json_is_unparseable() {
        let err = extract_insights(r#"{"insight": "none"}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::Unparseable(_)));
    }

    #[test]
    fn garbage_is_unparseable() {
        assert!(extract_insights("I cannot help with that.").is_err());
        assert!(extract_insights("[{\"type\": \"other\", ").is_err());
        assert!(extract_insights("").is_err());
    }

    #[test]
    fn validate_candidate_normalizes_fields() {
        let v = json!({
            "type": " Stock_Prediction ",
            "entity": " NVDA ",
            "prediction": " Shares rise ",
            "confidence": "0.90",
            "reasoning": " strong demand "
        });
        let i = validate_candidate(&v).unwrap();
        assert_eq!(i.kind, InsightType::StockPrediction);
        assert_eq!(i.entity, "NVDA");
        assert_eq!(i.prediction, "Shares rise");
        assert_eq!(i.reasoning, "strong demand");
        assert!((i.confidence - 0.9).abs() < 1e-6);
    }
}
