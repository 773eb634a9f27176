//! Response Parser: never fails; degrades to defaults on unusable output.

use crate::domain::{Signal, Symbol};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Characters of cleaned raw text kept as the summary when no JSON object
/// could be extracted.
pub const SUMMARY_FALLBACK_CHARS: usize = 500;

/// Structured view of one model completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisPayload {
    pub symbol: String,
    pub as_of: String,
    pub signal: Signal,
    /// 0..1; `0` when absent.
    pub confidence: f64,
    pub sma20: Option<f64>,
    pub sma60: Option<f64>,
    pub trend: Option<String>,
    pub summary: String,
    /// `false` when the completion held no JSON object and defaults were used.
    pub structured: bool,
}

/// Remove markdown code fences and surrounding whitespace.
pub fn clean_response(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

pub fn parse_response(raw: &str, fallback_symbol: &Symbol, fallback_as_of: &str) -> AnalysisPayload {
    let cleaned = clean_response(raw);

    let (fields, structured) = match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => (map, true),
        Ok(_) | Err(_) => {
            warn!(
                symbol = %fallback_symbol,
                len = cleaned.len(),
                "model output is not a JSON object, using defaults"
            );
            (Map::new(), false)
        }
    };

    let summary = match text_field(&fields, "summary") {
        Some(s) => s.to_string(),
        None if !structured => cleaned.chars().take(SUMMARY_FALLBACK_CHARS).collect(),
        None => String::new(),
    };

    AnalysisPayload {
        symbol: text_field(&fields, "symbol")
            .map(str::to_string)
            .unwrap_or_else(|| fallback_symbol.to_string()),
        as_of: text_field(&fields, "as_of")
            .map(str::to_string)
            .unwrap_or_else(|| fallback_as_of.to_string()),
        signal: signal_field(&fields),
        confidence: confidence_field(&fields),
        sma20: number_field(&fields, "sma20"),
        sma60: number_field(&fields, "sma60"),
        trend: trend_field(&fields),
        summary,
        structured,
    }
}

/// Non-blank string field.
fn text_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn signal_field(fields: &Map<String, Value>) -> Signal {
    match text_field(fields, "signal") {
        None => Signal::Hold,
        Some(s) => s.parse::<Signal>().unwrap_or_else(|err: String| {
            warn!(%err, "falling back to HOLD");
            Signal::Hold
        }),
    }
}

/// A number, or a string holding one.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Optional numeric field; `null` and absence both mean "not reported".
fn number_field(fields: &Map<String, Value>, name: &str) -> Option<f64> {
    let value = fields.get(name).filter(|v| !v.is_null())?;
    let number = numeric(value);
    if number.is_none() {
        debug!(field = name, %value, "dropping non-numeric value");
    }
    number
}

fn trend_field(fields: &Map<String, Value>) -> Option<String> {
    match fields.get("trend") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            debug!(value = %other, "dropping non-text trend");
            None
        }
    }
}

fn confidence_field(fields: &Map<String, Value>) -> f64 {
    match fields.get("confidence").and_then(numeric) {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym() -> Symbol {
        Symbol::parse("AAPL.US").unwrap()
    }

    #[test]
    fn fenced_json_is_parsed() {
        let raw = "```json\n{\"signal\":\"BUY\",\"confidence\":0.8}\n```";
        let p = parse_response(raw, &sym(), "2024-05-02");
        assert_eq!(p.signal, Signal::Buy);
        assert_eq!(p.confidence, 0.8);
        assert_eq!(p.symbol, "AAPL.US");
        assert_eq!(p.as_of, "2024-05-02");
        assert_eq!(p.summary, "");
        assert!(p.structured);
    }

    #[test]
    fn unparsable_text_degrades_to_hold() {
        let p = parse_response("not json", &sym(), "2024-05-02");
        assert_eq!(p.signal, Signal::Hold);
        assert_eq!(p.confidence, 0.0);
        assert_eq!(p.summary, "not json");
        assert!(!p.structured);
    }

    #[test]
    fn fallback_summary_is_truncated() {
        let raw = "x".repeat(SUMMARY_FALLBACK_CHARS + 200);
        let p = parse_response(&raw, &sym(), "");
        assert_eq!(p.summary.chars().count(), SUMMARY_FALLBACK_CHARS);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let raw = "가".repeat(SUMMARY_FALLBACK_CHARS + 1);
        let p = parse_response(&raw, &sym(), "");
        assert_eq!(p.summary.chars().count(), SUMMARY_FALLBACK_CHARS);
    }

    #[test]
    fn full_payload_passes_through() {
        let raw = r#"{"symbol":"AAPL.US","as_of":"2024-05-01","signal":"sell","confidence":0.35,
            "sma20":181.2,"sma60":null,"trend":"down","summary":"Below the 20-day average."}"#;
        let p = parse_response(raw, &sym(), "2024-05-02");
        assert_eq!(p.as_of, "2024-05-01");
        assert_eq!(p.signal, Signal::Sell);
        assert_eq!(p.sma20, Some(181.2));
        assert_eq!(p.sma60, None);
        assert_eq!(p.trend.as_deref(), Some("down"));
        assert_eq!(p.summary, "Below the 20-day average.");
    }

    #[test]
    fn indicator_strings_are_read_as_numbers() {
        let raw = r#"{"sma20":"181.2","sma60":" 175 ","trend":"up"}"#;
        let p = parse_response(raw, &sym(), "");
        assert_eq!(p.sma20, Some(181.2));
        assert_eq!(p.sma60, Some(175.0));
        assert_eq!(p.trend.as_deref(), Some("up"));
    }

    #[test]
    fn unusable_indicators_are_absent() {
        let raw = r#"{"sma20":"n/a","sma60":null,"trend":3}"#;
        let p = parse_response(raw, &sym(), "");
        assert_eq!(p.sma20, None);
        assert_eq!(p.sma60, None);
        assert_eq!(p.trend, None);
        assert!(p.structured);
    }

    #[test]
    fn unknown_signal_becomes_hold() {
        let p = parse_response(r#"{"signal":"STRONG BUY"}"#, &sym(), "");
        assert_eq!(p.signal, Signal::Hold);
        assert!(p.structured);
    }

    #[test]
    fn confidence_is_clamped_and_accepts_strings() {
        let p = parse_response(r#"{"confidence":1.7}"#, &sym(), "");
        assert_eq!(p.confidence, 1.0);
        let p = parse_response(r#"{"confidence":"0.25"}"#, &sym(), "");
        assert_eq!(p.confidence, 0.25);
        let p = parse_response(r#"{"confidence":"high"}"#, &sym(), "");
        assert_eq!(p.confidence, 0.0);
    }

    #[test]
    fn json_array_is_not_structured() {
        let p = parse_response("[1,2,3]", &sym(), "2024-01-01");
        assert!(!p.structured);
        assert_eq!(p.summary, "[1,2,3]");
        assert_eq!(p.as_of, "2024-01-01");
    }

    #[test]
    fn blank_fields_use_fallbacks() {
        let p = parse_response(r#"{"symbol":"  ","as_of":""}"#, &sym(), "2024-02-02");
        assert_eq!(p.symbol, "AAPL.US");
        assert_eq!(p.as_of, "2024-02-02");
    }
}
