//! Prompt Builder: renders a price window into model instructions.

use super::window::PriceWindow;

const INSTRUCTIONS: &[&str] = &[
    "You are a trading assistant. Analyze the daily OHLCV history of one symbol and return ONLY one valid JSON object (no markdown, no extra text).",
    "Compute SMA20 and SMA60 as the mean of the 20 and 60 most recent close prices in the data; if there are fewer rows than the period, return null for that SMA.",
    "Return exactly these fields: symbol, as_of, signal (BUY|SELL|HOLD), confidence (0..1), sma20, sma60, trend (up|down|sideways), summary (1-2 sentences).",
];

/// Deterministic prompt for `window`. Rows are listed newest first.
pub fn build_prompt(window: &PriceWindow) -> String {
    let mut lines: Vec<String> = INSTRUCTIONS.iter().map(|s| s.to_string()).collect();
    lines.push(String::new());
    lines.push(format!("symbol: {}", window.symbol));
    lines.push(format!("as_of: {}", window.as_of_text()));
    lines.push(String::new());
    lines.push("data_csv_header: date,open,high,low,close,volume".to_string());
    lines.push("data_csv (newest first):".to_string());
    lines.extend(window.rows.iter().map(|r| r.csv_line()));
    lines.join("\n")
}
