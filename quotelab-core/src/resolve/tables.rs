//! Static lookup tables used during resolution.

/// Company-name aliases (lowercase) mapped to their listing.
///
/// Matched as case-insensitive substrings of the query, in table order.
pub const ALIASES: &[(&str, &str)] = &[
    ("삼성전자", "005930.KS"),
    ("카카오", "035720.KS"),
    ("네이버", "035420.KS"),
    ("엔씨소프트", "036570.KS"),
    ("엔씨", "036570.KS"),
    ("현대차", "005380.KS"),
    ("기아", "000270.KS"),
    ("lg에너지솔루션", "373220.KS"),
    ("lg화학", "051910.KS"),
    ("sk하이닉스", "000660.KS"),
    ("posco", "005490.KS"),
    ("포스코", "005490.KS"),
];

/// Search-provider exchange codes mapped to market suffixes.
pub const EXCHANGE_SUFFIXES: &[(&str, &str)] = &[
    ("NMS", "US"),
    ("NYQ", "US"),
    ("NCM", "US"),
    ("NGM", "US"),
    ("NIM", "US"),
    ("ASE", "US"),
    ("BATS", "US"),
    ("PCX", "US"),
    ("NGQ", "US"),
    ("KSC", "KS"),
    ("KSE", "KS"),
    ("KOE", "KS"),
    ("KOS", "KQ"),
    ("KOSDAQ", "KQ"),
];

/// First alias whose key occurs in `query` (case-insensitive).
pub fn alias_for(query: &str) -> Option<&'static str> {
    let lower = query.to_lowercase();
    ALIASES
        .iter()
        .find(|(name, _)| lower.contains(name))
        .map(|&(_, target)| target)
}

pub fn suffix_for_exchange(exchange: &str) -> Option<&'static str> {
    let code = exchange.trim().to_uppercase();
    EXCHANGE_SUFFIXES
        .iter()
        .find(|(ex, _)| *ex == code)
        .map(|&(_, suffix)| suffix)
}
