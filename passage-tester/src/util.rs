use anyhow::{Context, Result};
use chrono::NaiveDate;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

pub fn parse_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    tokens
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed {token:?}"))
        })
        .collect()
}

/// `YYYY-MM-DD`, or the local date when absent.
pub fn resolve_date(raw: Option<&str>) -> Result<NaiveDate> {
    raw.map_or_else(
        || Ok(chrono::Local::now().date_naive()),
        |text| {
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .with_context(|| format!("invalid date {text:?}, expected YYYY-MM-DD"))
        },
    )
}
