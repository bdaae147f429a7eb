//! Domain operations: one module per entity, each function a short read or
//! write against the store. Multi-row workflow steps run in one transaction.

pub mod dashboard;
pub mod deliveries;
pub mod dispatch;
pub mod finished_batches;
pub mod production;
pub mod quality_checks;
pub mod raw_batches;
pub mod seed;
pub mod suppliers;
pub mod users;
pub mod warehouse;
pub mod weighbridge;

use chrono::{DateTime, Datelike, Utc};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Deserializer, de};

/// Business number such as `PO-2025-7KQ2ZD`, used when the caller does not supply one.
pub fn generate_number(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{}-{}-{}", prefix, now.year(), suffix)
}

/// Caller value when present and non-blank, generated otherwise.
pub(crate) fn number_or_generate(supplied: Option<String>, prefix: &str) -> String {
    supplied
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| generate_number(prefix, Utc::now()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_f64<E: de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| E::custom(format!("'{}' is not a number", s))),
        }
    }
}

/// Accepts `2500` as well as `"2500"`; weights and quantities often arrive as form strings.
pub(crate) fn f64_from_number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrText::deserialize(deserializer)?.into_f64()
}

pub(crate) fn opt_f64_from_number_or_string<'de, D>(
    deserializer: D,
) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(NumberOrText::into_f64)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Deserialize)]
    struct Weights {
        #[serde(deserialize_with = "f64_from_number_or_string")]
        gross: f64,
        #[serde(default, deserialize_with = "opt_f64_from_number_or_string")]
        charges: Option<f64>,
    }

    #[test]
    fn numbers_and_numeric_strings_are_accepted() {
        let w: Weights = serde_json::from_str(r#"{"gross": "27500", "charges": 150.5}"#).unwrap();
        assert_eq!(w.gross, 27500.0);
        assert_eq!(w.charges, Some(150.5));

        let w: Weights = serde_json::from_str(r#"{"gross": 27500}"#).unwrap();
        assert_eq!(w.charges, None);
    }

    #[test]
    fn non_numeric_text_is_rejected() {
        let err = serde_json::from_str::<Weights>(r#"{"gross": "heavy"}"#)
            .err()
            .unwrap();
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn generated_numbers_carry_prefix_and_year() {
        let now = Utc.with_ymd_and_hms(2025, 1, 7, 8, 30, 0).unwrap();
        let number = generate_number("PO", now);
        assert!(number.starts_with("PO-2025-"));
        assert_eq!(number.len(), "PO-2025-".len() + 6);
        assert!(number[8..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn supplied_numbers_win_over_generation() {
        assert_eq!(number_or_generate(Some(" DO-1 ".into()), "DO"), "DO-1");
        assert!(number_or_generate(Some("  ".into()), "DO").starts_with("DO-"));
        assert!(number_or_generate(None, "DO").starts_with("DO-"));
    }
}
