use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// One registered citizen from the voter roll. Read-only reference data;
// parish/center fields can be missing in the source and are normalized to
// sentinels by the tally engine, never dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterRecord {
    pub voter_id: i64,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub parish: Option<String>,
    pub center_code: Option<String>,
    pub center_name: Option<String>,
}

// One recorded survey answer, joined against the roll. At most one per
// voter_id (enforced by the responses table primary key). `in_roll` is false
// when the voter_id no longer resolves to a roll entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub voter_id: i64,
    pub answer: String,
    pub chat_id: String,
    pub recorded_at: DateTime<Utc>,
    pub parish: Option<String>,
    pub center_code: Option<String>,
    pub center_name: Option<String>,
    pub in_roll: bool,
}

// One raw participation line for the /report export: a response joined with
// whatever roll attributes still resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub voter_id: i64,
    pub full_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub parish: Option<String>,
    pub center_code: Option<String>,
    pub center_name: Option<String>,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Yes,
    No,
    Unsure,
}

impl Answer {
    // Lenient parse: trims and lowercases. Anything outside the closed set is
    // None and counts toward the response total only.
    pub fn parse(raw: &str) -> Option<Answer> {
        match raw.trim().to_lowercase().as_str() {
            "yes" => Some(Answer::Yes),
            "no" => Some(Answer::No),
            "unsure" => Some(Answer::Unsure),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
            Answer::Unsure => "unsure",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Answer::Yes => "Yes",
            Answer::No => "No",
            Answer::Unsure => "Not sure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    Center,
    ParishSubtotal,
    GrandTotal,
}

impl RowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Center => "center",
            RowKind::ParishSubtotal => "parish_subtotal",
            RowKind::GrandTotal => "grand_total",
        }
    }

    pub fn from_str(s: &str) -> Option<RowKind> {
        match s {
            "center" => Some(RowKind::Center),
            "parish_subtotal" => Some(RowKind::ParishSubtotal),
            "grand_total" => Some(RowKind::GrandTotal),
            _ => None,
        }
    }
}

// One output row of the totalization. Subtotal and grand-total rows carry an
// empty center_code; their raw counts are sums of their child rows and their
// percentages are recomputed from those sums, never averaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub row_kind: RowKind,
    pub parish: String,
    pub center_code: String,
    pub center_name: String,
    pub registered_voters: i64,
    pub responded: i64,
    pub yes: i64,
    pub no: i64,
    pub unsure: i64,
    pub participation_pct: f64,
    pub yes_pct: f64,
    pub no_pct: f64,
    pub unsure_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_parse_is_case_and_whitespace_insensitive() {
        assert_eq!(Answer::parse("YES"), Some(Answer::Yes));
        assert_eq!(Answer::parse("  no "), Some(Answer::No));
        assert_eq!(Answer::parse("Unsure"), Some(Answer::Unsure));
    }

    #[test]
    fn answer_parse_rejects_unrecognized_values() {
        assert_eq!(Answer::parse("maybe"), None);
        assert_eq!(Answer::parse(""), None);
        assert_eq!(Answer::parse("yess"), None);
    }

    #[test]
    fn row_kind_round_trips_through_str() {
        for kind in [RowKind::Center, RowKind::ParishSubtotal, RowKind::GrandTotal] {
            assert_eq!(RowKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(RowKind::from_str("bogus"), None);
    }
}
