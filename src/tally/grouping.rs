use crate::models::{Answer, ResponseRecord, VoterRecord};
use std::collections::BTreeMap;

// Sentinels for roll rows with missing attributes. Rows are normalized, never
// dropped, so every registered voter stays in the population counts.
pub const UNKNOWN_PARISH: &str = "Unknown parish";
pub const UNKNOWN_CENTER_CODE: &str = "unknown";
pub const UNNAMED_CENTER: &str = "Unnamed center";

// Synthetic bucket for responses whose voter id no longer resolves to a roll
// entry. They keep counting toward response totals under a center with zero
// registered voters instead of being silently lost.
pub const UNMATCHED_PARISH: &str = "Unmatched";
pub const UNMATCHED_CENTER_CODE: &str = "unmatched";
pub const UNMATCHED_CENTER_NAME: &str = "Responses without roll entry";

// Composite (parish, center_code) key. A BTreeMap over this key sorts by
// parish first, so parish membership falls out of iteration order and no
// nested map has to be maintained by hand.
pub type CenterKey = (String, String);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CenterAccum {
    pub center_name: String,
    pub registered: i64,
    pub responded: i64,
    pub yes: i64,
    pub no: i64,
    pub unsure: i64,
}

fn normalize(value: Option<&str>, sentinel: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => sentinel.to_string(),
    }
}

// Builds the per-center population and response tallies in one pass over each
// source. The resulting key set is the union of roll keys and response keys:
// a center with voters but no responses keeps all-zero tallies, and a center
// seen only in responses keeps registered = 0.
pub fn accumulate(
    roll: &[VoterRecord],
    responses: &[ResponseRecord],
) -> BTreeMap<CenterKey, CenterAccum> {
    let mut grouped: BTreeMap<CenterKey, CenterAccum> = BTreeMap::new();

    for voter in roll {
        let key = (
            normalize(voter.parish.as_deref(), UNKNOWN_PARISH),
            normalize(voter.center_code.as_deref(), UNKNOWN_CENTER_CODE),
        );
        let entry = grouped.entry(key).or_default();
        if entry.center_name.is_empty() {
            entry.center_name = normalize(voter.center_name.as_deref(), UNNAMED_CENTER);
        }
        entry.registered += 1;
    }

    for response in responses {
        let (key, name) = if response.in_roll {
            (
                (
                    normalize(response.parish.as_deref(), UNKNOWN_PARISH),
                    normalize(response.center_code.as_deref(), UNKNOWN_CENTER_CODE),
                ),
                normalize(response.center_name.as_deref(), UNNAMED_CENTER),
            )
        } else {
            (
                (
                    UNMATCHED_PARISH.to_string(),
                    UNMATCHED_CENTER_CODE.to_string(),
                ),
                UNMATCHED_CENTER_NAME.to_string(),
            )
        };

        let entry = grouped.entry(key).or_default();
        if entry.center_name.is_empty() {
            entry.center_name = name;
        }

        // Every response counts toward the total; only recognized answers land
        // in a bucket. Malformed answers therefore lower participation-adjusted
        // yes/no/unsure percentages without disappearing from the count.
        entry.responded += 1;
        match Answer::parse(&response.answer) {
            Some(Answer::Yes) => entry.yes += 1,
            Some(Answer::No) => entry.no += 1,
            Some(Answer::Unsure) => entry.unsure += 1,
            None => {}
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn voter(id: i64, parish: Option<&str>, code: Option<&str>, name: Option<&str>) -> VoterRecord {
        VoterRecord {
            voter_id: id,
            full_name: format!("Voter {id}"),
            birth_date: None,
            parish: parish.map(String::from),
            center_code: code.map(String::from),
            center_name: name.map(String::from),
        }
    }

    fn response(id: i64, answer: &str, parish: Option<&str>, code: Option<&str>, in_roll: bool) -> ResponseRecord {
        ResponseRecord {
            voter_id: id,
            answer: answer.to_string(),
            chat_id: "chat-1".to_string(),
            recorded_at: Utc::now(),
            parish: parish.map(String::from),
            center_code: code.map(String::from),
            center_name: Some(format!("Center {}", code.unwrap_or("?"))),
            in_roll,
        }
    }

    #[test]
    fn missing_roll_attributes_are_normalized_to_sentinels() {
        let roll = vec![voter(1, None, None, None), voter(2, Some("  "), Some(""), None)];
        let grouped = accumulate(&roll, &[]);

        let key = (UNKNOWN_PARISH.to_string(), UNKNOWN_CENTER_CODE.to_string());
        assert_eq!(grouped.len(), 1);
        let accum = &grouped[&key];
        assert_eq!(accum.registered, 2);
        assert_eq!(accum.center_name, UNNAMED_CENTER);
    }

    #[test]
    fn key_set_is_union_of_roll_and_response_keys() {
        let roll = vec![voter(1, Some("North"), Some("C1"), Some("School"))];
        let responses = vec![response(9, "yes", Some("South"), Some("C9"), true)];
        let grouped = accumulate(&roll, &responses);

        assert_eq!(grouped.len(), 2);
        let silent = &grouped[&("North".to_string(), "C1".to_string())];
        assert_eq!(silent.registered, 1);
        assert_eq!(silent.responded, 0);
        let roll_less = &grouped[&("South".to_string(), "C9".to_string())];
        assert_eq!(roll_less.registered, 0);
        assert_eq!(roll_less.responded, 1);
    }

    #[test]
    fn malformed_answers_count_toward_total_only() {
        let roll = vec![voter(1, Some("North"), Some("C1"), Some("School"))];
        let responses = vec![
            response(1, "talvez", Some("North"), Some("C1"), true),
            response(2, "YES", Some("North"), Some("C1"), true),
        ];
        let grouped = accumulate(&roll, &responses);

        let accum = &grouped[&("North".to_string(), "C1".to_string())];
        assert_eq!(accum.responded, 2);
        assert_eq!(accum.yes, 1);
        assert_eq!(accum.no, 0);
        assert_eq!(accum.unsure, 0);
    }

    #[test]
    fn responses_without_roll_entry_land_in_the_unmatched_bucket() {
        let responses = vec![response(404, "no", None, None, false)];
        let grouped = accumulate(&[], &responses);

        let key = (UNMATCHED_PARISH.to_string(), UNMATCHED_CENTER_CODE.to_string());
        let accum = &grouped[&key];
        assert_eq!(accum.registered, 0);
        assert_eq!(accum.responded, 1);
        assert_eq!(accum.no, 1);
        assert_eq!(accum.center_name, UNMATCHED_CENTER_NAME);
    }

    #[test]
    fn center_name_comes_from_the_first_row_that_carries_one() {
        let roll = vec![
            voter(1, Some("North"), Some("C1"), Some("Old School")),
            voter(2, Some("North"), Some("C1"), Some("Renamed School")),
        ];
        let grouped = accumulate(&roll, &[]);
        assert_eq!(grouped[&("North".to_string(), "C1".to_string())].center_name, "Old School");
    }
}
