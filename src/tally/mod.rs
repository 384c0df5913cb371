pub mod grouping;
pub mod rollup;

use crate::db::Database;
use crate::errors::TallyError;
use crate::models::{ResponseRecord, SummaryRow, VoterRecord};
use log::{info, warn};
use std::env;

// How computed rows are reconciled with the summary_rows table. Either way
// the net stored state after a run is the same; replace is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    Replace,
    Upsert,
}

impl WriteStrategy {
    pub fn from_env() -> WriteStrategy {
        match env::var("SUMMARY_WRITE_STRATEGY").as_deref() {
            Ok("upsert") => WriteStrategy::Upsert,
            _ => WriteStrategy::Replace,
        }
    }
}

// Pure totalization: groups both sources by (parish, center_code), reconciles
// them and rolls the result up into center rows, parish subtotals and one
// grand total. No I/O, so runs over unchanged inputs are identical.
pub fn summarize(roll: &[VoterRecord], responses: &[ResponseRecord]) -> Vec<SummaryRow> {
    let grouped = grouping::accumulate(roll, responses);
    rollup::build_rows(&grouped)
}

// One full aggregation run: read both sources, compute in memory, write once.
// Both fetches complete before any grouping starts, and the store is only
// touched after the full row set exists, so a read failure leaves prior rows
// intact.
pub async fn run_totalization(
    db: &Database,
    strategy: WriteStrategy,
) -> Result<usize, TallyError> {
    info!("Running totalization ({strategy:?} write strategy)");

    let (roll, responses) = tokio::try_join!(db.fetch_voter_roll(), db.fetch_responses())
        .map_err(TallyError::SourceRead)?;

    if responses.is_empty() {
        // Not an error: an empty response log still produces a zero-tally
        // summary over the known roll.
        warn!(
            "No responses recorded yet; emitting zero tallies over {} roll entries",
            roll.len()
        );
    }

    let rows = summarize(&roll, &responses);

    match strategy {
        WriteStrategy::Replace => db.replace_summary(&rows).await,
        WriteStrategy::Upsert => db.upsert_summary(&rows).await,
    }
    .map_err(TallyError::Write)?;

    info!("Totalization stored {} summary row(s)", rows.len());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RowKind;
    use chrono::Utc;

    fn voter(id: i64, parish: &str, code: &str, name: &str) -> VoterRecord {
        VoterRecord {
            voter_id: id,
            full_name: format!("Voter {id}"),
            birth_date: None,
            parish: Some(parish.to_string()),
            center_code: Some(code.to_string()),
            center_name: Some(name.to_string()),
        }
    }

    fn response(id: i64, answer: &str, parish: &str, code: &str) -> ResponseRecord {
        ResponseRecord {
            voter_id: id,
            answer: answer.to_string(),
            chat_id: "chat-1".to_string(),
            recorded_at: Utc::now(),
            parish: Some(parish.to_string()),
            center_code: Some(code.to_string()),
            center_name: None,
            in_roll: true,
        }
    }

    fn north_fixture() -> (Vec<VoterRecord>, Vec<ResponseRecord>) {
        let mut roll = Vec::new();
        for id in 0..100 {
            roll.push(voter(id, "North", "C1", "School A"));
        }
        for id in 100..150 {
            roll.push(voter(id, "North", "C2", "School B"));
        }

        let mut responses = Vec::new();
        for id in 100..115 {
            responses.push(response(id, "yes", "North", "C2"));
        }
        for id in 115..118 {
            responses.push(response(id, "no", "North", "C2"));
        }
        for id in 118..120 {
            responses.push(response(id, "unsure", "North", "C2"));
        }
        (roll, responses)
    }

    fn find<'a>(rows: &'a [SummaryRow], kind: RowKind, code: &str) -> &'a SummaryRow {
        rows.iter()
            .find(|r| r.row_kind == kind && r.center_code == code)
            .expect("row not found")
    }

    #[test]
    fn center_with_voters_and_no_responses_gets_zero_tallies() {
        let (roll, responses) = north_fixture();
        let rows = summarize(&roll, &responses);

        let c1 = find(&rows, RowKind::Center, "C1");
        assert_eq!(c1.registered_voters, 100);
        assert_eq!(c1.responded, 0);
        assert_eq!(c1.participation_pct, 0.0);
        assert_eq!(c1.yes_pct, 0.0);
    }

    #[test]
    fn center_percentages_follow_raw_counts() {
        let (roll, responses) = north_fixture();
        let rows = summarize(&roll, &responses);

        let c2 = find(&rows, RowKind::Center, "C2");
        assert_eq!(c2.registered_voters, 50);
        assert_eq!(c2.responded, 20);
        assert_eq!(c2.participation_pct, 40.0);
        assert_eq!(c2.yes_pct, 75.0);
        assert_eq!(c2.no_pct, 15.0);
        assert_eq!(c2.unsure_pct, 10.0);

        let subtotal = rows
            .iter()
            .find(|r| r.row_kind == RowKind::ParishSubtotal && r.parish == "North")
            .unwrap();
        assert_eq!(subtotal.registered_voters, 150);
        assert_eq!(subtotal.responded, 20);
        assert_eq!(subtotal.participation_pct, 13.33);
    }

    #[test]
    fn unrecognized_answer_dilutes_answer_percentages() {
        let roll: Vec<VoterRecord> = (0..4).map(|id| voter(id, "North", "C1", "School A")).collect();
        let responses = vec![
            response(0, "yes", "North", "C1"),
            response(1, "yes", "North", "C1"),
            response(2, "no", "North", "C1"),
            response(3, "talvez", "North", "C1"),
        ];
        let rows = summarize(&roll, &responses);

        let c1 = find(&rows, RowKind::Center, "C1");
        assert_eq!(c1.responded, 4);
        assert_eq!(c1.yes + c1.no + c1.unsure, 3);
        assert!(c1.yes_pct + c1.no_pct + c1.unsure_pct < 100.0);
        assert_eq!(c1.participation_pct, 100.0);
    }

    #[test]
    fn zero_responses_across_the_dataset_is_not_an_error() {
        let (roll, _) = north_fixture();
        let rows = summarize(&roll, &[]);

        let grand = rows.last().unwrap();
        assert_eq!(grand.row_kind, RowKind::GrandTotal);
        assert_eq!(grand.registered_voters, 150);
        assert_eq!(grand.responded, 0);
        assert_eq!(grand.participation_pct, 0.0);
        assert_eq!(grand.yes_pct, 0.0);
    }

    #[test]
    fn counts_roll_up_consistently_at_every_level() {
        let (mut roll, mut responses) = north_fixture();
        roll.push(voter(900, "South", "C9", "School C"));
        responses.push(response(900, "yes", "South", "C9"));
        let rows = summarize(&roll, &responses);

        let center_sum: i64 = rows
            .iter()
            .filter(|r| r.row_kind == RowKind::Center)
            .map(|r| r.registered_voters)
            .sum();
        let subtotal_sum: i64 = rows
            .iter()
            .filter(|r| r.row_kind == RowKind::ParishSubtotal)
            .map(|r| r.registered_voters)
            .sum();
        let grand = rows.last().unwrap();
        assert_eq!(center_sum, subtotal_sum);
        assert_eq!(subtotal_sum, grand.registered_voters);

        let responded_sum: i64 = rows
            .iter()
            .filter(|r| r.row_kind == RowKind::Center)
            .map(|r| r.responded)
            .sum();
        assert_eq!(responded_sum, grand.responded);
    }

    #[test]
    fn summarize_is_deterministic_over_unchanged_inputs() {
        let (roll, responses) = north_fixture();
        let first = summarize(&roll, &responses);
        let second = summarize(&roll, &responses);
        assert_eq!(first, second);
    }

    #[test]
    fn row_count_law_holds_with_unmatched_responses() {
        let (roll, mut responses) = north_fixture();
        responses.push(ResponseRecord {
            in_roll: false,
            ..response(999, "yes", "North", "C2")
        });
        let rows = summarize(&roll, &responses);

        // Keys: (North, C1), (North, C2), (Unmatched, unmatched).
        // Parishes: North, Unmatched. Plus the grand total.
        assert_eq!(rows.len(), 3 + 2 + 1);
        let grand = rows.last().unwrap();
        assert_eq!(grand.responded, 21);
    }
}
