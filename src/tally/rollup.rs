use super::grouping::{CenterAccum, CenterKey};
use crate::models::{RowKind, SummaryRow};
use std::collections::BTreeMap;

pub const GRAND_TOTAL_LABEL: &str = "TOTAL GENERAL";

// Half-up rounding to two decimals (0.005 rounds away from zero).
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// Zero-denominator policy: 0.00, never NaN.
fn pct(numerator: i64, denominator: i64) -> f64 {
    if denominator > 0 {
        round2(numerator as f64 / denominator as f64 * 100.0)
    } else {
        0.0
    }
}

fn add_into(dst: &mut CenterAccum, src: &CenterAccum) {
    dst.registered += src.registered;
    dst.responded += src.responded;
    dst.yes += src.yes;
    dst.no += src.no;
    dst.unsure += src.unsure;
}

// Assembles one SummaryRow from raw counts. Participation is measured against
// the registered population; answer percentages against the response total,
// so unrecognized answers dilute yes/no/unsure but not participation.
fn make_row(
    kind: RowKind,
    parish: &str,
    center_code: &str,
    center_name: &str,
    counts: &CenterAccum,
) -> SummaryRow {
    SummaryRow {
        row_kind: kind,
        parish: parish.to_string(),
        center_code: center_code.to_string(),
        center_name: center_name.to_string(),
        registered_voters: counts.registered,
        responded: counts.responded,
        yes: counts.yes,
        no: counts.no,
        unsure: counts.unsure,
        participation_pct: pct(counts.responded, counts.registered),
        yes_pct: pct(counts.yes, counts.responded),
        no_pct: pct(counts.no, counts.responded),
        unsure_pct: pct(counts.unsure, counts.responded),
    }
}

fn subtotal_row(parish: &str, counts: &CenterAccum) -> SummaryRow {
    make_row(
        RowKind::ParishSubtotal,
        parish,
        "",
        &format!("TOTAL {parish}"),
        counts,
    )
}

// Emits center rows in key order, a subtotal after each parish's centers and
// the grand total last. Subtotal and grand-total percentages are recomputed
// from the summed raw counts, never averaged from child percentages. The
// grand-total row is always present, even over an empty key set.
pub fn build_rows(grouped: &BTreeMap<CenterKey, CenterAccum>) -> Vec<SummaryRow> {
    let mut rows = Vec::with_capacity(grouped.len() + 2);
    let mut grand = CenterAccum::default();
    let mut current_parish: Option<String> = None;
    let mut parish_sub = CenterAccum::default();

    for ((parish, center_code), accum) in grouped {
        if current_parish.as_deref() != Some(parish.as_str()) {
            if let Some(previous) = current_parish.take() {
                rows.push(subtotal_row(&previous, &parish_sub));
            }
            current_parish = Some(parish.clone());
            parish_sub = CenterAccum::default();
        }

        rows.push(make_row(
            RowKind::Center,
            parish,
            center_code,
            &accum.center_name,
            accum,
        ));
        add_into(&mut parish_sub, accum);
        add_into(&mut grand, accum);
    }

    if let Some(previous) = current_parish.take() {
        rows.push(subtotal_row(&previous, &parish_sub));
    }

    rows.push(make_row(RowKind::GrandTotal, "", "", GRAND_TOTAL_LABEL, &grand));
    rows
}
