use crate::models::{ReportRow, RowKind, SummaryRow};
use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook, XlsxError};

const SUMMARY_HEADERS: [&str; 12] = [
    "Parish",
    "Center code",
    "Voting center",
    "Registered",
    "Responded",
    "Yes",
    "No",
    "Not sure",
    "% Participation",
    "% Yes",
    "% No",
    "% Not sure",
];

const REPORT_HEADERS: [&str; 7] = [
    "ID",
    "Full name",
    "Age",
    "Parish",
    "Center code",
    "Voting center",
    "Answer",
];

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0xFFFFFF))
        .set_background_color(Color::RGB(0x2F75B5))
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin)
}

// The totalized summary as a spreadsheet, one worksheet, rows in the order
// the engine emitted them. Subtotal and grand-total rows are bolded.
pub fn summary_workbook(rows: &[SummaryRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Summary")?;

    let header = header_format();
    for (col, title) in SUMMARY_HEADERS.iter().enumerate() {
        worksheet.write_with_format(0, col as u16, *title, &header)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    let plain = Format::new();
    let bold = Format::new().set_bold();
    let pct_plain = Format::new().set_num_format("0.00");
    let pct_bold = Format::new().set_bold().set_num_format("0.00");

    for (index, row) in rows.iter().enumerate() {
        let r = (index + 1) as u32;
        let highlight = row.row_kind != RowKind::Center;
        let text_fmt = if highlight { &bold } else { &plain };
        let pct_fmt = if highlight { &pct_bold } else { &pct_plain };

        worksheet.write_with_format(r, 0, row.parish.as_str(), text_fmt)?;
        worksheet.write_with_format(r, 1, row.center_code.as_str(), text_fmt)?;
        worksheet.write_with_format(r, 2, row.center_name.as_str(), text_fmt)?;
        worksheet.write_with_format(r, 3, row.registered_voters, text_fmt)?;
        worksheet.write_with_format(r, 4, row.responded, text_fmt)?;
        worksheet.write_with_format(r, 5, row.yes, text_fmt)?;
        worksheet.write_with_format(r, 6, row.no, text_fmt)?;
        worksheet.write_with_format(r, 7, row.unsure, text_fmt)?;
        worksheet.write_with_format(r, 8, row.participation_pct, pct_fmt)?;
        worksheet.write_with_format(r, 9, row.yes_pct, pct_fmt)?;
        worksheet.write_with_format(r, 10, row.no_pct, pct_fmt)?;
        worksheet.write_with_format(r, 11, row.unsure_pct, pct_fmt)?;
    }

    worksheet.set_column_width(0, 20)?;
    worksheet.set_column_width(2, 35)?;

    workbook.save_to_buffer()
}

// Raw participation export for /report: one row per response. `ages` is
// precomputed by the caller and parallel to `rows`.
pub fn participation_workbook(
    rows: &[ReportRow],
    ages: &[Option<i32>],
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Participation")?;

    let header = header_format();
    for (col, title) in REPORT_HEADERS.iter().enumerate() {
        worksheet.write_with_format(0, col as u16, *title, &header)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (index, row) in rows.iter().enumerate() {
        let r = (index + 1) as u32;
        worksheet.write(r, 0, row.voter_id)?;
        worksheet.write(r, 1, row.full_name.as_deref().unwrap_or("Not available"))?;
        match ages.get(index).copied().flatten() {
            Some(age) => worksheet.write(r, 2, age)?,
            None => worksheet.write(r, 2, "N/A")?,
        };
        worksheet.write(r, 3, row.parish.as_deref().unwrap_or("N/A"))?;
        worksheet.write(r, 4, row.center_code.as_deref().unwrap_or("N/A"))?;
        worksheet.write(r, 5, row.center_name.as_deref().unwrap_or("N/A"))?;
        worksheet.write(r, 6, row.answer.as_str())?;
    }

    worksheet.set_column_width(1, 30)?;
    worksheet.set_column_width(5, 35)?;

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RowKind;

    fn sample_row(kind: RowKind) -> SummaryRow {
        SummaryRow {
            row_kind: kind,
            parish: "North".to_string(),
            center_code: "C1".to_string(),
            center_name: "School A".to_string(),
            registered_voters: 100,
            responded: 40,
            yes: 30,
            no: 5,
            unsure: 5,
            participation_pct: 40.0,
            yes_pct: 75.0,
            no_pct: 12.5,
            unsure_pct: 12.5,
        }
    }

    #[test]
    fn summary_workbook_produces_a_nonempty_xlsx_buffer() {
        let rows = vec![sample_row(RowKind::Center), sample_row(RowKind::GrandTotal)];
        let buffer = summary_workbook(&rows).unwrap();
        // XLSX is a zip container; PK is the zip magic.
        assert!(buffer.len() > 4);
        assert_eq!(&buffer[..2], b"PK");
    }

    #[test]
    fn participation_workbook_handles_missing_roll_attributes() {
        let rows = vec![ReportRow {
            voter_id: 404,
            full_name: None,
            birth_date: None,
            parish: None,
            center_code: None,
            center_name: None,
            answer: "yes".to_string(),
        }];
        let buffer = participation_workbook(&rows, &[None]).unwrap();
        assert_eq!(&buffer[..2], b"PK");
    }
}
