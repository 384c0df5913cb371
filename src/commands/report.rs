use crate::db::Database;
use crate::export;
use crate::handlers::{survey, HandlerResult};
use crate::telegram::TelegramClient;
use chrono::Utc;
use log::{error, info};

// /report: raw participation spreadsheet, one row per recorded response.
pub async fn send_participation_report(
    db: &Database,
    tg: &TelegramClient,
    chat_id: i64,
) -> HandlerResult {
    info!("Running /report for chat {chat_id}");

    let rows = match db.fetch_report_rows().await {
        Ok(rows) => rows,
        Err(why) => {
            error!("Failed to read participation rows: {why}");
            tg.send_message(
                chat_id,
                "\u{26a0}\u{fe0f} Could not read the participation log. Please try again later.",
                false,
                None,
            )
            .await?;
            return Ok(());
        }
    };

    let today = Utc::now().date_naive();
    let ages: Vec<Option<i32>> = rows
        .iter()
        .map(|row| row.birth_date.map(|born| survey::age_on(born, today)))
        .collect();

    let workbook = export::xlsx::participation_workbook(&rows, &ages)?;
    tg.send_document(chat_id, workbook, "participation_report.xlsx").await?;
    Ok(())
}
