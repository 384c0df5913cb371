use crate::db::Database;
use crate::export;
use crate::handlers::HandlerResult;
use crate::tally::{self, WriteStrategy};
use crate::telegram::TelegramClient;
use log::{error, info};

// /summary: run a full totalization, then send the stored rows as XLSX and
// PDF documents. A failure anywhere leaves the previous summary intact and
// the user gets told instead of silence.
pub async fn send_summary(db: &Database, tg: &TelegramClient, chat_id: i64) -> HandlerResult {
    info!("Running /summary for chat {chat_id}");

    if let Err(why) = totalize_and_send(db, tg, chat_id).await {
        error!("Failed to build or send summary: {why:?}");
        tg.send_message(
            chat_id,
            "\u{26a0}\u{fe0f} Something went wrong while generating the summary. Please try again later.",
            false,
            None,
        )
        .await?;
    }
    Ok(())
}

async fn totalize_and_send(db: &Database, tg: &TelegramClient, chat_id: i64) -> HandlerResult {
    tally::run_totalization(db, WriteStrategy::from_env()).await?;

    let rows = db.load_summary().await?;

    let workbook = export::xlsx::summary_workbook(&rows)?;
    tg.send_document(chat_id, workbook, "summary_totalized.xlsx").await?;

    let pdf = export::pdf::summary_pdf(&rows);
    tg.send_document(chat_id, pdf, "summary_totalized.pdf").await?;

    tg.send_message(
        chat_id,
        "\u{2705} Totalization complete; summary sheet and PDF sent.",
        false,
        None,
    )
    .await?;
    Ok(())
}
