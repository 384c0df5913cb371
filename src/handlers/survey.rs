use super::HandlerResult;
use crate::db::{Database, RegistrationStatus};
use crate::models::{Answer, VoterRecord};
use crate::telegram::{strip_markdown, TelegramClient};
use chrono::{Datelike, NaiveDate, Utc};
use log::info;
use serde_json::{json, Value};

const SURVEY_QUESTION: &str =
    "Would you like to be part of the team making this municipality stronger?";

// Look the citizen up in the roll and either show the question with answer
// buttons, thank them if they already responded, or report an unknown ID.
pub async fn process_voter_id(
    db: &Database,
    tg: &TelegramClient,
    chat_id: i64,
    prefix: &str,
    voter_id: i64,
) -> HandlerResult {
    let Some(voter) = db.find_voter(voter_id).await? else {
        tg.send_message(
            chat_id,
            &format!(
                "\u{1f615} No voter found with ID {prefix}{voter_id}. \
                 Please check that you are registered."
            ),
            false,
            None,
        )
        .await?;
        return Ok(());
    };

    if db.has_response(voter_id).await? {
        let text = format!(
            "{}\n\n\u{1f389} Thank you for having already taken part in the survey.",
            voter_card(prefix, &voter)
        );
        tg.send_message(chat_id, &text, true, None).await?;
        return Ok(());
    }

    let text = format!("{}\n\n{SURVEY_QUESTION}", voter_card(prefix, &voter));
    tg.send_message(chat_id, &text, true, Some(answer_keyboard(voter_id)))
        .await?;
    Ok(())
}

// Post-registration card, mirroring what the voter saw when asked.
pub async fn confirm_registration(
    db: &Database,
    tg: &TelegramClient,
    chat_id: i64,
    voter_id: i64,
    status: RegistrationStatus,
    answer: Answer,
) -> HandlerResult {
    let Some(voter) = db.find_voter(voter_id).await? else {
        // Answer was stored anyway; the totalization picks it up in the
        // unmatched bucket.
        tg.send_message(chat_id, "\u{2705} Your answer has been recorded.", false, None)
            .await?;
        return Ok(());
    };

    let tail = match status {
        RegistrationStatus::Registered => {
            info!("Registered answer '{}' for voter {voter_id}", answer.as_str());
            format!(
                "\u{2705} We recorded your answer: *{}*\n\n\u{1f389} Thank you for taking part!",
                answer.label()
            )
        }
        RegistrationStatus::Duplicate => {
            "\u{1f64c} We had already recorded your participation earlier.".to_string()
        }
    };

    let text = format!("{}\n\n{tail}", voter_card("V", &voter));
    tg.send_message(chat_id, &text, true, None).await?;
    Ok(())
}

fn voter_card(prefix: &str, voter: &VoterRecord) -> String {
    let age_line = voter
        .birth_date
        .map(|born| format!("*AGE:* {} years\n", age_on(born, Utc::now().date_naive())))
        .unwrap_or_default();
    format!(
        "*Parish Pulse* \u{1f5f3}\u{fe0f}\n*ID:* {}{}\n*NAME:* {}\n{}*VOTING CENTER:* {}",
        prefix,
        voter.voter_id,
        strip_markdown(&voter.full_name),
        age_line,
        strip_markdown(voter.center_name.as_deref().unwrap_or("Not available")),
    )
}

fn answer_keyboard(voter_id: i64) -> Value {
    json!({
        "inline_keyboard": [[
            { "text": "\u{2705} Yes", "callback_data": format!("yes:{voter_id}") },
            { "text": "\u{1f914} Not sure", "callback_data": format!("unsure:{voter_id}") },
            { "text": "\u{274c} No", "callback_data": format!("no:{voter_id}") }
        ]]
    })
}

// Full years between the birth date and the given day.
pub fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    age
}
