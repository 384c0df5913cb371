use crate::models::{Answer, ReportRow, ResponseRecord, RowKind, SummaryRow, VoterRecord};
use chrono::Utc;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqlitePool, SqlitePoolOptions},
    Row, Sqlite,
};
use std::collections::HashSet;
use std::env;

pub struct Database {
    pool: SqlitePool,
}

// Outcome of a registration attempt. A duplicate is an expected state, not an
// error: the caller shows a different message but nothing is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Registered,
    Duplicate,
}

impl Database {
    pub async fn new() -> Result<Self, sqlx::Error> {
        let db_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:parish_pulse.db".to_string());
        Self::connect(&db_url).await
    }

    pub async fn connect(db_url: &str) -> Result<Self, sqlx::Error> {
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS voters (
                voter_id INTEGER PRIMARY KEY,
                full_name TEXT NOT NULL,
                birth_date TEXT,
                parish TEXT,
                center_code TEXT,
                center_name TEXT
            );
            "#,
        )
        .execute(pool)
        .await?;

        // voter_id as primary key is the at-most-one-response-per-voter
        // guarantee the aggregation engine relies on.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS responses (
                voter_id INTEGER PRIMARY KEY,
                answer TEXT NOT NULL,
                chat_id TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS summary_rows (
                parish TEXT NOT NULL,
                center_code TEXT NOT NULL,
                center_name TEXT NOT NULL,
                row_kind TEXT NOT NULL,
                registered_voters INTEGER NOT NULL,
                responded INTEGER NOT NULL,
                yes_count INTEGER NOT NULL,
                no_count INTEGER NOT NULL,
                unsure_count INTEGER NOT NULL,
                participation_pct REAL NOT NULL,
                yes_pct REAL NOT NULL,
                no_pct REAL NOT NULL,
                unsure_pct REAL NOT NULL,
                position INTEGER NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (parish, center_code)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    // Look up one citizen in the roll.
    pub async fn find_voter(&self, voter_id: i64) -> Result<Option<VoterRecord>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT voter_id, full_name, birth_date, parish, center_code, center_name
            FROM voters
            WHERE voter_id = ?
            "#,
        )
        .bind(voter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| VoterRecord {
            voter_id: row.get("voter_id"),
            full_name: row.get("full_name"),
            birth_date: row.get("birth_date"),
            parish: row.get("parish"),
            center_code: row.get("center_code"),
            center_name: row.get("center_name"),
        }))
    }

    pub async fn fetch_voter_roll(&self) -> Result<Vec<VoterRecord>, sqlx::Error> {
        let voters = sqlx::query(
            r#"
            SELECT voter_id, full_name, birth_date, parish, center_code, center_name
            FROM voters
            ORDER BY voter_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| VoterRecord {
            voter_id: row.get("voter_id"),
            full_name: row.get("full_name"),
            birth_date: row.get("birth_date"),
            parish: row.get("parish"),
            center_code: row.get("center_code"),
            center_name: row.get("center_name"),
        })
        .collect();

        Ok(voters)
    }

    // Response log joined against the roll, so the engine only ever sees
    // already-joined rows. The LEFT JOIN keeps responses whose voter id has no
    // roll entry; those come back with in_roll = false.
    pub async fn fetch_responses(&self) -> Result<Vec<ResponseRecord>, sqlx::Error> {
        let responses = sqlx::query(
            r#"
            SELECT r.voter_id, r.answer, r.chat_id, r.recorded_at,
                   v.parish, v.center_code, v.center_name,
                   v.voter_id IS NOT NULL AS in_roll
            FROM responses r
            LEFT JOIN voters v ON v.voter_id = r.voter_id
            ORDER BY r.voter_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| ResponseRecord {
            voter_id: row.get("voter_id"),
            answer: row.get("answer"),
            chat_id: row.get("chat_id"),
            recorded_at: row.get("recorded_at"),
            parish: row.get("parish"),
            center_code: row.get("center_code"),
            center_name: row.get("center_name"),
            in_roll: row.get("in_roll"),
        })
        .collect();

        Ok(responses)
    }

    pub async fn has_response(&self, voter_id: i64) -> Result<bool, sqlx::Error> {
        let existing = sqlx::query("SELECT 1 FROM responses WHERE voter_id = ?")
            .bind(voter_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(existing.is_some())
    }

    // Record one answer. ON CONFLICT DO NOTHING backs up the caller's dedup
    // check, so a race between two taps still stores at most one response.
    pub async fn register_response(
        &self,
        voter_id: i64,
        answer: Answer,
        chat_id: &str,
    ) -> Result<RegistrationStatus, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO responses (voter_id, answer, chat_id, recorded_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(voter_id) DO NOTHING
            "#,
        )
        .bind(voter_id)
        .bind(answer.as_str())
        .bind(chat_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(RegistrationStatus::Duplicate)
        } else {
            Ok(RegistrationStatus::Registered)
        }
    }

    // Raw participation rows for the /report export, one per response.
    pub async fn fetch_report_rows(&self) -> Result<Vec<ReportRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT r.voter_id, r.answer,
                   v.full_name, v.birth_date, v.parish, v.center_code, v.center_name
            FROM responses r
            LEFT JOIN voters v ON v.voter_id = r.voter_id
            ORDER BY v.center_name, r.voter_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| ReportRow {
            voter_id: row.get("voter_id"),
            full_name: row.get("full_name"),
            birth_date: row.get("birth_date"),
            parish: row.get("parish"),
            center_code: row.get("center_code"),
            center_name: row.get("center_name"),
            answer: row.get("answer"),
        })
        .collect();

        Ok(rows)
    }

    // Full-replace write strategy: delete everything, insert the fresh rows,
    // all inside one transaction so a mid-write failure rolls back to the
    // prior state.
    pub async fn replace_summary(&self, rows: &[SummaryRow]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM summary_rows").execute(&mut *tx).await?;

        let updated_at = Utc::now();
        for (position, row) in rows.iter().enumerate() {
            Self::insert_summary_row(&mut tx, row, position as i64, updated_at).await?;
        }

        tx.commit().await
    }

    // Keyed-upsert write strategy: update or insert each fresh row by
    // (parish, center_code), then delete rows whose key no longer appears in
    // the fresh computation, keeping the store exactly synchronized.
    pub async fn upsert_summary(&self, rows: &[SummaryRow]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated_at = Utc::now();
        for (position, row) in rows.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO summary_rows (
                    parish, center_code, center_name, row_kind,
                    registered_voters, responded, yes_count, no_count, unsure_count,
                    participation_pct, yes_pct, no_pct, unsure_pct,
                    position, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(parish, center_code) DO UPDATE SET
                    center_name = excluded.center_name,
                    row_kind = excluded.row_kind,
                    registered_voters = excluded.registered_voters,
                    responded = excluded.responded,
                    yes_count = excluded.yes_count,
                    no_count = excluded.no_count,
                    unsure_count = excluded.unsure_count,
                    participation_pct = excluded.participation_pct,
                    yes_pct = excluded.yes_pct,
                    no_pct = excluded.no_pct,
                    unsure_pct = excluded.unsure_pct,
                    position = excluded.position,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&row.parish)
            .bind(&row.center_code)
            .bind(&row.center_name)
            .bind(row.row_kind.as_str())
            .bind(row.registered_voters)
            .bind(row.responded)
            .bind(row.yes)
            .bind(row.no)
            .bind(row.unsure)
            .bind(row.participation_pct)
            .bind(row.yes_pct)
            .bind(row.no_pct)
            .bind(row.unsure_pct)
            .bind(position as i64)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;
        }

        let fresh_keys: HashSet<(String, String)> = rows
            .iter()
            .map(|row| (row.parish.clone(), row.center_code.clone()))
            .collect();

        let existing = sqlx::query("SELECT parish, center_code FROM summary_rows")
            .fetch_all(&mut *tx)
            .await?;

        for row in existing {
            let key: (String, String) = (row.get("parish"), row.get("center_code"));
            if !fresh_keys.contains(&key) {
                sqlx::query("DELETE FROM summary_rows WHERE parish = ? AND center_code = ?")
                    .bind(&key.0)
                    .bind(&key.1)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await
    }

    async fn insert_summary_row(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        row: &SummaryRow,
        position: i64,
        updated_at: chrono::DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO summary_rows (
                parish, center_code, center_name, row_kind,
                registered_voters, responded, yes_count, no_count, unsure_count,
                participation_pct, yes_pct, no_pct, unsure_pct,
                position, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.parish)
        .bind(&row.center_code)
        .bind(&row.center_name)
        .bind(row.row_kind.as_str())
        .bind(row.registered_voters)
        .bind(row.responded)
        .bind(row.yes)
        .bind(row.no)
        .bind(row.unsure)
        .bind(row.participation_pct)
        .bind(row.yes_pct)
        .bind(row.no_pct)
        .bind(row.unsure_pct)
        .bind(position)
        .bind(updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    // Stored summary in emitted order, for the exporters.
    pub async fn load_summary(&self) -> Result<Vec<SummaryRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT parish, center_code, center_name, row_kind,
                   registered_voters, responded, yes_count, no_count, unsure_count,
                   participation_pct, yes_pct, no_pct, unsure_pct
            FROM summary_rows
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut summary = Vec::with_capacity(rows.len());
        for row in rows {
            let kind_str: String = row.get("row_kind");
            let row_kind = RowKind::from_str(&kind_str).ok_or_else(|| {
                sqlx::Error::Decode(format!("unknown row kind: {kind_str}").into())
            })?;
            summary.push(SummaryRow {
                row_kind,
                parish: row.get("parish"),
                center_code: row.get("center_code"),
                center_name: row.get("center_name"),
                registered_voters: row.get("registered_voters"),
                responded: row.get("responded"),
                yes: row.get("yes_count"),
                no: row.get("no_count"),
                unsure: row.get("unsure_count"),
                participation_pct: row.get("participation_pct"),
                yes_pct: row.get("yes_pct"),
                no_pct: row.get("no_pct"),
                unsure_pct: row.get("unsure_pct"),
            });
        }

        Ok(summary)
    }
}
