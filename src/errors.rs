use thiserror::Error;

// Failure kinds of a totalization run. Reads and writes are separated because
// a read failure is guaranteed to leave the summary store untouched, while a
// write failure may need an operator to re-run the totalization.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("failed to read source data: {0}")]
    SourceRead(#[source] sqlx::Error),

    #[error("failed to write summary rows: {0}")]
    Write(#[source] sqlx::Error),
}
