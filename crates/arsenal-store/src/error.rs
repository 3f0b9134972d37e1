use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no results for query")]
    NoResults,

    #[error("player {0} not found")]
    PlayerNotFound(i64),

    #[error("invalid stored value in {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("{0}")]
    Other(String),
}
