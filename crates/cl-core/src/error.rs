use thiserror::Error;

pub type ClResult<T> = Result<T, ClError>;

#[derive(Error, Debug)]
pub enum ClError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Non-positive value for {what}: {value}")]
    NonPositive { what: &'static str, value: f64 },
}
