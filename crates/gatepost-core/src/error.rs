use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Template id must be {min}-{max}, got {id}")]
    InvalidTemplateId { id: u16, min: u16, max: u16 },

    #[error("Invalid device identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, Error>;
