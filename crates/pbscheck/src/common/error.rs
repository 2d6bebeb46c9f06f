use thiserror::Error;

#[derive(Debug, Error)]
pub enum PbsCheckError {
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Requested {resource} ({requested}) exceeds the {queue} queue maximum of {limit}")]
    LimitExceeded {
        queue: String,
        resource: &'static str,
        requested: String,
        limit: String,
    },
    #[error(
        "User {user} already has a job in the {queue} queue, only one interactive job per user is allowed"
    )]
    InteractiveJobRunning { user: String, queue: String },
    #[error("Error: {0}")]
    GenericError(String),
}

impl From<toml::de::Error> for PbsCheckError {
    fn from(error: toml::de::Error) -> Self {
        Self::DeserializationError(error.to_string())
    }
}
