/// Failure at the storage boundary. Always fatal for the current call.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Error returned by scheduler operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure delivering a notification. Logged by the scheduler, never returned.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}
