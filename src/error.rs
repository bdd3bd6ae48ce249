use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No current user is loaded; sign in before using favorites")]
    AuthRequired,

    #[error("A toggle for property {0} is already in flight")]
    ToggleInFlight(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
