use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelnotesError {
    #[error("Unknown provider '{name}'. Available providers: {available}")]
    UnknownProvider { name: String, available: String },

    #[error("No API key found for {provider}. {help}")]
    MissingCredential { provider: String, help: String },

    #[error("{provider} is not configured correctly: {}", errors.join("; "))]
    InvalidProvider {
        provider: String,
        errors: Vec<String>,
    },

    #[error("API error: {0}")]
    Api(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RelnotesError>;
