pub mod config;
pub mod credentials;
pub mod error;
pub mod interactive;
pub mod metadata;
pub mod pipeline;
pub mod translate;

pub use config::{Config, Platform, ProviderConfig};
pub use credentials::CredentialResolver;
pub use error::{RelnotesError, Result};
pub use metadata::MetadataLayout;
pub use pipeline::{
    print_summary, translate_locales, translate_release_notes, BatchOptions, BatchResult,
    BatchStats, RunOutcome,
};
pub use translate::{ProviderFactory, Translator};
