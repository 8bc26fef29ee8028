pub mod generator;
pub mod service;
pub mod validation;

pub use generator::{CodeGenerator, GenerateError};
pub use service::{ResolveError, ShortenError, ShorteningService};
pub use validation::{normalize_long_url, ValidatedUrl, ValidationError};
