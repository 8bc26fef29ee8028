pub mod url;

pub use url::{RedirectTarget, ShortRecord, ShortenRequest, ShortenResponse};
