pub mod convert;
pub mod fallback;
pub mod health;

pub use convert::convert_document;
pub use fallback::not_found;
pub use health::health_check;
