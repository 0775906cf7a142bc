pub mod cors;

pub use cors::{enforce_origin, CorsPolicy};
