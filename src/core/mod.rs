pub mod error;
pub mod record;
