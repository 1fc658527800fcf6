//! Domain entities

mod record;

pub use record::Record;
