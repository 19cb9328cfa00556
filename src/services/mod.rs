pub mod aladhan;
pub mod format;
pub mod geo;
pub mod location;
pub mod prayer;
pub mod schedule;
