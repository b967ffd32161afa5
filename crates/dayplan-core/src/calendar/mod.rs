//! Calendar interchange for finished schedules.

pub mod ics;

pub use ics::{escape_text, export_ics, PRODID};
