//! Translation module
//!
//! Translates command ASTs into structured requests for the remote entity
//! service. Translation is pure: each call builds an independent request and
//! shares no state with other calls.

mod coerce;
mod error;
mod filters;
mod joins;
mod translator;
mod values;

pub use coerce::coerce_to_attribute;
pub use error::TranslateError;
pub use filters::classify_pattern;
pub use translator::{RequestTranslator, TranslateOptions};
pub use values::coerce_literal;
