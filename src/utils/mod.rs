//! Text helpers: trigger tags and fillings, Pip-Boy profile parsing.

pub mod parser;
pub mod pipboy;

pub use parser::{Fillings, TriggerTags, apply_fillings, html_escape, parse_tags};
pub use pipboy::{PipBoy, parse_pipboy};
