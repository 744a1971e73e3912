pub mod logging;
pub mod mode;

pub use mode::{extract_first_bracket_content, extract_mode};
