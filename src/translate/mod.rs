pub mod interface;
pub mod prompt;
pub mod translator;

pub use interface::*;
pub use translator::Translator;
