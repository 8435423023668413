pub mod error;
pub mod gemini;
pub mod parse;
pub mod probe;
pub mod prompt;
pub mod requester;
pub mod suggestion_model;
