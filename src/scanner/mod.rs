pub mod action_model;
pub mod annotate;
pub mod error;
pub mod scanner;
