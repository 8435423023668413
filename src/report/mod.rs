pub mod assemble;
pub mod console;
pub mod persist;
pub mod report_model;
