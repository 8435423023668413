//! Scan a web page's interactive elements, have a vision-language model
//! review their labels against an annotated screenshot, and merge the
//! proposals into a per-run report.

pub mod browser;
pub mod cli;
pub mod pipeline;
pub mod report;
pub mod scanner;
pub mod suggest;
pub mod trace;
