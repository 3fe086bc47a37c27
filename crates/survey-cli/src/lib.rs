#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod logging;
pub mod options;
pub mod summary;
pub mod types;
