#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::struct_excessive_bools,
    clippy::wildcard_imports,
    clippy::too_many_lines,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::doc_markdown
)]

pub mod app;
pub mod classify;
pub mod cli;
pub mod controller;
pub mod events;
pub mod filter;
pub mod graphql;
pub mod input;
pub mod pagination;
pub mod persist;
pub mod query;
pub mod refresh;
pub mod traits;
pub mod tui;
