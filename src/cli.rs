use crate::filter::{FilterToken, RunsTab};
use clap::Parser;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "runw", version = VERSION, about = "Run list watcher TUI")]
pub struct Cli {
    /// Base URL of the orchestration webserver
    #[arg(short, long, default_value = "http://localhost:3000", value_parser = validate_endpoint)]
    pub endpoint: String,

    /// Refresh interval in seconds
    #[arg(short, long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Runs per page
    #[arg(short = 'n', long, default_value_t = 25, value_parser = parse_page_size)]
    pub page_size: usize,

    /// Initial filter token (kind:value), repeatable; replaces saved filters
    #[arg(short, long = "filter", value_parser = parse_token)]
    pub filters: Vec<FilterToken>,

    /// Initial tab: all, queued, in-progress, done
    #[arg(short, long)]
    pub tab: Option<RunsTab>,

    /// Do not load or save filters between sessions
    #[arg(long)]
    pub no_persist: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Write debug logs to the state directory
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn validate_endpoint(s: &str) -> Result<String, String> {
    let trimmed = s.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| format!("endpoint must start with http:// or https://, got '{s}'"))?;
    if rest.is_empty() || rest.starts_with('/') {
        return Err(format!("endpoint '{s}' has no host"));
    }
    Ok(trimmed.to_string())
}

fn parse_token(s: &str) -> Result<FilterToken, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_page_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("page size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid page size '{s}': {e}")),
    }
}
