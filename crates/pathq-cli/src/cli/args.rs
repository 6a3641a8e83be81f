//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` that can be composed into commands.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Query document (positional).
pub fn document_arg() -> Arg {
    Arg::new("document")
        .value_name("DOCUMENT")
        .value_parser(value_parser!(PathBuf))
        .help("Query document (JSON), or '-' for stdin")
}

/// Tag width override (--tag-bits).
pub fn tag_bits_arg() -> Arg {
    Arg::new("tag_bits")
        .long("tag-bits")
        .value_name("BITS")
        .value_parser(value_parser!(u8).range(1..=32))
        .help("Width of the path tag field (overrides the document config)")
}

/// Print the rule table (--rules).
pub fn rules_arg() -> Arg {
    Arg::new("rules")
        .long("rules")
        .action(ArgAction::SetTrue)
        .help("Also print the composed policy as a prioritized rule table")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Verbosity level (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Verbosity level (-v for debug logs, -vv for trace logs)")
}
