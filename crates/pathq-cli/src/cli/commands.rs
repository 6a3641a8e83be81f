//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("pathq")
        .about("Compile network path queries into tagged forwarding policies")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(check_command())
        .subcommand(dump_command())
}

/// Validate and compile a query document.
pub fn check_command() -> Command {
    Command::new("check")
        .about("Validate and compile a query document")
        .override_usage(
            "\
  pathq check <DOCUMENT>
  pathq check - < queries.json",
        )
        .after_help(
            r#"EXAMPLES:
  pathq check queries.json              # compile, print nothing on success
  pathq check queries.json --tag-bits 4 # fail if states need more than 4 bits"#,
        )
        .arg(document_arg().required(true))
        .arg(tag_bits_arg())
        .arg(verbose_arg())
}

/// Show the compiled fragments of a query document.
pub fn dump_command() -> Command {
    Command::new("dump")
        .about("Show symbols and compiled policy fragments")
        .override_usage(
            "\
  pathq dump <DOCUMENT>
  pathq dump <DOCUMENT> --rules",
        )
        .after_help(
            r#"EXAMPLES:
  pathq dump queries.json               # symbols and fragments
  pathq dump queries.json --rules       # plus the flattened rule table
  pathq dump - --color never < q.json   # read from stdin"#,
        )
        .arg(document_arg().required(true))
        .arg(tag_bits_arg())
        .arg(rules_arg())
        .arg(color_arg())
        .arg(verbose_arg())
}
