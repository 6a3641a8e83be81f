//! Dispatch logic: extract params from ArgMatches and convert to command args.

use std::path::PathBuf;

use clap::ArgMatches;

use super::ColorChoice;
use crate::commands::check::CheckArgs;
use crate::commands::dump::DumpArgs;

pub struct CheckParams {
    pub document: Option<PathBuf>,
    pub tag_bits: Option<u8>,
    pub verbose: u8,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            document: m.get_one::<PathBuf>("document").cloned(),
            tag_bits: m.get_one::<u8>("tag_bits").copied(),
            verbose: m.get_count("verbose"),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            document: p.document,
            tag_bits: p.tag_bits,
        }
    }
}

pub struct DumpParams {
    pub document: Option<PathBuf>,
    pub tag_bits: Option<u8>,
    pub rules: bool,
    pub color: ColorChoice,
    pub verbose: u8,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            document: m.get_one::<PathBuf>("document").cloned(),
            tag_bits: m.get_one::<u8>("tag_bits").copied(),
            rules: m.get_flag("rules"),
            color: parse_color(m),
            verbose: m.get_count("verbose"),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            document: p.document,
            tag_bits: p.tag_bits,
            rules: p.rules,
            color: p.color.should_colorize(),
        }
    }
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(String::as_str) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
