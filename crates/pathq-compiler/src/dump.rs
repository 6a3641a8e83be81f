//! Human-readable dump of a compiled policy.

use std::fmt::Write as _;

use pathq_core::{Colors, Policy};

use crate::compile::CompiledPolicy;

/// Queries, symbols and every fragment, one parallel branch per line.
pub fn dump(compiled: &CompiledPolicy, colors: Colors) -> String {
    let mut out = String::new();

    dump_queries(&mut out, compiled, &colors);
    dump_symbols(&mut out, compiled, &colors);
    for (name, policy) in [
        ("tagging", compiled.tagging()),
        ("counting", compiled.counting()),
        ("end_path", compiled.end_path()),
        ("dropping", compiled.dropping()),
        ("hooks", compiled.hooks()),
    ] {
        dump_fragment(&mut out, name, policy, &colors);
    }

    let stats = compiled.stats();
    writeln!(
        out,
        "{}; {} queries, {} symbols, {} states, max tag {}{}",
        colors.note, stats.queries, stats.symbols, stats.states, stats.max_tag, colors.reset
    )
    .unwrap();
    out
}

fn dump_queries(out: &mut String, compiled: &CompiledPolicy, c: &Colors) {
    writeln!(out, "{}[queries]{}", c.header, c.reset).unwrap();
    for (i, expr) in compiled.queries().iter().enumerate() {
        writeln!(out, "{}q{i}{} = {expr}", c.name, c.reset).unwrap();
    }
    out.push('\n');
}

fn dump_symbols(out: &mut String, compiled: &CompiledPolicy, c: &Colors) {
    writeln!(out, "{}[symbols]{}", c.header, c.reset).unwrap();
    for (sym, pred) in compiled.symbols() {
        writeln!(out, "{}{sym}{} = {pred}", c.name, c.reset).unwrap();
    }
    out.push('\n');
}

fn dump_fragment(out: &mut String, name: &str, policy: &Policy, c: &Colors) {
    writeln!(out, "{}[{name}]{}", c.header, c.reset).unwrap();
    match policy {
        Policy::Par(branches) => {
            for branch in branches {
                writeln!(out, "{branch}").unwrap();
            }
        }
        other => writeln!(out, "{other}").unwrap(),
    }
    out.push('\n');
}
