use std::path::PathBuf;

use pathq_compiler::dump::dump;
use pathq_core::Colors;

use super::document::load_document;

pub struct DumpArgs {
    pub document: Option<PathBuf>,
    pub tag_bits: Option<u8>,
    pub rules: bool,
    pub color: bool,
}

pub fn run(args: DumpArgs) {
    let compiled = match load_document(args.document.as_deref())
        .and_then(|document| document.compile(args.tag_bits))
    {
        Ok(compiled) => compiled,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    let colors = Colors::new(args.color);
    print!("{}", dump(&compiled, colors));
    if args.rules {
        println!();
        println!("{}[rules]{}", colors.header, colors.reset);
        print!("{}", compiled.classifier());
    }
}
