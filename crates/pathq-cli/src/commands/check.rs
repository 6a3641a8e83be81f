use std::path::PathBuf;

use super::document::load_document;

pub struct CheckArgs {
    pub document: Option<PathBuf>,
    pub tag_bits: Option<u8>,
}

pub fn run(args: CheckArgs) {
    let compiled = load_document(args.document.as_deref())
        .and_then(|document| document.compile(args.tag_bits));
    if let Err(err) = compiled {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }

    // Silent on success (like cargo check)
}
