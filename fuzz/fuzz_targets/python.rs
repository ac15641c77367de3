#![no_main]
use libfuzzer_sys::fuzz_target;
use parsers::{parse_source, Language};
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(tree) = parse_source(Path::new("fuzz.py"), Language::Python, s.to_string()) {
            for node in tree.root.preorder() {
                assert!(node.span.start_byte <= node.span.end_byte);
                assert!(node.span.end_byte <= tree.source.len());
            }
        }
    }
});
