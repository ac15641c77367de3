#![no_main]
use libfuzzer_sys::fuzz_target;
use parsers::Language;
use patterns::compile_pattern;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        for language in Language::ALL {
            let _ = compile_pattern(s, language);
        }
    }
});
