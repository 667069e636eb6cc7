//! Fuzz the daiquiri parser
//!
//! This target exercises the lexer and parser to find edge cases
//! and potential panics in the parsing code.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed input must come back as an error, never a panic
        if let Ok(expr) = daiquiri::parse(input) {
            let printed = daiquiri::pretty_print(&expr);
            assert_eq!(daiquiri::parse(&printed).ok(), Some(expr));
        }
    }
});
