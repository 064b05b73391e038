#![no_main]

use libfuzzer_sys::fuzz_target;
use triage_metrics::classify_mention;

// First line is the term, the rest is the conclusion text.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let (term, text) = s.split_once('\n').unwrap_or((s, ""));
        let _ = classify_mention(text, term);
    }
});
