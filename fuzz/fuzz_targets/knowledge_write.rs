#![no_main]

use libfuzzer_sys::fuzz_target;
use triage_metrics::memory::parse_knowledge_write;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_knowledge_write(&serde_json::Value::String(s.to_string()));
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(s) {
            let _ = parse_knowledge_write(&v);
        }
    }
});
