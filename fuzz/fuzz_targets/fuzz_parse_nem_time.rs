#![no_main]
use amberwatch::amber::{NEM_TIMEZONE, parse_nem_time};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let _ = parse_nem_time(raw, NEM_TIMEZONE);
    }
});
