#![no_main]
use amberwatch::amber::{Direction, NEM_TIMEZONE, Snapshot};
use amberwatch::select_at;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(snapshot) = Snapshot::from_json(body, NEM_TIMEZONE) else {
        return;
    };

    let now = Utc.with_ymd_and_hms(2021, 5, 6, 2, 30, 0).unwrap();
    for direction in Direction::ALL {
        let selection = select_at(&snapshot, direction, now);
        // Next is always in the future and never before current
        if let (Some(current), Some(next)) = (selection.current, selection.next) {
            assert!(next.starts_at > now);
            assert!(current.starts_at <= next.starts_at);
        }
        if selection.is_unavailable() {
            assert!(selection.next.is_none());
        }
    }
});
