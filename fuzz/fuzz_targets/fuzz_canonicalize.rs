#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must not panic. Errors are fine, panics are bugs.
    if let Ok(once) = efdms::envelope::canonicalize_bytes(data) {
        let _ = efdms::envelope::canonicalize_bytes(&once);
    }
});
