#![no_main]

use efdms::DocumentKind;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let status = 100 + u16::from(data[0]) * 2;
    let kind = match data[1] % 3 {
        0 => DocumentKind::Registration,
        1 => DocumentKind::Receipt,
        _ => DocumentKind::Report,
    };
    // Errors are fine, panics are bugs.
    let _ = efdms::envelope::interpret(status, &data[2..], kind);
    let _ = efdms::envelope::interpret_registration(status, &data[2..]);
});
