#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let options = blight::Options::default();

    // Auto-detect dispatch — must never panic
    let _ = blight::load_from_memory(data, None, &options);

    // Each decoder explicitly — must never panic
    let _ = blight::decode_bmp(data, &options);
    let _ = blight::decode_tga(data, &options);
});
