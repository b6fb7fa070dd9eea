#![no_main]
use heliodash::protocol::RegisterDecoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let decoder = RegisterDecoder::new();

    // Arbitrary text as a response body
    if let Ok(body) = std::str::from_utf8(data) {
        let _ = decoder.decode_response(body, "SXFUZZ");
    }

    // Interpret the input as u16 register stream in big-endian pairs
    let regs: Vec<u16> = data
        .chunks_exact(2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .collect();
    let _ = decoder.decode(&regs, "SXFUZZ");
});
