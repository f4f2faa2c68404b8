#![no_main]

use libfuzzer_sys::fuzz_target;
use tacto_osc::OscPacket;

fuzz_target!(|data: &[u8]| {
    // arbitrary datagrams must decode to a packet or an error, never panic
    if let Ok(packet) = OscPacket::decode(data) {
        // whatever decoded must survive a re-encode/decode cycle
        let bytes = packet.encode();
        let _ = OscPacket::decode(&bytes);
    }
});
