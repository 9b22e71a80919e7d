#![no_main]
use blastgate_core::Command;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|line: &str| {
    if let Ok(cmd) = line.parse::<Command>() {
        // Anything accepted must carry a channel that came from the input.
        if let Some(ch) = cmd.channel() {
            assert!(line.contains(&ch.to_string()));
        }
    }
});
