#![no_main]

use libfuzzer_sys::fuzz_target;
use wutbot_irc::{parse_irc_line, InboundEvent, MAX_IRC_LINE_BYTES};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let Ok(message) = parse_irc_line(&raw) else {
        return;
    };
    assert!(!message.command.is_empty());
    assert_eq!(message.command, message.command.to_ascii_uppercase());

    if let Ok(line) = message.to_line() {
        if line.len() <= MAX_IRC_LINE_BYTES {
            let reparsed = parse_irc_line(&line).expect("serialized line must parse");
            assert_eq!(reparsed.command, message.command);
            assert_eq!(reparsed.params, message.params);
            assert_eq!(reparsed.tags, message.tags);
        }
    }

    let event = InboundEvent::from_message(message);
    let _ = event.kind();
    let _ = event.account_tag();
    let _ = event.message_id();
});
