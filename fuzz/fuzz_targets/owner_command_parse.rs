#![no_main]

use libfuzzer_sys::fuzz_target;
use wutbot_runtime::{parse_owner_command, OutboundAction, OwnerCommand};

fuzz_target!(|data: &[u8]| {
    let body = String::from_utf8_lossy(data);
    let Some(command) = parse_owner_command(&body, "wutbot") else {
        return;
    };
    assert!(body.starts_with("wutbot"));

    let actions = command.actions("#chat");
    match command {
        OwnerCommand::Quit => assert_eq!(actions, vec![OutboundAction::Quit]),
        OwnerCommand::Abuse { subject: None } => assert!(actions.is_empty()),
        OwnerCommand::Abuse {
            subject: Some(subject),
        } => {
            assert!(!subject.is_empty());
            assert!(!subject.contains(char::is_whitespace));
            assert_eq!(actions.len(), 1);
        }
    }
});
