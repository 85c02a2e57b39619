mod support;

use program_session::{Mode, NoticeLevel, Role};
use support::{new_session, RecordingHost};

#[test]
fn cancel_leaves_loading_immediately_and_signals_the_host() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);
    session.submit("build me a clock", &mut host);
    session.on_turn_chunk(1, "Here is your ");

    session.cancel(&mut host);

    assert_eq!(session.mode(), Mode::Idle);
    assert!(!session.is_loading());
    assert_eq!(host.cancelled, vec![1]);
    assert!(host
        .notices
        .iter()
        .any(|notice| notice.level == NoticeLevel::Info));
}

#[test]
fn cancelled_turn_keeps_streamed_content_and_adds_no_error() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);
    session.submit("build me a clock", &mut host);
    session.on_turn_chunk(1, "Here is your ");
    session.cancel(&mut host);

    // Late events from the transport after the cancel request.
    session.on_turn_chunk(1, "clock");
    session.on_turn_cancelled(1);

    let last = session.transcript().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, "Here is your ");
    assert!(!session
        .transcript()
        .iter()
        .any(|message| message.content.starts_with("Error:")));
}

#[test]
fn failed_terminal_after_cancel_is_swallowed() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);
    session.submit("build me a clock", &mut host);
    session.cancel(&mut host);
    let notices_before = host.notices.len();

    session.on_turn_failed(1, "stream aborted", &mut host);

    assert_eq!(host.notices.len(), notices_before);
    assert!(!session
        .transcript()
        .iter()
        .any(|message| message.content.contains("stream aborted")));
}

#[test]
fn cancel_when_idle_is_a_no_op() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);

    session.cancel(&mut host);

    assert!(host.cancelled.is_empty());
    assert!(host.notices.is_empty());
}

#[test]
fn new_turn_can_start_after_cancelled_turn_terminates() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);
    session.submit("first", &mut host);
    session.cancel(&mut host);

    // Terminal event for the cancelled turn has not arrived yet.
    session.submit("second", &mut host);
    assert_eq!(host.started.len(), 1);

    session.on_turn_cancelled(1);
    session.submit("second", &mut host);
    assert_eq!(host.started.len(), 2);
    assert_eq!(session.mode(), Mode::Sending { turn_id: 2 });
}
