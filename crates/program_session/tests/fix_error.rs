mod support;

use program_session::Role;
use program_studio::logbridge::{LogLevel, ProgramLogMessage};
use support::{new_session, RecordingHost};

fn error_message(content: &str) -> ProgramLogMessage {
    ProgramLogMessage::new(LogLevel::Error, content, "10:00:00")
}

#[test]
fn program_logs_accumulate_in_the_console_buffer() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);
    let epoch = session.preview_epoch();

    session.on_program_log(epoch, &ProgramLogMessage::new(LogLevel::Log, "tick", "t"), 0);
    session.on_program_log(epoch, &ProgramLogMessage::new(LogLevel::Warn, "slow", "t"), 1);

    let levels: Vec<LogLevel> = session
        .log_entries()
        .iter()
        .map(|entry| entry.level)
        .collect();
    assert_eq!(levels, vec![LogLevel::Log, LogLevel::Warn]);
}

#[test]
fn logs_from_stale_preview_epochs_are_dropped() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);
    let stale = session.preview_epoch();
    session.reset_for(None, None, &mut host);

    session.on_program_log(stale, &error_message("boom"), 0);

    assert!(session.log_entries().is_empty());
    assert_eq!(session.transcript().len(), 1);
}

#[test]
fn first_error_appends_a_fix_offer_with_the_error_log() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);
    let epoch = session.preview_epoch();

    session.on_program_log(epoch, &error_message("TypeError: x is undefined"), 1_000);

    let offer = session.transcript().last().unwrap();
    assert_eq!(offer.role, Role::Assistant);
    assert_eq!(offer.error_log.as_deref(), Some("TypeError: x is undefined"));
    // The offer never submits a request by itself.
    assert!(host.started.is_empty());
}

#[test]
fn identical_errors_in_a_tight_loop_yield_one_offer() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);
    let epoch = session.preview_epoch();

    session.on_program_log(epoch, &error_message("boom"), 1_000);
    session.on_program_log(epoch, &error_message("boom"), 1_100);

    let offers = session
        .transcript()
        .iter()
        .filter(|message| message.error_log.is_some())
        .count();
    assert_eq!(offers, 1);
    // Both observations still land in the console buffer.
    assert_eq!(session.log_entries().len(), 2);
}

#[test]
fn identical_error_past_the_window_yields_a_second_offer() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);
    let epoch = session.preview_epoch();

    session.on_program_log(epoch, &error_message("boom"), 1_000);
    session.on_program_log(epoch, &error_message("boom"), 7_000);

    let offers = session
        .transcript()
        .iter()
        .filter(|message| message.error_log.is_some())
        .count();
    assert_eq!(offers, 2);
}

#[test]
fn different_error_is_offered_immediately() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);
    let epoch = session.preview_epoch();

    session.on_program_log(epoch, &error_message("boom"), 1_000);
    session.on_program_log(epoch, &error_message("crash"), 1_050);

    let offers = session
        .transcript()
        .iter()
        .filter(|message| message.error_log.is_some())
        .count();
    assert_eq!(offers, 2);
}

#[test]
fn request_fix_submits_the_fix_prompt_as_a_user_turn() {
    let mut host = RecordingHost::new();
    let mut session = new_session(&mut host);

    session.request_fix("TypeError: x is undefined", &mut host);

    assert_eq!(host.started.len(), 1);
    let user_turn = host.started[0].last().unwrap();
    assert!(user_turn.content.contains("TypeError: x is undefined"));
    assert!(user_turn.content.contains("full corrected HTML document"));
    assert_eq!(session.transcript().last().unwrap().role, Role::User);
}
