use chat_api::{ChatStreamEvent, SseLineParser};

#[test]
fn line_framing_parses_deltas_and_done() {
    let payload = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"hel\"}}]}\n",
        "\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
        "data: [DONE]\n",
    );

    let events = SseLineParser::parse_lines(payload);
    assert_eq!(
        events,
        vec![
            ChatStreamEvent::ContentDelta {
                delta: "hel".to_owned(),
            },
            ChatStreamEvent::ContentDelta {
                delta: "lo".to_owned(),
            },
            ChatStreamEvent::Done,
        ]
    );
}

#[test]
fn parser_ignores_malformed_and_non_data_lines() {
    let payload = concat!(
        "event: ping\n",
        "data: {broken-json\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n",
    );

    let events = SseLineParser::parse_lines(payload);
    assert_eq!(
        events,
        vec![ChatStreamEvent::ContentDelta {
            delta: "x".to_owned(),
        }]
    );
}

#[test]
fn parser_skips_absent_and_empty_delta_content() {
    let payload = concat!(
        "data: {\"choices\":[{\"delta\":{}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n",
        "data: {\"choices\":[]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n",
    );

    let events = SseLineParser::parse_lines(payload);
    assert_eq!(
        events,
        vec![ChatStreamEvent::ContentDelta {
            delta: "ok".to_owned(),
        }]
    );
}

#[test]
fn parser_handles_chunk_boundaries_inside_a_line() {
    let mut parser = SseLineParser::default();
    assert!(parser
        .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"sp")
        .is_empty());
    assert!(parser.feed(b"lit\"}}]").is_empty());

    let events = parser.feed(b"}\n");
    assert_eq!(
        events,
        vec![ChatStreamEvent::ContentDelta {
            delta: "split".to_owned(),
        }]
    );
    assert!(parser.is_empty_buffer());
}

#[test]
fn multibyte_character_split_across_feeds_stays_intact() {
    let payload = "data: {\"choices\":[{\"delta\":{\"content\":\"中文\"}}]}\n";
    // Land the chunk boundary inside the three-byte character.
    let split = payload.find('中').expect("multibyte content") + 1;
    let bytes = payload.as_bytes();

    let mut parser = SseLineParser::default();
    assert!(parser.feed(&bytes[..split]).is_empty());

    let events = parser.feed(&bytes[split..]);
    assert_eq!(
        events,
        vec![ChatStreamEvent::ContentDelta {
            delta: "中文".to_owned(),
        }]
    );
    assert!(parser.is_empty_buffer());
}

#[test]
fn parser_tolerates_crlf_line_endings() {
    let events =
        SseLineParser::parse_lines("data: {\"choices\":[{\"delta\":{\"content\":\"y\"}}]}\r\n");
    assert_eq!(
        events,
        vec![ChatStreamEvent::ContentDelta {
            delta: "y".to_owned(),
        }]
    );
}

#[test]
fn parser_skips_blank_data_payloads() {
    let events = SseLineParser::parse_lines("data: \ndata:\n");
    assert!(events.is_empty());
}
