//! Tests for the panel state machine, response parsing, and message types.

use drawbridge_config::{MemoryCredentialStore, PANEL_MAX_WIDTH, PANEL_MIN_WIDTH};

use super::client::{CancelToken, ChatClient, ChatError, parse_reply};
use super::state::{Command, PanelEvent, PanelState};
use super::types::{ChatMessage, Role};

fn new_state() -> PanelState {
    PanelState::new(
        360.0,
        false,
        Box::new(MemoryCredentialStore::with_value("sk-test")),
    )
}

fn drag_to(state: &mut PanelState, pointer_x: f32, viewport_width: f32) {
    state.apply(PanelEvent::DragStarted);
    state.apply(PanelEvent::DragMoved {
        pointer_x,
        viewport_width,
    });
    state.apply(PanelEvent::DragEnded);
}

#[test]
fn test_new_state_adopts_stored_credential() {
    let state = new_state();
    assert!(state.messages.is_empty());
    assert!(state.input.is_empty());
    assert!(!state.loading);
    assert_eq!(state.credential, "sk-test");
    assert_eq!(state.width, 360.0);
}

#[test]
fn test_drag_width_tracks_pointer_within_bounds() {
    let mut state = new_state();
    drag_to(&mut state, 1000.0, 1440.0);
    assert_eq!(state.width, 440.0);
    assert!(!state.resizing);
}

#[test]
fn test_drag_width_clamps_at_both_bounds() {
    let mut state = new_state();

    // Pointer at the far left asks for the whole viewport.
    drag_to(&mut state, 0.0, 1440.0);
    assert_eq!(state.width, PANEL_MAX_WIDTH);

    // Pointer past the right edge asks for a negative width.
    drag_to(&mut state, 1500.0, 1440.0);
    assert_eq!(state.width, PANEL_MIN_WIDTH);

    // Exactly at the bounds.
    drag_to(&mut state, 1440.0 - PANEL_MIN_WIDTH, 1440.0);
    assert_eq!(state.width, PANEL_MIN_WIDTH);
    drag_to(&mut state, 1440.0 - PANEL_MAX_WIDTH, 1440.0);
    assert_eq!(state.width, PANEL_MAX_WIDTH);
}

#[test]
fn test_drag_moves_ignored_when_not_dragging() {
    let mut state = new_state();
    state.apply(PanelEvent::DragMoved {
        pointer_x: 100.0,
        viewport_width: 1440.0,
    });
    assert_eq!(state.width, 360.0);
}

#[test]
fn test_drag_does_not_start_while_collapsed() {
    let mut state = new_state();
    state.apply(PanelEvent::CollapseToggled);
    state.apply(PanelEvent::DragStarted);
    assert!(!state.resizing);
}

#[test]
fn test_send_appends_user_message_and_emits_command() {
    let mut state = new_state();
    state.input = "  hello  ".to_string();

    let command = state.apply(PanelEvent::SendRequested);

    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].role, Role::User);
    assert_eq!(state.messages[0].content, "hello");
    assert!(state.input.is_empty());
    assert!(state.loading);
    assert!(state.error.is_none());

    match command {
        Some(Command::Send {
            seq,
            credential,
            messages,
        }) => {
            assert_eq!(seq, 1);
            assert_eq!(credential, "sk-test");
            assert_eq!(messages, vec![ChatMessage::user("hello")]);
        }
        other => panic!("Expected Send command, got {other:?}"),
    }
}

#[test]
fn test_whitespace_send_is_a_no_op() {
    let mut state = new_state();
    state.input = "   \n ".to_string();
    let command = state.apply(PanelEvent::SendRequested);
    assert!(command.is_none());
    assert!(state.messages.is_empty());
    assert_eq!(state.input, "   \n ");
    assert!(!state.loading);
}

#[test]
fn test_send_while_loading_is_a_no_op() {
    let mut state = new_state();
    state.input = "first".to_string();
    assert!(state.apply(PanelEvent::SendRequested).is_some());

    state.input = "second".to_string();
    let command = state.apply(PanelEvent::SendRequested);
    assert!(command.is_none());
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.input, "second");
    assert!(state.loading);
}

#[test]
fn test_successful_round_trip() {
    let mut state = new_state();
    state.input = "hello".to_string();
    let Some(Command::Send { seq, .. }) = state.apply(PanelEvent::SendRequested) else {
        panic!("Expected Send command");
    };

    state.apply(PanelEvent::SendSucceeded {
        seq,
        text: "hi there".to_string(),
    });

    assert_eq!(
        state.messages,
        vec![ChatMessage::user("hello"), ChatMessage::assistant("hi there")]
    );
    assert!(state.error.is_none());
    assert!(!state.loading);
}

#[test]
fn test_backend_failure_keeps_user_message() {
    let mut state = new_state();
    state.input = "hello".to_string();
    let Some(Command::Send { seq, .. }) = state.apply(PanelEvent::SendRequested) else {
        panic!("Expected Send command");
    };

    let message = ChatError::Backend {
        status: 401,
        status_text: "Unauthorized".to_string(),
        body: "{\"error\":\"bad key\"}".to_string(),
    }
    .to_string();
    state.apply(PanelEvent::SendFailed { seq, message });

    assert_eq!(state.messages, vec![ChatMessage::user("hello")]);
    assert!(!state.loading);
    let error = state.error.as_deref().unwrap();
    assert!(error.contains("401"), "error should carry the status: {error}");
}

#[test]
fn test_next_send_clears_previous_error() {
    let mut state = new_state();
    state.input = "hello".to_string();
    let Some(Command::Send { seq, .. }) = state.apply(PanelEvent::SendRequested) else {
        panic!("Expected Send command");
    };
    state.apply(PanelEvent::SendFailed {
        seq,
        message: "boom".to_string(),
    });
    assert!(state.error.is_some());

    state.input = "again".to_string();
    state.apply(PanelEvent::SendRequested);
    assert!(state.error.is_none());
}

#[test]
fn test_stale_completion_is_dropped() {
    let mut state = new_state();
    state.input = "hello".to_string();
    let Some(Command::Send { seq, .. }) = state.apply(PanelEvent::SendRequested) else {
        panic!("Expected Send command");
    };

    let cancel = state.apply(PanelEvent::CancelRequested);
    assert_eq!(cancel, Some(Command::CancelInFlight { seq }));
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some("Request cancelled"));

    // The worker eventually reports; by then nobody is waiting.
    state.apply(PanelEvent::SendSucceeded {
        seq,
        text: "late reply".to_string(),
    });
    assert_eq!(state.messages, vec![ChatMessage::user("hello")]);
}

#[test]
fn test_cancel_without_in_flight_request_is_a_no_op() {
    let mut state = new_state();
    assert!(state.apply(PanelEvent::CancelRequested).is_none());
    assert!(state.error.is_none());
}

#[test]
fn test_collapse_expand_preserves_conversation_and_geometry() {
    let mut state = new_state();
    state.input = "hello".to_string();
    let Some(Command::Send { seq, .. }) = state.apply(PanelEvent::SendRequested) else {
        panic!("Expected Send command");
    };
    state.apply(PanelEvent::SendSucceeded {
        seq,
        text: "hi".to_string(),
    });
    drag_to(&mut state, 1000.0, 1440.0);

    state.apply(PanelEvent::CollapseToggled);
    assert!(state.collapsed);
    state.apply(PanelEvent::CollapseToggled);
    assert!(!state.collapsed);

    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.credential, "sk-test");
    assert_eq!(state.width, 440.0);
}

#[test]
fn test_credential_changes_persist_non_empty_values_only() {
    let store = std::sync::Arc::new(MemoryCredentialStore::new());
    let mut state = PanelState::new(360.0, false, Box::new(std::sync::Arc::clone(&store)));
    state.apply(PanelEvent::CredentialChanged {
        value: "sk-a".to_string(),
    });
    state.apply(PanelEvent::CredentialChanged {
        value: String::new(),
    });
    state.apply(PanelEvent::CredentialChanged {
        value: "sk-b".to_string(),
    });
    assert_eq!(state.credential, "sk-b");
    assert_eq!(
        store.saved_values(),
        vec!["sk-a".to_string(), "sk-b".to_string()]
    );
}

#[test]
fn test_can_send_requires_credential_and_idle() {
    let mut state = PanelState::new(360.0, false, Box::new(MemoryCredentialStore::new()));
    assert!(!state.can_send());

    state.apply(PanelEvent::CredentialChanged {
        value: "sk-x".to_string(),
    });
    assert!(state.can_send());

    state.input = "hi".to_string();
    state.apply(PanelEvent::SendRequested);
    assert!(!state.can_send());
}

#[test]
fn test_parse_reply_extracts_first_choice_content() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi there"}},{"message":{"content":"ignored"}}]}"#;
    assert_eq!(parse_reply(200, "OK", body).unwrap(), "hi there");
}

#[test]
fn test_parse_reply_non_success_status() {
    let err = parse_reply(401, "Unauthorized", "bad key").unwrap_err();
    match &err {
        ChatError::Backend {
            status,
            status_text,
            body,
        } => {
            assert_eq!(*status, 401);
            assert_eq!(status_text, "Unauthorized");
            assert_eq!(body, "bad key");
        }
        other => panic!("Expected Backend error, got {other:?}"),
    }
    let text = err.to_string();
    assert!(text.contains("401"));
    assert!(text.contains("Unauthorized"));
}

#[test]
fn test_parse_reply_missing_or_empty_content() {
    assert!(matches!(
        parse_reply(200, "OK", r#"{"choices":[]}"#),
        Err(ChatError::MalformedResponse)
    ));
    assert!(matches!(
        parse_reply(200, "OK", r#"{"choices":[{"message":{}}]}"#),
        Err(ChatError::MalformedResponse)
    ));
    assert!(matches!(
        parse_reply(200, "OK", r#"{"choices":[{"message":{"content":""}}]}"#),
        Err(ChatError::MalformedResponse)
    ));
    assert!(matches!(
        parse_reply(200, "OK", "not json"),
        Err(ChatError::MalformedResponse)
    ));
}

#[test]
fn test_client_rejects_missing_credential_before_any_transport() {
    // The endpoint is unroutable; an attempted connection would fail with a
    // network error, so getting MissingCredential proves no call was made.
    let client = ChatClient::new("http://127.0.0.1:1/never", "test-model", 1);
    let err = client
        .complete("", &[ChatMessage::user("hello")], &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ChatError::MissingCredential));
}

#[test]
fn test_message_constructors_tag_roles() {
    assert_eq!(ChatMessage::user("a").role, Role::User);
    assert_eq!(ChatMessage::assistant("b").role, Role::Assistant);
    assert_eq!(ChatMessage::system("c").role, Role::System);
}

#[test]
fn test_message_wire_format_is_lowercase_role_and_content() {
    let json = serde_json::to_string(&ChatMessage::user("hello")).unwrap();
    assert_eq!(json, r#"{"role":"user","content":"hello"}"#);
}
