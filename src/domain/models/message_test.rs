use super::Message;
use super::Role;

#[test]
fn it_executes_new() {
    let msg = Message::new(Role::User, "Hi there!");
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.content, "Hi there!".to_string());
    assert!(!msg.is_assistant());
}

#[test]
fn it_builds_assistant_messages() {
    let msg = Message::assistant("Hello");
    assert_eq!(msg.role, Role::Assistant);
    assert!(msg.is_assistant());
}

#[test]
fn it_serializes_with_lowercase_roles() {
    let payload = serde_json::to_string(&vec![
        Message::user("hello"),
        Message::assistant("Hi there"),
        Message::new(Role::System, "Be brief"),
    ])
    .unwrap();

    insta::assert_snapshot!(payload, @r###"[{"role":"user","content":"hello"},{"role":"assistant","content":"Hi there"},{"role":"system","content":"Be brief"}]"###);
}

#[test]
fn it_rejects_unknown_roles() {
    let res = serde_json::from_str::<Message>(r#"{"role":"robot","content":"beep"}"#);
    assert!(res.is_err());
}

#[test]
fn it_rejects_missing_content() {
    let res = serde_json::from_str::<Message>(r#"{"role":"user"}"#);
    assert!(res.is_err());
}

#[test]
fn it_rejects_capitalized_roles() {
    let res = serde_json::from_str::<Message>(r#"{"role":"Assistant","content":"Hi"}"#);
    assert!(res.is_err());
}

#[test]
fn it_previews_first_line() {
    let msg = Message::user("What is Rust?\nAnd why?");
    assert_eq!(msg.preview(70), "What is Rust?");
}

#[test]
fn it_previews_long_lines() {
    let msg = Message::user("abcdefghijklmnop");
    assert_eq!(msg.preview(10), "abcdefg...");
}
