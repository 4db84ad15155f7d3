#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

/// Builds a server-sent events body where every payload is sent as its own
/// `data:` event.
pub fn sse_body(payloads: &[String]) -> String {
    return payloads
        .iter()
        .map(|payload| {
            return format!("data: {payload}\n\n");
        })
        .collect::<Vec<String>>()
        .join("");
}

/// Same as `sse_body`, but each payload is preceded by a named `event:` line.
pub fn named_sse_body(events: &[(&str, String)]) -> String {
    return events
        .iter()
        .map(|(name, payload)| {
            return format!("event: {name}\ndata: {payload}\n\n");
        })
        .collect::<Vec<String>>()
        .join("");
}

/// A short multi turn conversation used across transcript and history tests.
pub fn conversation_fixture() -> Vec<(&'static str, &'static str)> {
    return vec![
        ("user", "How do I print numbers from 0 to 10 in Rust?"),
        (
            "assistant",
            "Use a range in a for loop:\n\n```rust\nfor i in 0..=10 {\n    println!(\"{i}\");\n}\n```",
        ),
        ("user", "And in reverse?"),
        ("assistant", "Call `.rev()` on the range: `(0..=10).rev()`."),
    ];
}
