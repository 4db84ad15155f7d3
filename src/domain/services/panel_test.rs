use super::Panel;
use super::PanelKind;

#[test]
fn it_renders_info_panels() {
    let panel = Panel::info(vec![
        "".to_string(),
        "Model: gpt-4".to_string(),
        "Temperature: 0".to_string(),
    ])
    .with_title("New chat conversation started");

    assert_eq!(panel.kind, PanelKind::Info);
    insta::assert_snapshot!(panel.render_with(false), @r###"
    ╭─────────────────────────────────╮
    │                                 │
    │  New chat conversation started  │
    │                                 │
    │  Model: gpt-4                   │
    │  Temperature: 0                 │
    │                                 │
    ╰─────────────────────────────────╯
    "###);
}

#[test]
fn it_renders_error_panels() {
    let panel = Panel::error(
        "InputError",
        vec!["Temperature must be a number between 0 and 1".to_string()],
    );

    assert_eq!(panel.kind, PanelKind::Error);
    insta::assert_snapshot!(panel.render_with(false), @r###"
    ╭────────────────────────────────────────────────╮
    │                                                │
    │  InputError                                    │
    │  Temperature must be a number between 0 and 1  │
    │                                                │
    ╰────────────────────────────────────────────────╯
    "###);
}

#[test]
fn it_splits_multiline_entries() {
    let panel = Panel::info(vec![
        "1: 10/18 09:15 \"hello\"\n2: 10/18 09:20 \"What is Rust?\"".to_string(),
    ]);

    insta::assert_snapshot!(panel.render_with(false), @r###"
    ╭──────────────────────────────────╮
    │                                  │
    │  1: 10/18 09:15 "hello"          │
    │  2: 10/18 09:20 "What is Rust?"  │
    │                                  │
    ╰──────────────────────────────────╯
    "###);
}

#[test]
fn it_measures_wide_characters() {
    let rendered = Panel::info(vec!["日本".to_string(), "abcd".to_string()]).render_with(false);
    let widths = rendered
        .lines()
        .map(|line| return unicode_width::UnicodeWidthStr::width(line))
        .collect::<Vec<usize>>();

    assert!(widths.iter().all(|width| return *width == widths[0]));
}
