use crossterm::event::Event as CrosstermEvent;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;

use super::translate;
use super::Keypress;
use crate::domain::models::Event;

fn key(code: KeyCode) -> CrosstermEvent {
    return CrosstermEvent::Key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn ctrl(char: char) -> CrosstermEvent {
    return CrosstermEvent::Key(KeyEvent::new(KeyCode::Char(char), KeyModifiers::CONTROL));
}

#[test]
fn it_interrupts_on_escape_while_streaming() {
    assert_eq!(translate(key(KeyCode::Esc), true), Keypress::Interrupt);
}

#[test]
fn it_interrupts_on_ctrl_c_while_streaming() {
    assert_eq!(translate(ctrl('c'), true), Keypress::Interrupt);
}

#[test]
fn it_ignores_escape_while_idle() {
    assert_eq!(translate(key(KeyCode::Esc), false), Keypress::Ignore);
}

#[test]
fn it_drops_typing_while_streaming() {
    assert_eq!(translate(key(KeyCode::Char('a')), true), Keypress::Ignore);
    assert_eq!(translate(key(KeyCode::Enter), true), Keypress::Ignore);
    assert_eq!(
        translate(CrosstermEvent::Paste("hi".to_string()), true),
        Keypress::Ignore
    );
}

#[test]
fn it_forwards_typing_while_idle() {
    assert_eq!(
        translate(key(KeyCode::Char('a')), false),
        Keypress::Forward(Event::KeyboardCharInput('a'))
    );
    assert_eq!(
        translate(
            CrosstermEvent::Key(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            false
        ),
        Keypress::Forward(Event::KeyboardCharInput('A'))
    );
    assert_eq!(
        translate(key(KeyCode::Enter), false),
        Keypress::Forward(Event::KeyboardEnter())
    );
    assert_eq!(
        translate(key(KeyCode::Backspace), false),
        Keypress::Forward(Event::KeyboardBackspace())
    );
    assert_eq!(
        translate(CrosstermEvent::Paste("hi".to_string()), false),
        Keypress::Forward(Event::KeyboardPaste("hi".to_string()))
    );
}

#[test]
fn it_ends_input_on_ctrl_c_and_ctrl_d_while_idle() {
    assert_eq!(
        translate(ctrl('c'), false),
        Keypress::Forward(Event::KeyboardEOF())
    );
    assert_eq!(
        translate(ctrl('d'), false),
        Keypress::Forward(Event::KeyboardEOF())
    );
}

#[test]
fn it_ignores_other_control_keys() {
    assert_eq!(translate(ctrl('r'), false), Keypress::Ignore);
    assert_eq!(translate(key(KeyCode::Up), false), Keypress::Ignore);
}

#[test]
fn it_ignores_key_releases() {
    let mut keyevent = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
    keyevent.kind = KeyEventKind::Release;

    assert_eq!(
        translate(CrosstermEvent::Key(keyevent), true),
        Keypress::Ignore
    );
}

#[test]
fn it_ignores_resizes() {
    assert_eq!(translate(CrosstermEvent::Resize(80, 24), true), Keypress::Ignore);
    assert_eq!(translate(CrosstermEvent::FocusLost, false), Keypress::Ignore);
}
