/// Keyboard input forwarded from the keypress listener to the line prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    KeyboardCharInput(char),
    KeyboardBackspace(),
    KeyboardEnter(),
    KeyboardEOF(),
    KeyboardPaste(String),
}
