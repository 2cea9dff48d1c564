//! Engine key-code space and host key translation.
//!
//! The engine speaks lowercase ASCII for printable keys and a handful of
//! high codes for everything else. Hosts must translate before posting.

use crossterm::event::{KeyCode, ModifierKeyCode};

/// Right arrow.
pub const KEY_RIGHTARROW: i32 = 0xae;
/// Left arrow.
pub const KEY_LEFTARROW: i32 = 0xac;
/// Up arrow.
pub const KEY_UPARROW: i32 = 0xad;
/// Down arrow.
pub const KEY_DOWNARROW: i32 = 0xaf;
/// Escape.
pub const KEY_ESCAPE: i32 = 27;
/// Enter/Return.
pub const KEY_ENTER: i32 = 13;
/// Tab.
pub const KEY_TAB: i32 = 9;
/// Backspace.
pub const KEY_BACKSPACE: i32 = 127;
/// Pause.
pub const KEY_PAUSE: i32 = 0xff;
/// `=`.
pub const KEY_EQUALS: i32 = 0x3d;
/// `-`.
pub const KEY_MINUS: i32 = 0x2d;
/// Shift (both sides map here).
pub const KEY_RSHIFT: i32 = 0x80 + 0x36;
/// Control (both sides map here).
pub const KEY_RCTRL: i32 = 0x80 + 0x1d;
/// Alt (both sides map here).
pub const KEY_RALT: i32 = 0x80 + 0x38;
/// F1; F2..F10 follow consecutively.
pub const KEY_F1: i32 = 0x80 + 0x3b;
/// F11.
pub const KEY_F11: i32 = 0x80 + 0x57;
/// F12.
pub const KEY_F12: i32 = 0x80 + 0x58;

/// Engine code for function key `n` (1-12).
pub const fn function_key(n: u8) -> Option<i32> {
    match n {
        1..=10 => Some(KEY_F1 + n as i32 - 1),
        11 => Some(KEY_F11),
        12 => Some(KEY_F12),
        _ => None,
    }
}

/// Engine code for a printable character.
///
/// `z` doubles as fire, matching the desktop shell's layout.
pub fn char_key(c: char) -> Option<i32> {
    if !c.is_ascii() || c.is_ascii_control() {
        return None;
    }
    let lower = c.to_ascii_lowercase();
    if lower == 'z' {
        return Some(KEY_RCTRL);
    }
    Some(lower as i32)
}

/// Translate a terminal key code into the engine key space.
///
/// Returns `None` for keys the engine has no code for.
pub fn from_crossterm(code: KeyCode) -> Option<i32> {
    Some(match code {
        KeyCode::Left => KEY_LEFTARROW,
        KeyCode::Right => KEY_RIGHTARROW,
        KeyCode::Up => KEY_UPARROW,
        KeyCode::Down => KEY_DOWNARROW,
        KeyCode::Enter => KEY_ENTER,
        KeyCode::Esc => KEY_ESCAPE,
        KeyCode::Tab => KEY_TAB,
        KeyCode::Backspace | KeyCode::Delete => KEY_BACKSPACE,
        KeyCode::Pause => KEY_PAUSE,
        KeyCode::F(n) => return function_key(n),
        KeyCode::Char(c) => return char_key(c),
        KeyCode::Modifier(modifier) => return from_modifier(modifier),
        _ => return None,
    })
}

fn from_modifier(modifier: ModifierKeyCode) -> Option<i32> {
    match modifier {
        ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => Some(KEY_RSHIFT),
        ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => Some(KEY_RCTRL),
        ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => Some(KEY_RALT),
        _ => None,
    }
}
