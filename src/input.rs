//! Input events and the terminal session they come from

use crossterm::event::{
    self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    KeyboardEnhancementFlags, MouseButton as TermButton, MouseEvent, MouseEventKind,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{cursor, terminal};
use std::io::{self, stdout};
use std::time::Duration;
use tracing::debug;

use crate::Size;

/// Keys the game distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    Space,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Input event. Mouse coordinates are native surface pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Quit,
    /// The output area changed, in terminal cells
    Resize(Size),
    KeyDown(Key),
    KeyUp(Key),
    MouseMotion { x: i32, y: i32 },
    MouseDown { button: MouseButton, x: i32, y: i32 },
    MouseUp { button: MouseButton, x: i32, y: i32 },
}

impl Event {
    pub fn is_key_up(&self, key: Key) -> bool {
        matches!(self, Event::KeyUp(k) if *k == key)
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        matches!(self, Event::KeyDown(k) if *k == key)
    }

    /// Pointer position carried by mouse events
    pub fn position(&self) -> Option<(i32, i32)> {
        match *self {
            Event::MouseMotion { x, y }
            | Event::MouseDown { x, y, .. }
            | Event::MouseUp { x, y, .. } => Some((x, y)),
            _ => None,
        }
    }
}

impl From<KeyCode> for Key {
    fn from(code: KeyCode) -> Self {
        match code {
            KeyCode::Char(' ') => Key::Space,
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Esc => Key::Escape,
            KeyCode::Enter => Key::Enter,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Tab => Key::Tab,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            _ => Key::Other,
        }
    }
}

fn button(b: TermButton) -> MouseButton {
    match b {
        TermButton::Left => MouseButton::Left,
        TermButton::Right => MouseButton::Right,
        TermButton::Middle => MouseButton::Middle,
    }
}

/// Turns one terminal event into game events.
///
/// Without release reporting every key press yields a `KeyDown` immediately
/// followed by a `KeyUp`. `to_native` maps a terminal cell to native surface
/// coordinates.
pub fn translate(
    event: TermEvent,
    release_events: bool,
    to_native: impl Fn(u16, u16) -> (i32, i32),
) -> Vec<Event> {
    match event {
        TermEvent::Key(KeyEvent { code, modifiers, kind, .. }) => {
            if modifiers.contains(KeyModifiers::CONTROL)
                && matches!(code, KeyCode::Char('c') | KeyCode::Char('d'))
            {
                return vec![Event::Quit];
            }

            let key = Key::from(code);
            match (kind, release_events) {
                (KeyEventKind::Release, _) => vec![Event::KeyUp(key)],
                (_, true) => vec![Event::KeyDown(key)],
                (_, false) => vec![Event::KeyDown(key), Event::KeyUp(key)],
            }
        }
        TermEvent::Mouse(MouseEvent { column, row, kind, .. }) => {
            let (x, y) = to_native(column, row);
            match kind {
                MouseEventKind::Down(b) => vec![Event::MouseDown { button: button(b), x, y }],
                MouseEventKind::Up(b) => vec![Event::MouseUp { button: button(b), x, y }],
                MouseEventKind::Moved | MouseEventKind::Drag(_) => vec![Event::MouseMotion { x, y }],
                _ => Vec::new(),
            }
        }
        TermEvent::Resize(width, height) => {
            vec![Event::Resize(Size::new(width as u32, height as u32))]
        }
        _ => Vec::new(),
    }
}

/// Raw mode terminal session with mouse capture on the alternate screen.
/// Dropping it puts the terminal back the way it was.
pub struct TerminalSession {
    release_events: bool,
    last_size: (u16, u16),
}

impl TerminalSession {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            event::EnableMouseCapture
        )?;

        let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if release_events {
            crossterm::execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        debug!(release_events, "terminal session opened");

        Ok(Self {
            release_events,
            last_size: terminal::size().unwrap_or((80, 24)),
        })
    }

    /// Whether the terminal reports key releases
    pub fn release_events(&self) -> bool {
        self.release_events
    }

    pub fn size(&self) -> (u16, u16) {
        self.last_size
    }

    /// Next pending terminal event, waiting at most `timeout`. A size change
    /// noticed between events is reported first.
    pub fn poll(&mut self, timeout: Duration) -> io::Result<Option<TermEvent>> {
        let current = terminal::size()?;
        if current != self.last_size {
            self.last_size = current;
            return Ok(Some(TermEvent::Resize(current.0, current.1)));
        }

        if !event::poll(timeout)? {
            return Ok(None);
        }

        let event = event::read()?;
        if let TermEvent::Resize(width, height) = event {
            self.last_size = (width, height);
        }
        Ok(Some(event))
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.release_events {
            let _ = crossterm::execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = crossterm::execute!(
            stdout(),
            cursor::Show,
            event::DisableMouseCapture,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}
