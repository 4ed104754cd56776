//! The terminal as the controller sees it: a frame to paint, keys to read,
//! and a one-line prompt.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use ratatui::prelude::*;
use tracing::{error, warn};

use mpy_base::module::Prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(KeyCode),
    Resize(u16, u16),
}

pub trait Surface: Prompt {
    fn area(&self) -> io::Result<Rect>;

    fn draw(&mut self, paint: &mut dyn FnMut(&mut Frame)) -> io::Result<()>;

    /// Wait up to `timeout` for a key press or a resize.
    fn poll_input(&mut self, timeout: Duration) -> io::Result<Option<Input>>;
}

// =============================================================================
// Terminal lifetime
// =============================================================================

/// Raw mode and the alternate screen for as long as the guard lives.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        io::stdout().execute(EnterAlternateScreen)?.execute(Hide)?;
        Ok(Self)
    }
}

fn restore() {
    let _ = terminal::disable_raw_mode();
    let _ = io::stdout().execute(Show);
    let _ = io::stdout().execute(LeaveAlternateScreen);
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
    }
}

/// Put the terminal back before the default hook prints the panic, and keep
/// a copy in the log.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        error!(%info, "panic");
        default_hook(info);
    }));
}

// =============================================================================
// Crossterm surface
// =============================================================================

pub struct TerminalSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSurface {
    pub fn new() -> io::Result<Self> {
        Ok(Self { terminal: Terminal::new(CrosstermBackend::new(io::stdout()))? })
    }

    fn read_line(&mut self, label: &str) -> io::Result<Option<String>> {
        let row = self.terminal.size()?.height.saturating_sub(1);
        let mut text = String::new();
        loop {
            let out = self.terminal.backend_mut();
            out.queue(MoveTo(0, row))?
                .queue(Clear(ClearType::CurrentLine))?
                .queue(SetAttribute(Attribute::Bold))?
                .queue(Print(format!("{}: ", label)))?
                .queue(SetAttribute(Attribute::Reset))?
                .queue(Print(&text))?
                .queue(Show)?;
            Write::flush(out)?;

            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                match key.code {
                    KeyCode::Enter => return Ok(Some(text)),
                    KeyCode::Esc => return Ok(None),
                    KeyCode::Backspace => {
                        text.pop();
                    }
                    KeyCode::Char(c) => text.push(c),
                    _ => {}
                }
            }
        }
    }
}

impl Prompt for TerminalSurface {
    fn prompt(&mut self, label: &str) -> Option<String> {
        let answer = self.read_line(label);
        let _ = self.terminal.backend_mut().execute(Hide);
        // The prompt wrote around ratatui's buffer; repaint everything next frame.
        let _ = self.terminal.clear();
        answer.unwrap_or_else(|e| {
            warn!(error = %e, "prompt failed");
            None
        })
    }
}

impl Surface for TerminalSurface {
    fn area(&self) -> io::Result<Rect> {
        let size = self.terminal.size()?;
        Ok(Rect::new(0, 0, size.width, size.height))
    }

    fn draw(&mut self, paint: &mut dyn FnMut(&mut Frame)) -> io::Result<()> {
        self.terminal.draw(|frame| paint(frame))?;
        Ok(())
    }

    fn poll_input(&mut self, timeout: Duration) -> io::Result<Option<Input>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(Input::Key(key.code)),
            Event::Resize(w, h) => Some(Input::Resize(w, h)),
            _ => None,
        })
    }
}

// =============================================================================
// Test double
// =============================================================================
