//! Terminal host: paints frames into a true-color terminal.
//!
//! Each terminal cell shows two vertically stacked pixels using the upper
//! half block (`▀`): the foreground is the top pixel, the background the
//! bottom one. The frame is scaled nearest-neighbor to the terminal size
//! and flushed in a single write.
//!
//! An input actor thread polls `crossterm` for key events, translates
//! them to engine key codes and posts them through a [`HostHandle`].

// Frames arrive as raw plane views.
#![allow(unsafe_code)]

use super::HostSink;
use crate::bridge::HostHandle;
use crate::config::TerminalConfig;
use crate::error::{BridgeError, HostError};
use crate::event::keys;
use crate::video::{HostPalette, Palette, PlaneView, Rgb};
use crossterm::event::{
    self, Event, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{
    cursor, execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

const UPPER_HALF_BLOCK: &str = "\u{2580}";

/// Render an indexed frame as half-block cells into `out`.
///
/// `pixels` is `width * height` palette indices, row-major. The output
/// covers `cols` x `rows` terminal cells starting at the home position.
/// Color escapes are only emitted when a color changes.
pub fn compose_frame(
    pixels: &[u8],
    width: u32,
    height: u32,
    palette: &Palette,
    cols: u16,
    rows: u16,
    out: &mut Vec<u8>,
) {
    out.clear();
    let (w, h) = (width as usize, height as usize);
    if cols == 0 || rows == 0 || w == 0 || h == 0 || pixels.len() < w * h {
        return;
    }

    let (cols, rows) = (usize::from(cols), usize::from(rows));
    let sub_rows = rows * 2;
    let mut fg: Option<Rgb> = None;
    let mut bg: Option<Rgb> = None;

    for row in 0..rows {
        let _ = write!(out, "\x1b[{};1H", row + 1);
        let top = (row * 2) * h / sub_rows;
        let bottom = (row * 2 + 1) * h / sub_rows;

        for col in 0..cols {
            let x = col * w / cols;
            let upper = palette.get(pixels[top * w + x]);
            let lower = palette.get(pixels[bottom * w + x]);

            if fg != Some(upper) {
                let _ = write!(out, "\x1b[38;2;{};{};{}m", upper.r, upper.g, upper.b);
                fg = Some(upper);
            }
            if bg != Some(lower) {
                let _ = write!(out, "\x1b[48;2;{};{};{}m", lower.r, lower.g, lower.b);
                bg = Some(lower);
            }
            out.extend_from_slice(UPPER_HALF_BLOCK.as_bytes());
        }
    }

    out.extend_from_slice(b"\x1b[0m");
}

/// Host that draws into the controlling terminal.
pub struct TerminalHost {
    config: TerminalConfig,
    palette: Palette,
    width: u32,
    height: u32,
    output: Vec<u8>,
    stdout: Stdout,
    input: Option<InputActor>,
    enhanced_keys: bool,
    active: bool,
}

impl TerminalHost {
    /// Create a terminal host. The terminal is untouched until `init_graphics`.
    pub fn new(config: TerminalConfig) -> Self {
        Self {
            config,
            palette: Palette::new(),
            width: 0,
            height: 0,
            output: Vec::with_capacity(65536),
            stdout: io::stdout(),
            input: None,
            enhanced_keys: false,
            active: false,
        }
    }

    fn restore(&mut self) -> io::Result<()> {
        if let Some(actor) = self.input.take() {
            actor.join();
        }
        if !self.active {
            return Ok(());
        }
        self.active = false;

        if self.enhanced_keys {
            execute!(self.stdout, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.stdout, cursor::Show)?;
        if self.config.alternate_screen {
            execute!(self.stdout, LeaveAlternateScreen)?;
        }
        terminal::disable_raw_mode()
    }
}

impl HostSink for TerminalHost {
    fn name(&self) -> &str {
        "terminal"
    }

    fn init_graphics(
        &mut self,
        width: u32,
        height: u32,
        handle: &HostHandle,
    ) -> Result<(), HostError> {
        terminal::enable_raw_mode()?;
        self.active = true;

        if self.config.alternate_screen {
            execute!(self.stdout, EnterAlternateScreen)?;
        }
        execute!(self.stdout, cursor::Hide, Clear(ClearType::All))?;

        self.enhanced_keys = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if self.enhanced_keys {
            execute!(
                self.stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        self.width = width;
        self.height = height;
        self.input = Some(InputActor::spawn(
            handle.clone(),
            Duration::from_millis(self.config.poll_timeout_ms),
            self.config.synthesize_key_up && !self.enhanced_keys,
        ));
        debug!(width, height, enhanced = self.enhanced_keys, "terminal host ready");
        Ok(())
    }

    fn set_palette(&mut self, palette: &HostPalette) -> Result<(), HostError> {
        self.palette = palette.decode();
        Ok(())
    }

    fn start_frame(&mut self) -> Result<(), HostError> {
        Ok(())
    }

    fn finish_update(&mut self, frame: PlaneView) -> Result<(), HostError> {
        let (cols, rows) = terminal::size()?;
        // SAFETY: called on the engine thread after the frame is complete;
        // the planes outlive this call.
        let pixels = unsafe { frame.as_slice() };
        compose_frame(
            pixels,
            self.width,
            self.height,
            &self.palette,
            cols,
            rows,
            &mut self.output,
        );
        self.stdout.write_all(&self.output)?;
        self.stdout.flush()?;
        Ok(())
    }

    fn shutdown_graphics(&mut self) -> Result<(), HostError> {
        self.restore()?;
        Ok(())
    }
}

impl Drop for TerminalHost {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Input actor that forwards terminal key events to the engine.
struct InputActor {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl InputActor {
    fn spawn(host: HostHandle, poll_timeout: Duration, synthesize_key_up: bool) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("framebridge-input".to_string())
            .spawn(move || {
                Self::run_loop(&host, &shutdown_clone, poll_timeout, synthesize_key_up);
            })
            .expect("Failed to spawn input thread");

        Self {
            handle: Some(handle),
            shutdown,
        }
    }

    fn join(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn run_loop(
        host: &HostHandle,
        shutdown: &AtomicBool,
        poll_timeout: Duration,
        synthesize_key_up: bool,
    ) {
        while !shutdown.load(Ordering::Relaxed) {
            match event::poll(poll_timeout) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => {
                        if !forward_key(host, key, synthesize_key_up) {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "terminal read failed"),
                },
                Ok(false) => {}
                Err(e) => warn!(error = %e, "terminal poll failed"),
            }
        }
    }
}

impl Drop for InputActor {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

/// Post one terminal key event to the bridge.
///
/// A press posts a key-down, followed by a key-up when the terminal cannot
/// report releases. Unmapped keys are ignored. Returns `false` once the
/// bridge stops accepting events.
fn forward_key(host: &HostHandle, key: KeyEvent, synthesize_key_up: bool) -> bool {
    let Some(code) = keys::from_crossterm(key.code) else {
        return true;
    };

    let result = match key.kind {
        KeyEventKind::Press => host.on_key_down(code).and_then(|()| {
            if synthesize_key_up {
                host.on_key_up(code)
            } else {
                Ok(())
            }
        }),
        KeyEventKind::Repeat => host.on_key_down(code),
        KeyEventKind::Release => host.on_key_up(code),
    };

    match result {
        Ok(()) => true,
        Err(BridgeError::InvalidPhase { .. }) => false,
        Err(e) => {
            warn!(error = %e, code, "dropping key event");
            true
        }
    }
}
