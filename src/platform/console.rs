use core::fmt::Write;

use log::debug;
use uefi::proto::console::text::{Key, ScanCode};

use crate::error::BootError;
use crate::firmware::{MenuEvent, Presenter};
use crate::menu::{MenuItem, MenuScreen};

const POLL_STALL_US: usize = 10_000;
const TICKS_PER_SECOND: u32 = 100;

#[derive(Clone, Copy)]
enum InputEvent {
    Up,
    Down,
    Home,
    End,
    Enter,
    Back,
    Escape,
    Other,
}

fn poll_input_event() -> Option<InputEvent> {
    uefi::system::with_stdin(|input| match input.read_key().ok().flatten() {
        Some(Key::Printable(c16)) => {
            let ch: char = c16.into();
            Some(match ch {
                '\r' | '\n' | ' ' => InputEvent::Enter,
                '\u{8}' => InputEvent::Back,
                _ => InputEvent::Other,
            })
        }
        Some(Key::Special(ScanCode::UP)) => Some(InputEvent::Up),
        Some(Key::Special(ScanCode::DOWN)) => Some(InputEvent::Down),
        Some(Key::Special(ScanCode::HOME)) => Some(InputEvent::Home),
        Some(Key::Special(ScanCode::END)) => Some(InputEvent::End),
        Some(Key::Special(ScanCode::ESCAPE)) => Some(InputEvent::Escape),
        Some(Key::Special(_)) => Some(InputEvent::Other),
        None => None,
    })
}

fn println(msg: &str) {
    uefi::system::with_stdout(|out| {
        let _ = writeln!(out, "{}", msg);
    });
}

fn clear_screen() {
    uefi::system::with_stdout(|out| {
        let _ = out.clear();
    });
}

fn wait_for_key() {
    loop {
        if poll_input_event().is_some() {
            return;
        }
        uefi::boot::stall(POLL_STALL_US);
    }
}

fn selectable(item: &MenuItem) -> bool {
    !matches!(item, MenuItem::Info(_))
}

/// Menu on the firmware text console, driven by the arrow keys.
#[derive(Default)]
pub struct TextPresenter {
    in_external: bool,
    pending_ack: bool,
}

impl TextPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn draw(&self, screen: &MenuScreen, cursor: usize) {
        clear_screen();
        println(&alloc::format!(" {}", screen.title));
        println("");
        for (index, item) in screen.items.iter().enumerate() {
            let line = match item {
                MenuItem::Info(text) => alloc::format!("     {}", text),
                _ if index == cursor => alloc::format!("  > {}", item.title()),
                _ => alloc::format!("    {}", item.title()),
            };
            println(&line);
        }
        println("");
    }

    fn step(screen: &MenuScreen, cursor: usize, forward: bool) -> usize {
        let count = screen.items.len();
        let mut next = cursor;
        loop {
            next = match (forward, next) {
                (true, n) if n + 1 < count => n + 1,
                (false, n) if n > 0 => n - 1,
                _ => return cursor,
            };
            if selectable(&screen.items[next]) {
                return next;
            }
        }
    }
}

impl Presenter for TextPresenter {
    fn present(&mut self, screen: &MenuScreen, cursor: usize, timeout_seconds: u32) -> MenuEvent {
        let mut cursor = if screen.items.get(cursor).is_some_and(selectable) {
            cursor
        } else {
            Self::step(screen, cursor, true)
        };
        let mut remaining = timeout_seconds.saturating_mul(TICKS_PER_SECOND);
        let label = screen.timeout_label.as_deref().unwrap_or("Automatic boot");

        self.draw(screen, cursor);
        loop {
            if remaining > 0 && remaining % TICKS_PER_SECOND == 0 {
                uefi::system::with_stdout(|out| {
                    let _ = write!(out, "\r {} in {}s  ", label, remaining / TICKS_PER_SECOND);
                });
            }

            if let Some(event) = poll_input_event() {
                remaining = 0;
                match event {
                    InputEvent::Up => cursor = Self::step(screen, cursor, false),
                    InputEvent::Down => cursor = Self::step(screen, cursor, true),
                    InputEvent::Home => {
                        cursor = screen.items.iter().position(selectable).unwrap_or(cursor)
                    }
                    InputEvent::End => {
                        cursor = screen.items.iter().rposition(selectable).unwrap_or(cursor)
                    }
                    InputEvent::Enter => return MenuEvent::Activate(cursor),
                    InputEvent::Back => return MenuEvent::Return,
                    InputEvent::Escape => {
                        return if screen.items.contains(&MenuItem::Return) {
                            MenuEvent::Return
                        } else {
                            MenuEvent::Escape
                        };
                    }
                    InputEvent::Other => {}
                }
                self.draw(screen, cursor);
                continue;
            }

            if remaining > 0 {
                remaining -= 1;
                if remaining == 0 {
                    return MenuEvent::Timeout;
                }
            }
            uefi::boot::stall(POLL_STALL_US);
        }
    }

    fn begin_external(&mut self, use_graphics_mode: bool, title: &str) {
        debug!("external screen '{}' (graphics={})", title, use_graphics_mode);
        clear_screen();
        println(&alloc::format!(" {}", title));
        println("");
        self.in_external = true;
    }

    fn finish_external(&mut self) {
        self.in_external = false;
        if self.pending_ack {
            println("");
            println("Press any key to continue.");
            wait_for_key();
            self.pending_ack = false;
        }
    }

    fn report_error(&mut self, error: &BootError) {
        println(&alloc::format!("{}", error));
        if self.in_external {
            self.pending_ack = true;
        } else {
            println("Press any key to continue.");
            wait_for_key();
        }
    }

    fn acknowledge_errors(&mut self, errors: &[BootError]) {
        clear_screen();
        for error in errors {
            println(&alloc::format!("{}", error));
        }
        println("");
        println("Press any key to continue.");
        wait_for_key();
    }

    fn terminate(&mut self) {
        clear_screen();
    }
}
