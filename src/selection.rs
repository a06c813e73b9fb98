//! Menu navigation: which screen is shown, where the highlight is, and when a choice
//! leaves the menu.

use alloc::vec::Vec;

use log::debug;

use crate::firmware::{MenuEvent, Presenter};
use crate::menu::{MenuAction, MenuItem, MenuScreen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'m> {
    Dispatch(&'m MenuAction),
    Quit,
}

#[derive(Clone, Copy)]
struct Frame<'m> {
    screen: &'m MenuScreen,
    cursor: usize,
}

/// Stack of open screens with the main screen at the bottom. Survives across dispatches
/// so the user comes back to the screen the choice was made on.
pub struct MenuRunner<'m> {
    stack: Vec<Frame<'m>>,
    timeout_armed: bool,
}

impl<'m> MenuRunner<'m> {
    pub fn new(main: &'m MenuScreen) -> Self {
        Self {
            stack: alloc::vec![Frame { screen: main, cursor: 0 }],
            timeout_armed: main.timeout_seconds > 0,
        }
    }

    /// Number of open screens, 1 at the main screen.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current(&self) -> &'m MenuScreen {
        self.stack[self.stack.len() - 1].screen
    }

    fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Present screens until the user picks something to run or leaves.
    pub fn next<P: Presenter>(&mut self, presenter: &mut P) -> Selection<'m> {
        loop {
            let Some(frame) = self.stack.last().copied() else {
                return Selection::Quit;
            };
            let at_main = self.stack.len() == 1;
            let timeout = if at_main && self.timeout_armed {
                frame.screen.timeout_seconds
            } else {
                0
            };
            if at_main {
                self.timeout_armed = false;
            }

            let event = presenter.present(frame.screen, frame.cursor, timeout);
            debug!("menu '{}': {:?}", frame.screen.title, event);

            match event {
                MenuEvent::Escape => return Selection::Quit,
                MenuEvent::Return => self.pop(),
                MenuEvent::Timeout => {
                    if timeout == 0 {
                        continue;
                    }
                    if let Some(entry) = frame.screen.first_entry() {
                        return Selection::Dispatch(&entry.action);
                    }
                }
                MenuEvent::Activate(index) => match frame.screen.items.get(index) {
                    Some(MenuItem::Entry(entry)) => {
                        if let Some(top) = self.stack.last_mut() {
                            top.cursor = index;
                        }
                        match entry.submenu.as_deref() {
                            Some(submenu) => self.stack.push(Frame {
                                screen: submenu,
                                cursor: 0,
                            }),
                            None => return Selection::Dispatch(&entry.action),
                        }
                    }
                    Some(MenuItem::Return) => self.pop(),
                    Some(MenuItem::Info(_)) | None => {}
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BootError;
    use crate::menu::MenuEntry;
    use alloc::collections::VecDeque;
    use alloc::string::String;

    struct Script {
        events: VecDeque<MenuEvent>,
        shown: Vec<(String, usize, u32)>,
    }

    impl Script {
        fn new(events: &[MenuEvent]) -> Self {
            Self {
                events: events.iter().copied().collect(),
                shown: Vec::new(),
            }
        }
    }

    impl Presenter for Script {
        fn present(&mut self, screen: &MenuScreen, cursor: usize, timeout: u32) -> MenuEvent {
            self.shown.push((screen.title.clone(), cursor, timeout));
            self.events.pop_front().unwrap_or(MenuEvent::Escape)
        }
        fn begin_external(&mut self, _: bool, _: &str) {}
        fn finish_external(&mut self) {}
        fn report_error(&mut self, _: &BootError) {}
        fn acknowledge_errors(&mut self, _: &[BootError]) {}
        fn terminate(&mut self) {}
    }

    fn tree() -> MenuScreen {
        let mut sub = MenuScreen::new("Sub");
        sub.add_entry(MenuEntry::new("Variant", MenuAction::About));
        sub.add_info("info");
        sub.add_return();

        let mut main = MenuScreen::new("Main");
        main.timeout_seconds = 20;
        main.add_entry(MenuEntry::new("Loader", MenuAction::Reset).with_submenu(sub));
        main.add_entry(MenuEntry::new("Exit", MenuAction::Exit));
        main
    }

    #[test]
    fn timeout_dispatches_first_entry() {
        let main = tree();
        let mut runner = MenuRunner::new(&main);
        let mut script = Script::new(&[MenuEvent::Timeout]);
        assert_eq!(runner.next(&mut script), Selection::Dispatch(&MenuAction::Reset));
        assert_eq!(script.shown, [(String::from("Main"), 0, 20)]);
    }

    #[test]
    fn timeout_is_only_offered_once() {
        let main = tree();
        let mut runner = MenuRunner::new(&main);
        let mut script = Script::new(&[
            MenuEvent::Activate(0),
            MenuEvent::Return,
            MenuEvent::Timeout,
            MenuEvent::Activate(1),
        ]);
        assert_eq!(runner.next(&mut script), Selection::Dispatch(&MenuAction::Exit));
        let timeouts: Vec<u32> = script.shown.iter().map(|s| s.2).collect();
        assert_eq!(timeouts, [20, 0, 0, 0]);
    }

    #[test]
    fn submenu_choice_and_info_lines() {
        let main = tree();
        let mut runner = MenuRunner::new(&main);
        let mut script = Script::new(&[
            MenuEvent::Activate(0),
            MenuEvent::Activate(1),
            MenuEvent::Activate(7),
            MenuEvent::Activate(0),
        ]);
        assert_eq!(runner.next(&mut script), Selection::Dispatch(&MenuAction::About));
        assert_eq!(runner.depth(), 2);
        assert_eq!(runner.current().title, "Sub");
    }

    #[test]
    fn return_never_pops_main() {
        let main = tree();
        let mut runner = MenuRunner::new(&main);
        let mut script = Script::new(&[
            MenuEvent::Return,
            MenuEvent::Return,
            MenuEvent::Activate(0),
            MenuEvent::Activate(2),
            MenuEvent::Escape,
        ]);
        assert_eq!(runner.next(&mut script), Selection::Quit);
        let titles: Vec<&str> = script.shown.iter().map(|s| s.0.as_str()).collect();
        assert_eq!(titles, ["Main", "Main", "Main", "Sub", "Main"]);
        assert_eq!(script.shown[4].1, 0);
    }
}
