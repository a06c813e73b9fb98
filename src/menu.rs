//! Menu tree: screens of entries, each entry carrying exactly one action and optionally a
//! screen of variants.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::device_path::DeviceAddress;
use crate::volume::VolumeId;

/// Title of the entry closing every submenu.
pub const RETURN_TITLE: &str = "Return to Main Menu";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinIcon {
    OsMac,
    OsLinux,
    OsWin,
    OsUnknown,
    OsHwTest,
    OsLegacy,
    ToolShell,
    FuncAbout,
    FuncExit,
    FuncReset,
    VolInternal,
    VolExternal,
    VolOptical,
}

/// Image reference handed to the presenter; decoding is the presenter's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icon {
    Builtin(BuiltinIcon),
    /// `.icns` file on the entry's own volume.
    File(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderAction {
    pub loader_path: String,
    pub volume: VolumeId,
    /// Volume name at discovery time, for error messages.
    pub volume_name: String,
    pub device_address: DeviceAddress,
    pub use_graphics_mode: bool,
    pub load_options: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolAction {
    pub tool_path: String,
    /// Tool name without the "Start " prefix, used as the external screen title.
    pub title: String,
    pub device_address: DeviceAddress,
    pub use_graphics_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Exit,
    Reset,
    About,
    Loader(LoaderAction),
    Legacy { volume: VolumeId },
    Tool(ToolAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub title: String,
    pub action: MenuAction,
    /// Grouping hint; lower rows are drawn first.
    pub row: u8,
    pub icon: Option<Icon>,
    pub badge: Option<Icon>,
    pub submenu: Option<Box<MenuScreen>>,
}

impl MenuEntry {
    pub fn new(title: impl Into<String>, action: MenuAction) -> Self {
        Self {
            title: title.into(),
            action,
            row: 0,
            icon: None,
            badge: None,
            submenu: None,
        }
    }

    pub fn with_row(mut self, row: u8) -> Self {
        self.row = row;
        self
    }

    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_badge(mut self, badge: Option<Icon>) -> Self {
        self.badge = badge;
        self
    }

    pub fn with_submenu(mut self, submenu: MenuScreen) -> Self {
        self.submenu = Some(Box::new(submenu));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Entry(MenuEntry),
    /// Non-selectable text line.
    Info(String),
    /// Pops back to the parent screen.
    Return,
}

impl MenuItem {
    pub fn title(&self) -> &str {
        match self {
            MenuItem::Entry(entry) => &entry.title,
            MenuItem::Info(text) => text,
            MenuItem::Return => RETURN_TITLE,
        }
    }

    pub fn as_entry(&self) -> Option<&MenuEntry> {
        match self {
            MenuItem::Entry(entry) => Some(entry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuScreen {
    pub title: String,
    pub title_image: Option<Icon>,
    /// Display order.
    pub items: Vec<MenuItem>,
    /// Seconds before the first entry is chosen automatically; 0 waits forever.
    pub timeout_seconds: u32,
    pub timeout_label: Option<String>,
}

impl MenuScreen {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            title_image: None,
            items: Vec::new(),
            timeout_seconds: 0,
            timeout_label: None,
        }
    }

    pub fn add_entry(&mut self, entry: MenuEntry) {
        self.items.push(MenuItem::Entry(entry));
    }

    pub fn add_info(&mut self, line: impl Into<String>) {
        self.items.push(MenuItem::Info(line.into()));
    }

    pub fn add_return(&mut self) {
        self.items.push(MenuItem::Return);
    }

    pub fn entries(&self) -> impl Iterator<Item = &MenuEntry> {
        self.items.iter().filter_map(MenuItem::as_entry)
    }

    pub fn first_entry(&self) -> Option<&MenuEntry> {
        self.entries().next()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.items.iter().map(MenuItem::title).collect()
    }
}

/// Static screen behind the "About rEFIt" entry.
pub fn about_screen() -> MenuScreen {
    let mut screen = MenuScreen::new("About");
    screen.title_image = Some(Icon::Builtin(BuiltinIcon::FuncAbout));
    screen.add_info(alloc::format!("rEFIt Version {}", env!("CARGO_PKG_VERSION")));
    screen.add_info("");
    screen.add_info("Copyright (c) 2006 Christoph Pfisterer");
    screen.add_info("Portions Copyright (c) Intel Corporation and others");
    screen.add_return();
    screen
}
