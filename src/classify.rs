//! Loader recognition and the per-kind boot option variants.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::menu::{BuiltinIcon, Icon};

pub const MACOSX_LOADER_PATH: &str = "\\System\\Library\\CoreServices\\boot.efi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    Generic,
    MacOs,
    Elilo,
    Xom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub icon: Icon,
    pub use_graphics_mode: bool,
    pub kind: LoaderKind,
    /// Fixed name the loader is known by, if any.
    pub implied_title: Option<&'static str>,
}

/// Recognise a loader by its full path or file name. Never rejects: unknown files come
/// back as [`LoaderKind::Generic`] with the unknown-OS icon.
pub fn classify(file_path: &str, file_name: &str) -> Classification {
    let (icon, use_graphics_mode, kind, implied_title) =
        if file_path.eq_ignore_ascii_case(MACOSX_LOADER_PATH) {
            (BuiltinIcon::OsMac, true, LoaderKind::MacOs, Some("Mac OS X"))
        } else if file_name.eq_ignore_ascii_case("diags.efi") {
            (BuiltinIcon::OsHwTest, false, LoaderKind::Generic, None)
        } else if file_name.eq_ignore_ascii_case("e.efi")
            || file_name.eq_ignore_ascii_case("elilo.efi")
        {
            (BuiltinIcon::OsLinux, false, LoaderKind::Elilo, None)
        } else if file_name.eq_ignore_ascii_case("Bootmgfw.efi") {
            (BuiltinIcon::OsWin, false, LoaderKind::Generic, None)
        } else if file_name.eq_ignore_ascii_case("xom.efi") {
            (BuiltinIcon::OsWin, true, LoaderKind::Xom, None)
        } else {
            (BuiltinIcon::OsUnknown, false, LoaderKind::Generic, None)
        };

    Classification {
        icon: Icon::Builtin(icon),
        use_graphics_mode,
        kind,
        implied_title,
    }
}

/// One boot option offered in a loader's submenu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub title: String,
    pub use_graphics_mode: bool,
    pub load_options: Option<&'static str>,
}

impl Variant {
    fn new(
        title: impl Into<String>,
        use_graphics_mode: bool,
        load_options: Option<&'static str>,
    ) -> Self {
        Self {
            title: title.into(),
            use_graphics_mode,
            load_options,
        }
    }
}

impl LoaderKind {
    /// Load options the top-level entry itself boots with.
    pub fn default_options(self) -> Option<&'static str> {
        match self {
            // skip xom's own picker and boot from the hard disk
            LoaderKind::Xom => Some("-s -h"),
            _ => None,
        }
    }

    /// Submenu variants in display order.
    pub fn variants(self, file_name: &str, graphics: bool) -> Vec<Variant> {
        match self {
            LoaderKind::Generic => {
                alloc::vec![Variant::new(format!("Run {}", file_name), graphics, None)]
            }
            LoaderKind::MacOs => alloc::vec![
                Variant::new("Boot Mac OS X", graphics, None),
                Variant::new("Boot Mac OS X in verbose mode", false, Some("-v")),
                Variant::new("Boot Mac OS X in single user mode", false, Some("-v -s")),
            ],
            LoaderKind::Elilo => alloc::vec![
                Variant::new(
                    format!("Run {} in interactive mode", file_name),
                    graphics,
                    Some("-p"),
                ),
                Variant::new(
                    "Boot Linux for a 17\" iMac or a 15\" MacBook Pro (*)",
                    true,
                    Some("-d 0 i17"),
                ),
                Variant::new("Boot Linux for a 20\" iMac (*)", true, Some("-d 0 i20")),
                Variant::new("Boot Linux for a Mac Mini (*)", true, Some("-d 0 mini")),
            ],
            LoaderKind::Xom => alloc::vec![
                Variant::new("Boot Windows from Hard Disk", graphics, Some("-s -h")),
                Variant::new("Boot Windows from CD-ROM", graphics, Some("-s -c")),
                Variant::new(format!("Run {} in text mode", file_name), false, Some("-v")),
            ],
        }
    }

    /// Informational lines shown after the variants.
    pub fn notes(self) -> &'static [&'static str] {
        match self {
            LoaderKind::Elilo => &[
                "NOTE: This is an example. Entries",
                "marked with (*) may not work.",
            ],
            _ => &[],
        }
    }
}
