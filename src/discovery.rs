//! Building the main menu from what the volumes contain.
//!
//! Entries are appended in scan order, which is also display order: per volume the
//! well-known loaders, then the generic directory scans, then the hardware test; after all
//! volumes the legacy volumes, the tools and the fixed entries.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, info, warn};
use uefi::Status;

use crate::classify::{classify, MACOSX_LOADER_PATH};
use crate::device_path::file_device_path;
use crate::error::{BootError, BootResult};
use crate::firmware::Firmware;
use crate::menu::{BuiltinIcon, Icon, LoaderAction, MenuAction, MenuEntry, MenuScreen, ToolAction};
use crate::path;
use crate::volume::Volume;

pub const XOM_LOADER_PATH: &str = "\\System\\Library\\CoreServices\\xom.efi";
pub const MICROSOFT_LOADER_PATH: &str = "\\EFI\\Microsoft\\Boot\\Bootmgfw.efi";
pub const DIAGS_LOADER_PATH: &str = "\\System\\Library\\CoreServices\\.diagnostics\\diags.efi";

/// Helpers that live next to real loaders but do not boot anything.
const EXCLUDED_FILES: [&str; 3] = ["TextMode.efi", "ebounce.efi", "GraphicsConsole.efi"];

/// `\EFI` subdirectories that are never scanned, besides dot-directories.
const EXCLUDED_EFI_DIRS: [&str; 3] = ["TOOLS", "REFIT", "REFITL"];

const LOADER_PATTERN: &str = "*.efi";
const LEGACY_TITLE: &str = "Legacy OS";
const SHELL_TITLE: &str = "EFI Shell";
const SHELL_FALLBACK_PATH: &str = "\\efi\\tools\\shell.efi";

/// Walks volumes and appends entries to a menu, collecting non-fatal errors on the way.
pub struct Scanner<'f, F: Firmware> {
    firmware: &'f F,
    errors: Vec<BootError>,
}

impl<'f, F: Firmware> Scanner<'f, F> {
    pub fn new(firmware: &'f F) -> Self {
        Self {
            firmware,
            errors: Vec::new(),
        }
    }

    pub fn into_errors(self) -> Vec<BootError> {
        self.errors
    }

    fn record(&mut self, error: BootError) {
        warn!("{}", error);
        self.errors.push(error);
    }

    pub fn scan_loaders(&mut self, volumes: &[Volume], menu: &mut MenuScreen) {
        info!("Scanning for boot loaders...");

        for volume in volumes {
            if !volume.is_scannable() {
                debug!("skipping volume {:?}: not mounted or unnamed", volume.id);
                continue;
            }

            for (loader_path, title) in [
                (MACOSX_LOADER_PATH, "Mac OS X"),
                (XOM_LOADER_PATH, "Windows XP (XoM)"),
                (MICROSOFT_LOADER_PATH, "Microsoft boot menu"),
            ] {
                if self.firmware.file_exists(volume, loader_path) {
                    debug!("  - {} found on {}", title, volume.description());
                    self.add_loader(volume, loader_path, Some(title), menu);
                }
            }

            self.scan_dir(volume, "", menu);
            self.scan_dir(volume, "elilo", menu);
            self.scan_dir(volume, "boot", menu);
            self.scan_efi_dir(volume, menu);

            if self.firmware.file_exists(volume, DIAGS_LOADER_PATH) {
                debug!("  - Apple Hardware Test found on {}", volume.description());
                self.add_loader(volume, DIAGS_LOADER_PATH, Some("Apple Hardware Test"), menu);
            }
        }
    }

    /// One entry per `*.efi` file directly inside `dir` (root-relative, empty for the root).
    fn scan_dir(&mut self, volume: &Volume, dir: &str, menu: &mut MenuScreen) {
        let dir_path = path::absolute_dir(dir);
        let entries = match self.firmware.list_dir(volume, &dir_path, Some(LOADER_PATTERN)) {
            Ok(entries) => entries,
            Err(Status::NOT_FOUND) => return,
            Err(status) => {
                let context = if dir.is_empty() {
                    String::from("while scanning the root directory")
                } else {
                    format!("while scanning the {} directory", dir)
                };
                self.record(BootError::firmware(status, context));
                return;
            }
        };

        for entry in entries {
            if entry.is_dir {
                continue;
            }
            if EXCLUDED_FILES
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(&entry.name))
            {
                debug!("  - skipping helper {}", entry.name);
                continue;
            }
            let loader_path = path::join(dir, &entry.name);
            self.add_loader(volume, &loader_path, None, menu);
        }
    }

    fn scan_efi_dir(&mut self, volume: &Volume, menu: &mut MenuScreen) {
        let entries = match self.firmware.list_dir(volume, "\\EFI", None) {
            Ok(entries) => entries,
            Err(Status::NOT_FOUND) => return,
            Err(status) => {
                self.record(BootError::firmware(status, "while scanning the EFI directory"));
                return;
            }
        };

        for entry in entries.iter().filter(|entry| entry.is_dir) {
            if entry.name.starts_with('.')
                || EXCLUDED_EFI_DIRS
                    .iter()
                    .any(|excluded| excluded.eq_ignore_ascii_case(&entry.name))
            {
                continue;
            }
            debug!("  - Directory EFI\\{} found", entry.name);
            self.scan_dir(volume, &format!("EFI\\{}", entry.name), menu);
        }
    }

    fn add_loader(
        &mut self,
        volume: &Volume,
        loader_path: &str,
        title: Option<&str>,
        menu: &mut MenuScreen,
    ) {
        match self.loader_entry(volume, loader_path, title) {
            Ok(entry) => menu.add_entry(entry),
            Err(err) => self.record(err),
        }
    }

    fn loader_entry(
        &self,
        volume: &Volume,
        loader_path: &str,
        title: Option<&str>,
    ) -> BootResult<MenuEntry> {
        let file_name = path::basename(loader_path);
        let volume_name = volume.description();
        let device_address = file_device_path(volume.device_path.as_device_path(), loader_path)?;
        let class = classify(loader_path, file_name);

        let icon_path = path::replace_extension(loader_path, ".icns");
        let icon = if self.firmware.file_exists(volume, &icon_path) {
            Icon::File(icon_path)
        } else {
            class.icon.clone()
        };

        let action = |use_graphics_mode: bool, load_options: Option<&str>| {
            MenuAction::Loader(LoaderAction {
                loader_path: String::from(loader_path),
                volume: volume.id,
                volume_name: String::from(volume_name),
                device_address: device_address.clone(),
                use_graphics_mode,
                load_options: load_options.map(String::from),
            })
        };

        let mut submenu = MenuScreen::new(format!(
            "Boot Options for {} on {}",
            title.unwrap_or(file_name),
            volume_name
        ));
        submenu.title_image = Some(icon.clone());
        for variant in class.kind.variants(file_name, class.use_graphics_mode) {
            submenu.add_entry(MenuEntry::new(
                variant.title,
                action(variant.use_graphics_mode, variant.load_options),
            ));
        }
        for note in class.kind.notes() {
            submenu.add_info(*note);
        }
        submenu.add_return();

        let shown_path = loader_path.strip_prefix('\\').unwrap_or(loader_path);
        Ok(MenuEntry::new(
            format!("Boot {} from {}", title.unwrap_or(shown_path), volume_name),
            action(class.use_graphics_mode, class.kind.default_options()),
        )
        .with_icon(icon)
        .with_badge(volume.badge.clone())
        .with_submenu(submenu))
    }

    /// One entry per legacy-bootable volume, named or not.
    pub fn scan_legacy(&mut self, volumes: &[Volume], menu: &mut MenuScreen) {
        info!("Scanning for legacy boot volumes...");

        for volume in volumes.iter().filter(|volume| volume.is_legacy) {
            let description = volume.description();
            let icon = Icon::Builtin(BuiltinIcon::OsLegacy);
            let action = MenuAction::Legacy { volume: volume.id };

            let mut submenu =
                MenuScreen::new(format!("Boot Options for {} on {}", LEGACY_TITLE, description));
            submenu.title_image = Some(icon.clone());
            submenu.add_entry(MenuEntry::new(format!("Boot {}", LEGACY_TITLE), action.clone()));
            submenu.add_return();

            menu.add_entry(
                MenuEntry::new(format!("Boot {} from {}", LEGACY_TITLE, description), action)
                    .with_icon(icon)
                    .with_badge(volume.badge.clone())
                    .with_submenu(submenu),
            );
        }
    }

    /// Tools on the manager's own volume; `self_dir` is the directory it was loaded from.
    pub fn scan_tools(&mut self, self_volume: &Volume, self_dir: &str, menu: &mut MenuScreen) {
        info!("Scanning for tools...");

        let bundled = format!("{}\\apps\\shell.efi", self_dir.trim_end_matches('\\'));
        let shell = [bundled.as_str(), SHELL_FALLBACK_PATH]
            .into_iter()
            .find(|candidate| self.firmware.file_exists(self_volume, candidate));

        if let Some(shell) = shell {
            match tool_entry(self_volume, shell, SHELL_TITLE, BuiltinIcon::ToolShell) {
                Ok(entry) => menu.add_entry(entry),
                Err(err) => self.record(err),
            }
        }
    }
}

fn tool_entry(
    self_volume: &Volume,
    tool_path: &str,
    title: &str,
    icon: BuiltinIcon,
) -> BootResult<MenuEntry> {
    let device_address = file_device_path(self_volume.device_path.as_device_path(), tool_path)?;
    Ok(MenuEntry::new(
        format!("Start {}", title),
        MenuAction::Tool(ToolAction {
            tool_path: String::from(tool_path),
            title: String::from(title),
            device_address,
            use_graphics_mode: false,
        }),
    )
    .with_row(1)
    .with_icon(Icon::Builtin(icon)))
}

/// Entries every main menu ends with.
pub fn add_fixed_entries(menu: &mut MenuScreen) {
    for (title, action, icon) in [
        ("About rEFIt", MenuAction::About, BuiltinIcon::FuncAbout),
        ("Exit to built-in Boot Manager", MenuAction::Exit, BuiltinIcon::FuncExit),
        ("Restart Computer", MenuAction::Reset, BuiltinIcon::FuncReset),
    ] {
        menu.add_entry(
            MenuEntry::new(title, action)
                .with_row(1)
                .with_icon(Icon::Builtin(icon)),
        );
    }
}
