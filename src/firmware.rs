//! The two seams between the boot manager and the machine: firmware primitives and the
//! menu presentation service. The `uefi` implementations live in `platform`; tests drive
//! the core through in-memory ones.

use alloc::string::String;
use alloc::vec::Vec;

use uefi::runtime::{ResetType, VariableAttributes, VariableVendor};
use uefi::{CStr16, Status};

use crate::device_path::DeviceAddress;
use crate::error::BootError;
use crate::menu::MenuScreen;
use crate::volume::{Volume, VolumeId};

/// Where the manager itself was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfImage {
    pub volume: VolumeId,
    /// Absolute path of the manager's executable, e.g. `\EFI\refit\refit.efi`.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

pub trait Firmware {
    /// Handle of a loaded child image.
    type Image: Copy;

    /// Every volume the firmware exposes, in enumeration order.
    fn scan_volumes(&mut self) -> Vec<Volume>;

    fn self_image(&self) -> Result<SelfImage, Status>;

    fn file_exists(&self, volume: &Volume, path: &str) -> bool;

    /// Entries of the directory at absolute `path`, without `.` and `..`. With a
    /// `pattern` (`*` and `?`, case-insensitive) only files whose names match it are
    /// returned. `Err(Status::NOT_FOUND)` means the directory does not exist.
    fn list_dir(
        &self,
        volume: &Volume,
        path: &str,
        pattern: Option<&str>,
    ) -> Result<Vec<DirEntry>, Status>;

    fn read_file(&self, volume: &Volume, path: &str) -> Result<Vec<u8>, Status>;

    fn load_image(&mut self, address: &DeviceAddress) -> Result<Self::Image, Status>;

    /// Attach `options` to the image's invocation record. The firmware keeps a pointer
    /// to the buffer, so it must stay alive until the image has been started.
    fn set_load_options(&mut self, image: Self::Image, options: &CStr16) -> Result<(), Status>;

    /// Runs the image; returns once it exits.
    fn start_image(&mut self, image: Self::Image) -> Result<(), Status>;

    fn unload_image(&mut self, image: Self::Image) -> Result<(), Status>;

    fn set_variable(
        &mut self,
        name: &CStr16,
        vendor: &VariableVendor,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> Result<(), Status>;

    /// Does not return on real hardware. Returning at all means the reset failed.
    fn reset_system(&mut self, kind: ResetType);
}

/// Navigation event produced by presenting a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    /// The item at this index of the screen was chosen.
    Activate(usize),
    /// Back to the parent screen.
    Return,
    /// The screen's timeout ran out.
    Timeout,
    /// Leave the boot manager.
    Escape,
}

pub trait Presenter {
    /// Show `screen` with the highlight on `cursor` and block for one event.
    /// `timeout_seconds` of 0 waits forever.
    fn present(&mut self, screen: &MenuScreen, cursor: usize, timeout_seconds: u32) -> MenuEvent;

    /// Hand the display over to a child image or a status screen.
    fn begin_external(&mut self, use_graphics_mode: bool, title: &str);

    fn finish_external(&mut self);

    fn report_error(&mut self, error: &BootError);

    /// Show errors collected while scanning and wait for the user to confirm them.
    fn acknowledge_errors(&mut self, errors: &[BootError]);

    /// Restore the console before the manager goes away.
    fn terminate(&mut self);
}
