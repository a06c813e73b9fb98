use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use uefi::boot::{self, LoadImageSource, ScopedProtocol};
use uefi::proto::loaded_image::LoadedImage;
use uefi::proto::string::unicode_collation::UnicodeCollation;
use uefi::proto::media::file::{Directory, File, FileAttribute, FileInfo, FileMode, RegularFile};
use uefi::proto::BootPolicy;
use uefi::runtime::{self, ResetType, VariableAttributes, VariableVendor};
use uefi::{CStr16, CString16, Handle, Status};

use super::{get_protocol, volumes};
use crate::device_path::{self, DeviceAddress};
use crate::firmware::{DirEntry, Firmware, SelfImage};
use crate::path;
use crate::volume::Volume;

/// Boot and runtime services of the running firmware.
#[derive(Default)]
pub struct UefiFirmware {
    /// Block device handles, indexed by volume id.
    handles: Vec<Handle>,
}

impl UefiFirmware {
    pub fn new() -> Self {
        Self::default()
    }

    fn root(&self, volume: &Volume) -> Result<Directory, Status> {
        let handle = self.handles.get(volume.id.0).copied().ok_or(Status::NOT_FOUND)?;
        volumes::open_root(handle).ok_or(Status::NO_MEDIA)
    }
}

fn wide(path: &str) -> Result<CString16, Status> {
    CString16::try_from(path).map_err(|_| Status::INVALID_PARAMETER)
}

fn open_regular(root: &mut Directory, path: &str) -> Result<RegularFile, Status> {
    let handle = root
        .open(&wide(path)?, FileMode::Read, FileAttribute::empty())
        .map_err(|err| err.status())?;
    handle.into_regular_file().ok_or(Status::INVALID_PARAMETER)
}

/// File name filter for directory listings. Uses the firmware's collation when it has
/// one, the built-in matcher otherwise.
struct NameMatcher {
    pattern: String,
    wide_pattern: CString16,
    collation: Option<ScopedProtocol<UnicodeCollation>>,
}

impl NameMatcher {
    fn new(pattern: &str) -> Result<Self, Status> {
        let collation = boot::get_handle_for_protocol::<UnicodeCollation>()
            .and_then(get_protocol::<UnicodeCollation>)
            .ok();
        Ok(Self {
            pattern: String::from(pattern),
            wide_pattern: wide(pattern)?,
            collation,
        })
    }

    fn matches(&self, wide_name: &CStr16, name: &str) -> bool {
        match &self.collation {
            Some(collation) => collation.metai_match(wide_name, &self.wide_pattern),
            None => path::glob_match(&self.pattern, name),
        }
    }
}

impl Firmware for UefiFirmware {
    type Image = Handle;

    fn scan_volumes(&mut self) -> Vec<Volume> {
        let (handles, volumes) = volumes::enumerate();
        self.handles = handles;
        volumes
    }

    fn self_image(&self) -> Result<SelfImage, Status> {
        let loaded = boot::open_protocol_exclusive::<LoadedImage>(boot::image_handle())
            .map_err(|err| err.status())?;
        let device = loaded.device().ok_or(Status::NOT_FOUND)?;
        let index = self
            .handles
            .iter()
            .position(|handle| *handle == device)
            .ok_or(Status::NOT_FOUND)?;
        let file_path = loaded.file_path().ok_or(Status::NOT_FOUND)?;
        let path = device_path::file_path_text(file_path);

        Ok(SelfImage {
            volume: crate::volume::VolumeId(index),
            path,
        })
    }

    fn file_exists(&self, volume: &Volume, path: &str) -> bool {
        match self.root(volume) {
            Ok(mut root) => volumes::exists(&mut root, path),
            Err(_) => false,
        }
    }

    fn list_dir(
        &self,
        volume: &Volume,
        path: &str,
        pattern: Option<&str>,
    ) -> Result<Vec<DirEntry>, Status> {
        let matcher = pattern.map(NameMatcher::new).transpose()?;
        let mut root = self.root(volume)?;
        let handle = root
            .open(&wide(path)?, FileMode::Read, FileAttribute::empty())
            .map_err(|err| err.status())?;
        let mut dir = handle.into_directory().ok_or(Status::NOT_FOUND)?;

        let mut entries = Vec::new();
        loop {
            let info: Option<Box<FileInfo>> = dir.read_entry_boxed().map_err(|err| err.status())?;
            let Some(info) = info else {
                break;
            };
            let name = String::from(info.file_name());
            if name == "." || name == ".." {
                continue;
            }
            let is_dir = info.is_directory();
            if let Some(matcher) = &matcher {
                if is_dir || !matcher.matches(info.file_name(), &name) {
                    continue;
                }
            }
            entries.push(DirEntry { name, is_dir });
        }
        Ok(entries)
    }

    fn read_file(&self, volume: &Volume, path: &str) -> Result<Vec<u8>, Status> {
        let mut root = self.root(volume)?;
        let mut file = open_regular(&mut root, path)?;
        let info = file.get_boxed_info::<FileInfo>().map_err(|err| err.status())?;
        let mut data = alloc::vec![0u8; info.file_size() as usize];
        let read = file.read(&mut data).map_err(|err| err.status())?;
        data.truncate(read);
        Ok(data)
    }

    fn load_image(&mut self, address: &DeviceAddress) -> Result<Handle, Status> {
        boot::load_image(
            boot::image_handle(),
            LoadImageSource::FromDevicePath {
                device_path: address.as_device_path(),
                boot_policy: BootPolicy::ExactMatch,
            },
        )
        .map_err(|err| err.status())
    }

    fn set_load_options(&mut self, image: Handle, options: &CStr16) -> Result<(), Status> {
        let mut loaded =
            boot::open_protocol_exclusive::<LoadedImage>(image).map_err(|err| err.status())?;
        let size = u32::try_from(core::mem::size_of_val(options.as_slice_with_nul()))
            .map_err(|_| Status::BAD_BUFFER_SIZE)?;
        // SAFETY: the caller keeps `options` alive until the image has been started.
        unsafe {
            loaded.set_load_options(options.as_ptr().cast::<u8>(), size);
        }
        Ok(())
    }

    fn start_image(&mut self, image: Handle) -> Result<(), Status> {
        boot::start_image(image).map_err(|err| err.status())
    }

    fn unload_image(&mut self, image: Handle) -> Result<(), Status> {
        boot::unload_image(image).map_err(|err| err.status())
    }

    fn set_variable(
        &mut self,
        name: &CStr16,
        vendor: &VariableVendor,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> Result<(), Status> {
        runtime::set_variable(name, vendor, attributes, data).map_err(|err| err.status())
    }

    fn reset_system(&mut self, kind: ResetType) {
        runtime::reset(kind, Status::SUCCESS, None);
    }
}
