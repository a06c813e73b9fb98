use alloc::string::String;
use alloc::vec::Vec;

use log::debug;
use uefi::boot;
use uefi::proto::device_path::DevicePath;
use uefi::proto::media::block::BlockIO;
use uefi::proto::media::file::{Directory, File, FileAttribute, FileMode, FileSystemVolumeLabel};
use uefi::proto::media::fs::SimpleFileSystem;
use uefi::Handle;

use super::get_protocol;
use crate::device_path::{build_path, DeviceAddress};
use crate::menu::Icon;
use crate::volume::{
    is_el_torito_record, is_legacy_boot_sector, DiskKind, Volume, VolumeId, EL_TORITO_SECTOR,
};

const VOLUME_BADGE_PATH: &str = "\\.VolumeBadge.icns";

/// Every block device, in firmware order. The returned handles line up with the volume
/// ids.
pub fn enumerate() -> (Vec<Handle>, Vec<Volume>) {
    let handles = boot::find_handles::<BlockIO>().unwrap_or_default();
    let mut volumes = Vec::with_capacity(handles.len());

    for (index, handle) in handles.iter().copied().enumerate() {
        let (device_path, disk_kind) = match get_protocol::<DevicePath>(handle) {
            Ok(path) => (DeviceAddress::new(&path), DiskKind::from_device_path(&path)),
            Err(_) => match build_path(&[]) {
                Ok(empty) => (empty, DiskKind::Other),
                Err(_) => continue,
            },
        };
        let is_legacy = detect_legacy(handle);

        let mut root = open_root(handle);
        let name = root.as_mut().and_then(volume_label);
        let badge = match root.as_mut() {
            Some(root) if exists(root, VOLUME_BADGE_PATH) => {
                Some(Icon::File(String::from(VOLUME_BADGE_PATH)))
            }
            _ => Some(disk_kind.badge()),
        };

        debug!(
            "volume {}: {:?} {:?} legacy={} root={}",
            index,
            name,
            disk_kind,
            is_legacy,
            root.is_some()
        );

        volumes.push(Volume {
            id: VolumeId(index),
            device_path,
            has_root: root.is_some(),
            name,
            disk_kind,
            is_legacy,
            badge,
        });
    }

    (handles, volumes)
}

pub fn open_root(handle: Handle) -> Option<Directory> {
    let mut fs = get_protocol::<SimpleFileSystem>(handle).ok()?;
    fs.open_volume().ok()
}

pub fn exists(root: &mut Directory, path: &str) -> bool {
    let Ok(path) = uefi::CString16::try_from(path) else {
        return false;
    };
    root.open(&path, FileMode::Read, FileAttribute::empty()).is_ok()
}

fn volume_label(root: &mut Directory) -> Option<String> {
    let label = root.get_boxed_info::<FileSystemVolumeLabel>().ok()?;
    let label = String::from(label.volume_label());
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// Whole-disk media with a BIOS boot sector, or a CD with an El Torito boot record.
fn detect_legacy(handle: Handle) -> bool {
    let Ok(block) = get_protocol::<BlockIO>(handle) else {
        return false;
    };
    let media = block.media();
    if media.is_logical_partition() || !media.is_media_present() {
        return false;
    }

    let block_size = media.block_size() as usize;
    if block_size < 512 {
        return false;
    }
    let mut sector = alloc::vec![0u8; block_size];

    if block.read_blocks(media.media_id(), 0, &mut sector).is_ok()
        && is_legacy_boot_sector(&sector)
    {
        return true;
    }
    if block_size == 2048
        && block
            .read_blocks(media.media_id(), EL_TORITO_SECTOR, &mut sector)
            .is_ok()
    {
        return is_el_torito_record(&sector);
    }
    false
}
