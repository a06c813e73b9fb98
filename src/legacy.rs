//! Legacy (BIOS compatibility) boot: the `BootC0DE` load option pointing at the firmware's
//! compatibility shim, and the one-shot `BootNext` that makes the firmware use it.

use alloc::string::String;
use alloc::vec::Vec;

use log::info;
use uefi::mem::memory_map::MemoryType;
use uefi::proto::device_path::build;
use uefi::runtime::{ResetType, VariableAttributes, VariableVendor};
use uefi::{cstr16, guid, CStr16, Guid, Status};

use crate::device_path::build_path;
use crate::error::{BootError, BootResult};
use crate::firmware::Firmware;
use crate::volume::{DiskKind, Volume};

pub const BOOT_OPTION_NUMBER: u16 = 0xC0DE;
pub const BOOT_OPTION_NAME: &CStr16 = cstr16!("BootC0DE");
pub const BOOT_NEXT_NAME: &CStr16 = cstr16!("BootNext");

/// Total length of the record.
pub const RECORD_LEN: usize = 0x4E;
/// Offset of the two-character disk tag.
pub const TAG_OFFSET: usize = 72;

const LOAD_OPTION_ACTIVE: u32 = 0x0000_0001;
const DESCRIPTION: &CStr16 = cstr16!("Mac OS X");

const SHIM_START: u64 = 0xFFE0_0000;
const SHIM_END: u64 = 0xFFF9_FFFF;
const SHIM_FILE: Guid = guid!("2b0585eb-d8b8-49a9-8b8c-e21b01aef2b7");

/// Which boot device the compatibility shim should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyTarget {
    HardDisk,
    CdRom,
}

impl LegacyTarget {
    pub fn for_disk(kind: DiskKind) -> Self {
        match kind {
            DiskKind::Optical => LegacyTarget::CdRom,
            _ => LegacyTarget::HardDisk,
        }
    }

    fn tag(self) -> &'static CStr16 {
        match self {
            LegacyTarget::HardDisk => cstr16!("HD"),
            LegacyTarget::CdRom => cstr16!("CD"),
        }
    }
}

fn variable_attributes() -> VariableAttributes {
    VariableAttributes::NON_VOLATILE
        | VariableAttributes::BOOTSERVICE_ACCESS
        | VariableAttributes::RUNTIME_ACCESS
}

/// The load option record: attributes, file path list length, description, the shim's
/// device path and the disk tag as optional data.
pub fn boot_record(target: LegacyTarget) -> BootResult<Vec<u8>> {
    let shim = build_path(&[
        &build::hardware::MemoryMapped {
            memory_type: MemoryType::MMIO,
            start_address: SHIM_START,
            end_address: SHIM_END,
        },
        &build::media::PiwgFirmwareFile {
            data: &SHIM_FILE.to_bytes(),
        },
    ])?;
    let file_path_list = shim.as_bytes();

    let list_len = u16::try_from(file_path_list.len())
        .map_err(|_| BootError::DevicePath(String::from("(shim path too long)")))?;

    let mut record = Vec::with_capacity(RECORD_LEN);
    record.extend_from_slice(&LOAD_OPTION_ACTIVE.to_le_bytes());
    record.extend_from_slice(&list_len.to_le_bytes());
    push_ucs2(&mut record, DESCRIPTION);
    record.extend_from_slice(file_path_list);
    push_ucs2(&mut record, target.tag());
    debug_assert_eq!(record.len(), RECORD_LEN);
    Ok(record)
}

fn push_ucs2(record: &mut Vec<u8>, text: &CStr16) {
    for unit in text.to_u16_slice_with_nul() {
        record.extend_from_slice(&unit.to_le_bytes());
    }
}

/// Persist the record for `volume`, select it for the next boot and warm-reset. Only
/// returns on failure.
pub fn persist_and_boot<F: Firmware>(firmware: &mut F, volume: &Volume) -> BootResult<()> {
    let target = LegacyTarget::for_disk(volume.disk_kind);
    let record = boot_record(target)?;
    info!("legacy boot of {} via {:?} record", volume.description(), target);

    firmware
        .set_variable(
            BOOT_OPTION_NAME,
            &VariableVendor::GLOBAL_VARIABLE,
            variable_attributes(),
            &record,
        )
        .map_err(|status| BootError::firmware(status, "while setting BootC0DE variable"))?;

    firmware
        .set_variable(
            BOOT_NEXT_NAME,
            &VariableVendor::GLOBAL_VARIABLE,
            variable_attributes(),
            &BOOT_OPTION_NUMBER.to_le_bytes(),
        )
        .map_err(|status| BootError::firmware(status, "while setting BootNext variable"))?;

    firmware.reset_system(ResetType::WARM);
    Err(BootError::firmware(Status::LOAD_ERROR, "when trying to reboot"))
}
