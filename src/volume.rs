use alloc::string::String;

use uefi::proto::device_path::{DevicePath, DeviceSubType, DeviceType};

use crate::device_path::DeviceAddress;
use crate::menu::{BuiltinIcon, Icon};

/// Index of a volume in the list the platform enumerated. Entries refer to their volume
/// through this; the list lives for the whole program run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VolumeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskKind {
    Internal,
    External,
    Optical,
    /// No device path to go by.
    Other,
}

impl DiskKind {
    /// Classify a medium from the nodes of its device path.
    pub fn from_device_path(path: &DevicePath) -> Self {
        let mut kind = DiskKind::Internal;
        for node in path.node_iter() {
            match node.full_type() {
                (DeviceType::MESSAGING, DeviceSubType::MESSAGING_USB)
                | (DeviceType::MESSAGING, DeviceSubType::MESSAGING_USB_CLASS)
                | (DeviceType::MESSAGING, DeviceSubType::MESSAGING_1394)
                | (DeviceType::MESSAGING, DeviceSubType::MESSAGING_FIBRE_CHANNEL) => {
                    kind = DiskKind::External;
                }
                (DeviceType::MEDIA, DeviceSubType::MEDIA_CD_ROM) => return DiskKind::Optical,
                _ => {}
            }
        }
        kind
    }

    /// Short name used when a legacy volume has no label.
    pub fn fallback_name(self) -> &'static str {
        match self {
            DiskKind::Optical => "CD",
            _ => "HD",
        }
    }

    pub fn badge(self) -> Icon {
        Icon::Builtin(match self {
            DiskKind::External => BuiltinIcon::VolExternal,
            DiskKind::Optical => BuiltinIcon::VolOptical,
            DiskKind::Internal | DiskKind::Other => BuiltinIcon::VolInternal,
        })
    }
}

/// A storage volume as enumerated by the platform. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub id: VolumeId,
    /// Device path of the volume's handle.
    pub device_path: DeviceAddress,
    /// Whether a filesystem root could be opened.
    pub has_root: bool,
    pub name: Option<String>,
    pub disk_kind: DiskKind,
    pub is_legacy: bool,
    pub badge: Option<Icon>,
}

impl Volume {
    /// Name used in titles: the label, or the disk-kind fallback.
    pub fn description(&self) -> &str {
        match self.name.as_deref() {
            Some(name) => name,
            None => self.disk_kind.fallback_name(),
        }
    }

    /// Volumes without a root or a label are not fully mounted yet and are not scanned.
    pub fn is_scannable(&self) -> bool {
        self.has_root && self.name.is_some()
    }
}

/// Sector holding the El Torito boot record volume descriptor on 2048-byte media.
pub const EL_TORITO_SECTOR: u64 = 17;

const MBR_PARTITION_TABLE: usize = 446;
const GPT_PROTECTIVE_TYPE: u8 = 0xEE;

/// A first sector the BIOS would boot: signature present, some boot code, and not the
/// protective MBR of a GPT disk.
pub fn is_legacy_boot_sector(sector: &[u8]) -> bool {
    if sector.len() < 512 || sector[510] != 0x55 || sector[511] != 0xAA {
        return false;
    }
    if sector[..MBR_PARTITION_TABLE].iter().all(|b| *b == 0) {
        return false;
    }
    !sector[MBR_PARTITION_TABLE..510]
        .chunks_exact(16)
        .any(|entry| entry[4] == GPT_PROTECTIVE_TYPE)
}

/// Boot record volume descriptor of a bootable CD.
pub fn is_el_torito_record(sector: &[u8]) -> bool {
    const SYSTEM_ID: &[u8] = b"EL TORITO SPECIFICATION";
    sector.len() >= 7 + SYSTEM_ID.len()
        && sector[0] == 0
        && &sector[1..6] == b"CD001"
        && &sector[7..7 + SYSTEM_ID.len()] == SYSTEM_ID
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_path::build_path;
    use alloc::vec::Vec;
    use uefi::proto::device_path::build::{self, BuildNode};

    fn mbr(code: u8, partition_type: u8) -> Vec<u8> {
        let mut sector = alloc::vec![0u8; 512];
        sector[0] = code;
        sector[MBR_PARTITION_TABLE + 4] = partition_type;
        sector[510] = 0x55;
        sector[511] = 0xAA;
        sector
    }

    #[test]
    fn boot_sector_detection() {
        assert!(is_legacy_boot_sector(&mbr(0xEB, 0x07)));
        assert!(!is_legacy_boot_sector(&mbr(0xEB, 0xEE)));
        assert!(!is_legacy_boot_sector(&mbr(0x00, 0x07)));
        let mut unsigned = mbr(0xEB, 0x07);
        unsigned[511] = 0;
        assert!(!is_legacy_boot_sector(&unsigned));
        assert!(!is_legacy_boot_sector(&[0x55, 0xAA]));
    }

    #[test]
    fn el_torito_detection() {
        let mut sector = alloc::vec![0u8; 2048];
        sector[1..6].copy_from_slice(b"CD001");
        sector[6] = 1;
        sector[7..30].copy_from_slice(b"EL TORITO SPECIFICATION");
        assert!(is_el_torito_record(&sector));
        sector[0] = 1;
        assert!(!is_el_torito_record(&sector));
    }

    #[test]
    fn disk_kind_from_nodes() {
        let pci = build::hardware::Pci {
            function: 0,
            device: 0x1F,
        };
        let sata = build::messaging::Sata {
            hba_port_number: 0,
            port_multiplier_port_number: 0xFFFF,
            logical_unit_number: 0,
        };
        let usb = build::messaging::Usb {
            parent_port_number: 2,
            interface: 0,
        };
        let cd = build::media::CdRom {
            boot_entry: 0,
            partition_start: 0,
            partition_size: 0x1000,
        };

        let kind = |nodes: &[&dyn BuildNode]| {
            DiskKind::from_device_path(build_path(nodes).unwrap().as_device_path())
        };
        assert_eq!(kind(&[&pci, &sata]), DiskKind::Internal);
        assert_eq!(kind(&[&pci, &usb]), DiskKind::External);
        assert_eq!(kind(&[&pci, &sata, &cd]), DiskKind::Optical);
        assert_eq!(kind(&[&pci, &usb, &cd]), DiskKind::Optical);
    }

    #[test]
    fn description_falls_back_to_kind() {
        let mut volume = Volume {
            id: VolumeId(0),
            device_path: build_path(&[]).unwrap(),
            has_root: false,
            name: None,
            disk_kind: DiskKind::Optical,
            is_legacy: true,
            badge: None,
        };
        assert_eq!(volume.description(), "CD");
        volume.disk_kind = DiskKind::Internal;
        assert_eq!(volume.description(), "HD");
        volume.name = Some("Macintosh HD".into());
        assert_eq!(volume.description(), "Macintosh HD");
        assert!(!volume.is_scannable());
    }
}
