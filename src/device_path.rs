//! Device paths as the image loader wants them.
//!
//! Volume identities arrive from the platform as `DevicePath`s; a loader's address is the
//! volume's nodes followed by a file path node. Encoding goes through
//! `uefi::proto::device_path::build` so the bytes match what firmware produces itself.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use uefi::proto::device_path::build::{self, BuildError, BuildNode, DevicePathBuilder};
use uefi::proto::device_path::{media, DevicePath, DeviceSubType, DeviceType};
use uefi::CString16;

use crate::error::{BootError, BootResult};

/// Firmware address of a device or of a file on it, ready for the image loader. Cheap to
/// clone; every menu variant of one loader shares the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress(Rc<DevicePath>);

impl DeviceAddress {
    pub fn new(path: &DevicePath) -> Self {
        Self(Rc::from(path.to_boxed()))
    }

    pub fn as_device_path(&self) -> &DevicePath {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

fn build_error(what: &str, err: BuildError) -> BootError {
    BootError::DevicePath(format!("{}: {}", what, err))
}

/// Device path made of `nodes` and the end node.
pub fn build_path(nodes: &[&dyn BuildNode]) -> BootResult<DeviceAddress> {
    let mut buf: Vec<u8> = Vec::new();
    let mut builder = DevicePathBuilder::with_vec(&mut buf);
    for node in nodes {
        builder = builder
            .push(*node)
            .map_err(|err| build_error("while adding a node", err))?;
    }
    let path = builder
        .finalize()
        .map_err(|err| build_error("while finishing the path", err))?;
    Ok(DeviceAddress::new(path))
}

/// Address of `path` on `device`: the device's nodes, a file path node, then the end node.
pub fn file_device_path(device: &DevicePath, path: &str) -> BootResult<DeviceAddress> {
    let path_name =
        CString16::try_from(path).map_err(|_| BootError::InvalidPath(String::from(path)))?;
    let file_node = build::media::FilePath {
        path_name: &path_name,
    };

    let mut buf: Vec<u8> = Vec::new();
    let mut builder = DevicePathBuilder::with_vec(&mut buf);
    for node in device.node_iter() {
        builder = builder.push(&node).map_err(|err| build_error(path, err))?;
    }
    let full_path = builder
        .push(&file_node)
        .and_then(|builder| builder.finalize())
        .map_err(|err| build_error(path, err))?;
    Ok(DeviceAddress::new(full_path))
}

/// Concatenated text of the file path nodes of `path`, e.g. the path an image was loaded
/// from.
pub fn file_path_text(path: &DevicePath) -> String {
    let mut text = String::new();
    for node in path.node_iter() {
        if node.full_type() != (DeviceType::MEDIA, DeviceSubType::MEDIA_FILE_PATH) {
            continue;
        }
        let Ok(file) = <&media::FilePath>::try_from(node) else {
            continue;
        };
        let units = file.path_name().to_vec();
        let part: String =
            core::char::decode_utf16(units.iter().copied().take_while(|unit| *unit != 0))
                .map(|decoded| decoded.unwrap_or('?'))
                .collect();
        if !text.is_empty() && !text.ends_with('\\') && !part.starts_with('\\') {
            text.push('\\');
        }
        text.push_str(&part);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use uefi::cstr16;

    fn sata_volume() -> DeviceAddress {
        build_path(&[
            &build::hardware::Pci {
                function: 0,
                device: 0x1F,
            },
            &build::messaging::Sata {
                hba_port_number: 1,
                port_multiplier_port_number: 0xFFFF,
                logical_unit_number: 0,
            },
        ])
        .unwrap()
    }

    #[test]
    fn file_device_path_appends_file_node() {
        let volume = sata_volume();
        let address = file_device_path(volume.as_device_path(), "\\a.efi").unwrap();
        let bytes = address.as_bytes();
        let prefix = volume.as_bytes().len() - 4;

        assert_eq!(&bytes[..prefix], &volume.as_bytes()[..prefix]);
        let file = &bytes[prefix..];
        assert_eq!(&file[..4], &[0x04, 0x04, 18, 0]);
        assert_eq!(
            &file[4..18],
            &[b'\\', 0, b'a', 0, b'.', 0, b'e', 0, b'f', 0, b'i', 0, 0, 0]
        );
        assert_eq!(&file[18..], &[0x7F, 0xFF, 0x04, 0x00]);

        let nodes: Vec<_> = address
            .as_device_path()
            .node_iter()
            .map(|node| node.full_type())
            .collect();
        assert_eq!(
            nodes,
            [
                (DeviceType::HARDWARE, DeviceSubType::HARDWARE_PCI),
                (DeviceType::MESSAGING, DeviceSubType::MESSAGING_SATA),
                (DeviceType::MEDIA, DeviceSubType::MEDIA_FILE_PATH),
            ]
        );
    }

    #[test]
    fn file_path_text_reads_loader_path() {
        let volume = sata_volume();
        let address =
            file_device_path(volume.as_device_path(), "\\EFI\\refit\\refit.efi").unwrap();
        assert_eq!(file_path_text(address.as_device_path()), "\\EFI\\refit\\refit.efi");
        assert_eq!(file_path_text(volume.as_device_path()), "");
    }

    #[test]
    fn file_path_text_joins_split_nodes() {
        let address = build_path(&[
            &build::media::FilePath {
                path_name: cstr16!("\\EFI\\refit"),
            },
            &build::media::FilePath {
                path_name: cstr16!("refit.efi"),
            },
        ])
        .unwrap();
        assert_eq!(file_path_text(address.as_device_path()), "\\EFI\\refit\\refit.efi");
    }

    #[test]
    fn non_ucs2_paths_are_rejected() {
        assert!(matches!(
            file_device_path(sata_volume().as_device_path(), "\\caf\u{1F600}.efi"),
            Err(BootError::InvalidPath(_))
        ));
    }
}
