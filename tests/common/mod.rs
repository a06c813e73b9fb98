#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use refit::device_path::{build_path, file_path_text, DeviceAddress};
use refit::firmware::{DirEntry, Firmware, MenuEvent, Presenter, SelfImage};
use refit::menu::MenuScreen;
use refit::path::glob_match;
use refit::volume::{DiskKind, Volume, VolumeId};
use refit::BootError;
use uefi::proto::device_path::build;
use uefi::runtime::{ResetType, VariableAttributes, VariableVendor};
use uefi::{CStr16, Status};

pub const SELF_PATH: &str = "\\EFI\\refit\\refit.efi";

/// Device path of a hard drive partition behind a PCI controller; `seed` keeps volumes
/// apart.
pub fn partition_path(seed: u8) -> DeviceAddress {
    build_path(&[
        &build::hardware::Pci {
            function: 0,
            device: seed,
        },
        &build::messaging::Sata {
            hba_port_number: u16::from(seed),
            port_multiplier_port_number: 0xFFFF,
            logical_unit_number: 0,
        },
    ])
    .unwrap()
}

pub fn volume(id: usize, name: Option<&str>, disk_kind: DiskKind) -> Volume {
    Volume {
        id: VolumeId(id),
        device_path: partition_path(id as u8),
        has_root: true,
        name: name.map(String::from),
        disk_kind,
        is_legacy: false,
        badge: Some(disk_kind.badge()),
    }
}

pub fn legacy_volume(id: usize, name: Option<&str>, disk_kind: DiskKind) -> Volume {
    Volume {
        has_root: false,
        is_legacy: true,
        ..volume(id, name, disk_kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    LoadImage(String),
    SetLoadOptions { image: usize, options: String, size: usize },
    StartImage(usize),
    UnloadImage(usize),
    SetVariable { name: String, attributes: VariableAttributes, data: Vec<u8> },
    Reset(ResetType),
}

/// In-memory firmware: files per volume, scripted failures and a log of every call that
/// changes machine state.
#[derive(Default)]
pub struct MockFirmware {
    pub volumes: Vec<Volume>,
    files: HashMap<usize, Vec<(String, Vec<u8>)>>,
    pub dir_errors: HashMap<(usize, String), Status>,
    pub self_volume: usize,
    pub self_image_error: Option<Status>,
    pub load_errors: HashMap<String, Status>,
    pub start_errors: HashMap<String, Status>,
    pub variable_errors: HashMap<String, Status>,
    pub calls: Vec<Call>,
    /// Every directory listed, with the pattern it was filtered by.
    pub listings: RefCell<Vec<(String, Option<String>)>>,
    images: Vec<String>,
}

impl MockFirmware {
    pub fn new(volumes: Vec<Volume>) -> Self {
        Self {
            volumes,
            ..Self::default()
        }
    }

    pub fn with_file(mut self, volume: usize, path: &str) -> Self {
        self.add_file(volume, path, Vec::new());
        self
    }

    pub fn with_files(mut self, volume: usize, paths: &[&str]) -> Self {
        for path in paths {
            self.add_file(volume, path, Vec::new());
        }
        self
    }

    pub fn add_file(&mut self, volume: usize, path: &str, data: Vec<u8>) {
        self.files.entry(volume).or_default().push((String::from(path), data));
    }

    pub fn fail_dir(mut self, volume: usize, path: &str, status: Status) -> Self {
        self.dir_errors.insert((volume, path.to_ascii_lowercase()), status);
        self
    }

    fn files_on(&self, volume: &Volume) -> &[(String, Vec<u8>)] {
        if !volume.has_root {
            return &[];
        }
        self.files.get(&volume.id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    fn image_path(&self, image: usize) -> &str {
        &self.images[image]
    }
}

impl Firmware for MockFirmware {
    type Image = usize;

    fn scan_volumes(&mut self) -> Vec<Volume> {
        self.volumes.clone()
    }

    fn self_image(&self) -> Result<SelfImage, Status> {
        match self.self_image_error {
            Some(status) => Err(status),
            None => Ok(SelfImage {
                volume: VolumeId(self.self_volume),
                path: String::from(SELF_PATH),
            }),
        }
    }

    fn file_exists(&self, volume: &Volume, path: &str) -> bool {
        self.files_on(volume)
            .iter()
            .any(|(file, _)| file.eq_ignore_ascii_case(path))
    }

    fn list_dir(
        &self,
        volume: &Volume,
        path: &str,
        pattern: Option<&str>,
    ) -> Result<Vec<DirEntry>, Status> {
        self.listings
            .borrow_mut()
            .push((String::from(path), pattern.map(String::from)));
        if let Some(status) = self.dir_errors.get(&(volume.id.0, path.to_ascii_lowercase())) {
            return Err(*status);
        }
        if !volume.has_root {
            return Err(Status::NO_MEDIA);
        }

        let prefix = format!("{}\\", path.trim_end_matches('\\')).to_ascii_lowercase();
        let mut found = path == "\\";
        let mut entries: Vec<DirEntry> = Vec::new();
        for (file, _) in self.files_on(volume) {
            let lower = file.to_ascii_lowercase();
            let Some(rest) = lower.strip_prefix(&prefix) else {
                continue;
            };
            found = true;
            let rest = &file[file.len() - rest.len()..];
            let (name, is_dir) = match rest.split_once('\\') {
                Some((dir, _)) => (dir, true),
                None => (rest, false),
            };
            if !entries.iter().any(|entry| entry.name == name) {
                entries.push(DirEntry {
                    name: String::from(name),
                    is_dir,
                });
            }
        }

        if let Some(pattern) = pattern {
            entries.retain(|entry| !entry.is_dir && glob_match(pattern, &entry.name));
        }
        if found {
            Ok(entries)
        } else {
            Err(Status::NOT_FOUND)
        }
    }

    fn read_file(&self, volume: &Volume, path: &str) -> Result<Vec<u8>, Status> {
        self.files_on(volume)
            .iter()
            .find(|(file, _)| file.eq_ignore_ascii_case(path))
            .map(|(_, data)| data.clone())
            .ok_or(Status::NOT_FOUND)
    }

    fn load_image(&mut self, address: &DeviceAddress) -> Result<usize, Status> {
        let path = file_path_text(address.as_device_path());
        self.calls.push(Call::LoadImage(path.clone()));
        if let Some(status) = self.load_errors.get(&path) {
            return Err(*status);
        }
        self.images.push(path);
        Ok(self.images.len() - 1)
    }

    fn set_load_options(&mut self, image: usize, options: &CStr16) -> Result<(), Status> {
        self.calls.push(Call::SetLoadOptions {
            image,
            options: options.to_string(),
            size: std::mem::size_of_val(options.as_slice_with_nul()),
        });
        Ok(())
    }

    fn start_image(&mut self, image: usize) -> Result<(), Status> {
        self.calls.push(Call::StartImage(image));
        match self.start_errors.get(self.image_path(image)) {
            Some(status) => Err(*status),
            None => Ok(()),
        }
    }

    fn unload_image(&mut self, image: usize) -> Result<(), Status> {
        self.calls.push(Call::UnloadImage(image));
        Ok(())
    }

    fn set_variable(
        &mut self,
        name: &CStr16,
        vendor: &VariableVendor,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> Result<(), Status> {
        assert_eq!(*vendor, VariableVendor::GLOBAL_VARIABLE);
        let name = name.to_string();
        if let Some(status) = self.variable_errors.get(&name) {
            return Err(*status);
        }
        self.calls.push(Call::SetVariable {
            name,
            attributes,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn reset_system(&mut self, kind: ResetType) {
        self.calls.push(Call::Reset(kind));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shown {
    pub title: String,
    pub cursor: usize,
    pub timeout: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Present(String),
    BeginExternal(bool, String),
    FinishExternal,
    Error(BootError),
    Acknowledge(usize),
    Terminate,
}

/// Replays a fixed list of navigation events; once they run out, every screen answers
/// with Escape.
pub struct ScriptedPresenter {
    script: VecDeque<MenuEvent>,
    pub shown: Vec<Shown>,
    pub events: Vec<Event>,
}

impl ScriptedPresenter {
    pub fn new(script: &[MenuEvent]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            shown: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn errors(&self) -> Vec<&BootError> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Error(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    pub fn screen_titles(&self) -> Vec<&str> {
        self.shown.iter().map(|shown| shown.title.as_str()).collect()
    }
}

impl Presenter for ScriptedPresenter {
    fn present(&mut self, screen: &MenuScreen, cursor: usize, timeout_seconds: u32) -> MenuEvent {
        self.shown.push(Shown {
            title: screen.title.clone(),
            cursor,
            timeout: timeout_seconds,
        });
        self.events.push(Event::Present(screen.title.clone()));
        self.script.pop_front().unwrap_or(MenuEvent::Escape)
    }

    fn begin_external(&mut self, use_graphics_mode: bool, title: &str) {
        self.events
            .push(Event::BeginExternal(use_graphics_mode, String::from(title)));
    }

    fn finish_external(&mut self) {
        self.events.push(Event::FinishExternal);
    }

    fn report_error(&mut self, error: &BootError) {
        self.events.push(Event::Error(error.clone()));
    }

    fn acknowledge_errors(&mut self, errors: &[BootError]) {
        self.events.push(Event::Acknowledge(errors.len()));
    }

    fn terminate(&mut self) {
        self.events.push(Event::Terminate);
    }
}

/// Titles of the main menu in display order.
pub fn titles(screen: &MenuScreen) -> Vec<String> {
    screen.titles().into_iter().map(String::from).collect()
}
