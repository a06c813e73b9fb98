//! Carrying out a menu choice.

use alloc::format;
use alloc::string::String;

use log::{debug, info, warn};
use uefi::runtime::ResetType;
use uefi::{CString16, Status};

use crate::device_path::DeviceAddress;
use crate::error::{BootError, BootResult};
use crate::firmware::{Firmware, MenuEvent, Presenter};
use crate::legacy;
use crate::menu::{LoaderAction, MenuAction, MenuItem, MenuScreen, ToolAction};
use crate::path;
use crate::volume::{Volume, VolumeId};

/// What the main loop does after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Show the menu again.
    Continue,
    /// Leave the main loop.
    Exit,
    /// The console has been torn down already; return without touching it.
    Halted,
}

/// A loaded child image. It is unloaded when this goes out of scope, whatever happened
/// in between; the load options buffer lives exactly as long.
struct ChildImage<'f, F: Firmware> {
    firmware: &'f mut F,
    image: F::Image,
    options: Option<CString16>,
}

impl<'f, F: Firmware> ChildImage<'f, F> {
    fn load(firmware: &'f mut F, address: &DeviceAddress) -> Result<Self, Status> {
        let image = firmware.load_image(address)?;
        Ok(Self {
            firmware,
            image,
            options: None,
        })
    }

    fn set_load_options(&mut self, text: &str) -> BootResult<()> {
        let options =
            CString16::try_from(text).map_err(|_| BootError::InvalidPath(String::from(text)))?;
        let options = self.options.insert(options);
        self.firmware
            .set_load_options(self.image, options)
            .map_err(|status| {
                BootError::firmware(status, "while getting a LoadedImageProtocol handle")
            })
    }

    fn start(&mut self) -> Result<(), Status> {
        self.firmware.start_image(self.image)
    }
}

impl<F: Firmware> Drop for ChildImage<'_, F> {
    fn drop(&mut self) {
        if let Err(status) = self.firmware.unload_image(self.image) {
            debug!("unloading child image failed: {:?}", status);
        }
    }
}

/// Command line handed to a loader: its own name, the options, and a trailing space.
pub fn load_options_text(loader_path: &str, options: &str) -> String {
    format!("{} {} ", path::basename(loader_path), options)
}

pub struct Dispatcher<'a> {
    volumes: &'a [Volume],
    about: &'a MenuScreen,
}

impl<'a> Dispatcher<'a> {
    pub fn new(volumes: &'a [Volume], about: &'a MenuScreen) -> Self {
        Self { volumes, about }
    }

    fn volume(&self, id: VolumeId) -> Option<&'a Volume> {
        self.volumes.iter().find(|volume| volume.id == id)
    }

    pub fn dispatch<F: Firmware, P: Presenter>(
        &self,
        firmware: &mut F,
        presenter: &mut P,
        action: &MenuAction,
    ) -> Flow {
        match action {
            MenuAction::Exit => Flow::Exit,
            MenuAction::Reset => {
                info!("restarting");
                presenter.terminate();
                firmware.reset_system(ResetType::COLD);
                Flow::Halted
            }
            MenuAction::About => {
                self.show_about(presenter);
                Flow::Continue
            }
            MenuAction::Loader(loader) => {
                presenter.begin_external(loader.use_graphics_mode, "Booting OS");
                if let Err(err) = start_loader(firmware, loader) {
                    report(presenter, &err);
                }
                presenter.finish_external();
                Flow::Continue
            }
            MenuAction::Tool(tool) => {
                presenter.begin_external(tool.use_graphics_mode, &tool.title);
                if let Err(err) = start_tool(firmware, tool) {
                    report(presenter, &err);
                }
                presenter.finish_external();
                Flow::Continue
            }
            MenuAction::Legacy { volume } => {
                presenter.begin_external(true, "Initiating Legacy Boot");
                let result = match self.volume(*volume) {
                    Some(volume) => legacy::persist_and_boot(firmware, volume),
                    None => Err(BootError::firmware(
                        Status::NOT_FOUND,
                        "while looking up the legacy volume",
                    )),
                };
                if let Err(err) = result {
                    report(presenter, &err);
                }
                presenter.finish_external();
                Flow::Continue
            }
        }
    }

    fn show_about<P: Presenter>(&self, presenter: &mut P) {
        let mut cursor = 0;
        loop {
            match presenter.present(self.about, cursor, 0) {
                MenuEvent::Activate(index) => match self.about.items.get(index) {
                    Some(MenuItem::Return) => return,
                    _ => cursor = index,
                },
                MenuEvent::Timeout => {}
                MenuEvent::Return | MenuEvent::Escape => return,
            }
        }
    }
}

fn report<P: Presenter>(presenter: &mut P, error: &BootError) {
    warn!("{}", error);
    presenter.report_error(error);
}

fn start_loader<F: Firmware>(firmware: &mut F, loader: &LoaderAction) -> BootResult<()> {
    info!("Starting {}", path::basename(&loader.loader_path));

    let mut child = ChildImage::load(firmware, &loader.device_address).map_err(|status| {
        BootError::firmware(
            status,
            format!("while loading {} on {}", loader.loader_path, loader.volume_name),
        )
    })?;

    if let Some(options) = &loader.load_options {
        let text = load_options_text(&loader.loader_path, options);
        child.set_load_options(&text)?;
        info!("Using load options '{}'", text);
    }

    child
        .start()
        .map_err(|status| BootError::firmware(status, "returned from loader"))
}

fn start_tool<F: Firmware>(firmware: &mut F, tool: &ToolAction) -> BootResult<()> {
    let mut child = ChildImage::load(firmware, &tool.device_address).map_err(|status| {
        BootError::firmware(status, format!("while loading {}", tool.tool_path))
    })?;

    child
        .start()
        .map_err(|status| BootError::firmware(status, "returned from tool"))
}
