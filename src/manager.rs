use alloc::vec::Vec;

use log::{info, warn};
use uefi::Status;

use crate::config::{Config, CONFIG_FILE_NAME};
use crate::discovery::{add_fixed_entries, Scanner};
use crate::dispatch::{Dispatcher, Flow};
use crate::error::{BootError, BootResult};
use crate::firmware::{Firmware, Presenter, SelfImage};
use crate::menu::{about_screen, MenuScreen};
use crate::path;
use crate::selection::{MenuRunner, Selection};
use crate::volume::Volume;

pub const MAIN_MENU_TITLE: &str = "Main Menu";
pub const TIMEOUT_LABEL: &str = "Automatic boot";

/// Everything built during the scan phase. Lives for the rest of the program run; the
/// menu entries refer to volumes by id into `volumes`.
pub struct BootManager {
    volumes: Vec<Volume>,
    config: Config,
    main: MenuScreen,
    about: MenuScreen,
    errors: Vec<BootError>,
}

impl BootManager {
    /// Enumerate volumes, read the configuration and build the main menu. Fails only when
    /// the manager cannot locate itself.
    pub fn build<F: Firmware>(firmware: &mut F) -> BootResult<Self> {
        let volumes = firmware.scan_volumes();
        info!("{} volumes found", volumes.len());

        let SelfImage { volume: self_id, path: self_path } = firmware
            .self_image()
            .map_err(|status| {
                BootError::firmware(status, "while getting a LoadedImageProtocol handle")
            })?;
        let self_volume = volumes
            .iter()
            .find(|volume| volume.id == self_id)
            .ok_or_else(|| {
                BootError::firmware(
                    Status::NOT_FOUND,
                    "while locating the boot manager's own volume",
                )
            })?;
        let self_dir = path::parent(&self_path);

        let (config, mut errors) = load_config(firmware, self_volume, self_dir);
        log::set_max_level(config.log_level);

        let mut main = MenuScreen::new(MAIN_MENU_TITLE);
        main.timeout_seconds = config.timeout;
        main.timeout_label = Some(TIMEOUT_LABEL.into());

        let mut scanner = Scanner::new(&*firmware);
        scanner.scan_loaders(&volumes, &mut main);
        if config.legacy {
            scanner.scan_legacy(&volumes, &mut main);
        }
        if config.tools {
            scanner.scan_tools(self_volume, self_dir, &mut main);
        }
        add_fixed_entries(&mut main);
        errors.extend(scanner.into_errors());

        Ok(Self {
            volumes,
            config,
            main,
            about: about_screen(),
            errors,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn main_menu(&self) -> &MenuScreen {
        &self.main
    }

    /// Errors collected while scanning.
    pub fn scan_errors(&self) -> &[BootError] {
        &self.errors
    }

    /// The interactive loop. Returns when the user leaves the manager.
    pub fn run<F: Firmware, P: Presenter>(&self, firmware: &mut F, presenter: &mut P) {
        if !self.errors.is_empty() {
            presenter.acknowledge_errors(&self.errors);
        }

        let dispatcher = Dispatcher::new(&self.volumes, &self.about);
        let mut runner = MenuRunner::new(&self.main);
        loop {
            let action = match runner.next(presenter) {
                Selection::Quit => break,
                Selection::Dispatch(action) => action,
            };
            match dispatcher.dispatch(firmware, presenter, action) {
                Flow::Continue => {}
                Flow::Exit => break,
                Flow::Halted => return,
            }
        }
        presenter.terminate();
    }
}

fn load_config<F: Firmware>(
    firmware: &F,
    self_volume: &Volume,
    self_dir: &str,
) -> (Config, Vec<BootError>) {
    let config_path = path::join(self_dir, CONFIG_FILE_NAME);
    match firmware.read_file(self_volume, &config_path) {
        Ok(bytes) => {
            info!("reading {}", config_path);
            let (config, errors) = Config::parse(&bytes);
            for error in errors.iter() {
                warn!("{}", error);
            }
            (config, errors)
        }
        Err(Status::NOT_FOUND) => (Config::default(), Vec::new()),
        Err(status) => {
            let error =
                BootError::firmware(status, alloc::format!("while loading {}", config_path));
            warn!("{}", error);
            (Config::default(), alloc::vec![error])
        }
    }
}
