//! rEFIt boot menu core.
//!
//! Walks the volumes the firmware exposes, recognises OS loaders and tools on them,
//! builds the menu tree, and turns a menu choice into a started child image, a legacy
//! (BIOS compatibility) boot or a reset. Everything here is generic over
//! [`firmware::Firmware`] and [`firmware::Presenter`]; the `uefi`-backed implementations
//! live in [`platform`].

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod classify;
pub mod config;
pub mod device_path;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod firmware;
pub mod legacy;
pub mod manager;
pub mod menu;
pub mod path;
pub mod selection;
pub mod volume;

#[cfg(target_os = "uefi")]
pub mod platform;

pub use error::{BootError, BootResult};
pub use manager::BootManager;
