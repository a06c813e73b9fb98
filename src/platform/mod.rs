//! `uefi`-crate backed implementations of [`crate::firmware::Firmware`] and
//! [`crate::firmware::Presenter`].

mod console;
mod firmware;
mod volumes;

pub use console::TextPresenter;
pub use firmware::UefiFirmware;

use uefi::boot::{self, OpenProtocolAttributes, OpenProtocolParams, ScopedProtocol};
use uefi::proto::ProtocolPointer;
use uefi::Handle;

/// Open `P` on `handle` without taking ownership of it, so drivers and other agents
/// keep working.
fn get_protocol<P: ProtocolPointer + ?Sized>(handle: Handle) -> uefi::Result<ScopedProtocol<P>> {
    let params = OpenProtocolParams {
        handle,
        agent: boot::image_handle(),
        controller: None,
    };
    // SAFETY: the protocol is only used while the scoped handle lives and nothing in this
    // program uninstalls protocols.
    unsafe { boot::open_protocol::<P>(params, OpenProtocolAttributes::GetProtocol) }
}
