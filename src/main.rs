#![cfg_attr(target_os = "uefi", no_std)]
#![cfg_attr(target_os = "uefi", no_main)]

#[cfg(target_os = "uefi")]
mod allocator;

#[cfg(target_os = "uefi")]
use uefi::prelude::*;

#[cfg(target_os = "uefi")]
#[entry]
fn efi_main() -> Status {
    use log::{error, info};
    use refit::platform::{TextPresenter, UefiFirmware};
    use refit::BootManager;

    if uefi::helpers::init().is_err() {
        return Status::ABORTED;
    }

    // The firmware arms a 5-minute watchdog for every started image; a menu may sit
    // waiting for longer than that.
    let _ = uefi::boot::set_watchdog_timer(0, 0, None);

    if let Err(status) = allocator::init_heap() {
        return status;
    }
    info!("heap: {} KiB", allocator::heap_size_bytes() / 1024);

    let mut firmware = UefiFirmware::new();
    let manager = match BootManager::build(&mut firmware) {
        Ok(manager) => manager,
        Err(err) => {
            error!("{}", err);
            return err.status();
        }
    };

    let mut presenter = TextPresenter::new();
    manager.run(&mut firmware, &mut presenter);
    Status::SUCCESS
}

#[cfg(target_os = "uefi")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    use core::fmt::Write;

    uefi::system::with_stdout(|out| {
        let _ = writeln!(out);
        let _ = writeln!(out, "rEFIt panic!");
        if let Some(location) = info.location() {
            let _ = writeln!(
                out,
                "Location: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
        let _ = writeln!(out, "Message: {}", info.message());
    });

    loop {
        core::hint::spin_loop();
    }
}

/// The boot manager only runs as a UEFI application; host builds exist for the tests.
#[cfg(not(target_os = "uefi"))]
fn main() {}
