use core::sync::atomic::{AtomicUsize, Ordering};

use linked_list_allocator::LockedHeap;
use uefi::boot::{self, AllocateType};
use uefi::mem::memory_map::MemoryType;
use uefi::Status;

const MIB: usize = 1024 * 1024;
const PAGE_BYTES: usize = 4096;

/// Heap sizes to try, largest first.
const HEAP_CANDIDATES_MIB: [usize; 3] = [16, 8, 4];

#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();
static HEAP_SIZE_BYTES: AtomicUsize = AtomicUsize::new(0);

pub fn heap_size_bytes() -> usize {
    HEAP_SIZE_BYTES.load(Ordering::Relaxed)
}

/// Back the global allocator with loader-data pages. Must run before anything allocates.
pub fn init_heap() -> Result<(), Status> {
    for mib in HEAP_CANDIDATES_MIB {
        let heap_size = mib * MIB;
        let pages = heap_size / PAGE_BYTES;
        let Ok(ptr) =
            boot::allocate_pages(AllocateType::AnyPages, MemoryType::LOADER_DATA, pages)
        else {
            continue;
        };
        // SAFETY: the pages were just allocated for this heap and are never freed.
        unsafe {
            ALLOCATOR.lock().init(ptr.as_ptr(), heap_size);
        }
        HEAP_SIZE_BYTES.store(heap_size, Ordering::Relaxed);
        return Ok(());
    }
    Err(Status::OUT_OF_RESOURCES)
}
