//! Memory-mapped register windows.
//!
//! Each peripheral gets exactly one page-sized window onto `/dev/mem`,
//! mapped once per process by the supervisor and injected by value into the
//! driver that owns it. Access goes through volatile reads and writes in
//! issuance order; the window is never unmapped during normal operation.
//!
//! A heap-backed [`RegisterBlock::emulated`] constructor backs the driver
//! unit tests, which verify register arithmetic without hardware.

use crate::error::{AcqError, AppResult};
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;

/// One page of registers.
pub const PAGE_SIZE: usize = 4096;

/// Peripheral window base for the BCM2836 (Pi 2 Model B).
const PERI_BASE: u64 = 0x3F00_0000;

/// Physical offset of the GPIO register page.
pub(crate) const GPIO_BASE: u64 = PERI_BASE + 0x0020_0000;

/// Physical offset of the SPI0 register page.
pub(crate) const SPI0_BASE: u64 = PERI_BASE + 0x0020_4000;

const MEM_DEVICE: &str = "/dev/mem";

enum Backing {
    /// Live hardware window. Held only to keep the mapping alive.
    Device(#[allow(dead_code)] MmapMut),
    /// Plain heap memory for tests.
    Emulated(#[allow(dead_code)] Box<[u32]>),
}

/// A fixed-size block of 32-bit hardware registers.
///
/// Reads and writes go through volatile pointer operations so the compiler
/// never caches, elides, or reorders them relative to each other. Register
/// writes take `&self`: a pulse register mutates hardware state without
/// being memory the borrow checker can reason about.
pub struct RegisterBlock {
    backing: Backing,
    base: *mut u32,
    words: usize,
}

// SAFETY: The block is owned by exactly one driver, which is moved wholesale
// into the task that uses it. The raw pointer targets either a per-process
// /dev/mem mapping or heap memory owned by `backing`, both of which move
// with the struct.
#[allow(unsafe_code)]
unsafe impl Send for RegisterBlock {}

impl RegisterBlock {
    /// Map one page of `/dev/mem` at the given physical offset.
    ///
    /// Requires root. `peripheral` names the window in the error so a
    /// failed GPIO map reads differently from a failed SPI map.
    #[allow(unsafe_code)]
    pub fn map_device(offset: u64, peripheral: &'static str) -> AppResult<Self> {
        let map_err = |source: std::io::Error| AcqError::RegisterMap { peripheral, source };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(MEM_DEVICE)
            .map_err(map_err)?;

        // SAFETY: /dev/mem windows are not ordinary file mappings; the
        // kernel hands out the device page directly and no other process
        // can truncate it out from under us.
        let mut mmap = unsafe {
            MmapOptions::new()
                .offset(offset)
                .len(PAGE_SIZE)
                .map_mut(&file)
                .map_err(map_err)?
        };

        let base = mmap.as_mut_ptr().cast::<u32>();
        Ok(Self {
            backing: Backing::Device(mmap),
            base,
            words: PAGE_SIZE / std::mem::size_of::<u32>(),
        })
    }

    /// A zero-filled heap-backed block of one page, for tests.
    pub fn emulated() -> Self {
        let mut slab = vec![0u32; PAGE_SIZE / std::mem::size_of::<u32>()].into_boxed_slice();
        let base = slab.as_mut_ptr();
        Self {
            backing: Backing::Emulated(slab),
            base,
            words: PAGE_SIZE / std::mem::size_of::<u32>(),
        }
    }

    /// Volatile read of the register at word `index`.
    #[allow(unsafe_code)]
    pub(crate) fn read(&self, index: usize) -> u32 {
        assert!(index < self.words, "register index {index} out of window");
        // SAFETY: index is bounds-checked against the mapped window.
        unsafe { self.base.add(index).read_volatile() }
    }

    /// Volatile write of the register at word `index`.
    #[allow(unsafe_code)]
    pub(crate) fn write(&self, index: usize, value: u32) {
        assert!(index < self.words, "register index {index} out of window");
        // SAFETY: index is bounds-checked against the mapped window.
        unsafe { self.base.add(index).write_volatile(value) }
    }
}
