//! # mmap-region: memory-mapped file regions over raw OS virtual memory
//!
//! This crate maps an already-open file into the process address space and hands
//! back a [`MappedRegion`]: a unique handle that exposes the bytes as a
//! bounds-checked slice and supports exactly four operations.
//!
//! ## Operations
//!
//! - **Map**: [`map`] / [`MapOptions`] establish a shared mapping of `len` bytes
//! - **Unmap**: [`unmap`] releases it; a second unmap fails
//! - **Advise**: [`advise()`] hints sequential or random access (feature `advise`)
//! - **Sync**: [`sync`] blocks until dirty pages reach stable storage
//!
//! The caller owns the file: it is never closed, truncated or extended here.
//! Mapping is `unsafe` because the bytes behind a region can be changed by anything
//! else with access to the file; see [`MappedRegion::map`] for the contract.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::fs::OpenOptions;
//! use mmap_region::{map, sync, unmap};
//!
//! let file = OpenOptions::new().read(true).write(true).create(true).open("data.bin")?;
//! file.set_len(1024 * 1024)?;
//!
//! // SAFETY: no other mapping, writer or truncation touches data.bin meanwhile.
//! let mut region = unsafe { map(&file, true, 1024 * 1024)? };
//! region.update_region(100, b"Hello, mmap!")?;
//! sync(&region)?;
//! unmap(&mut region)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`errors`]: Error types for all mapping operations
//! - [`utils`]: Page size, alignment and bounds helpers
//! - [`region`]: The `MappedRegion` handle
//! - [`options`]: `MapOptions` builder
//! - [`manager`]: Free-function façade
//!
//! ## Feature Flags
//!
//! - `advise` (default): access-pattern hints

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/mmap-region")]

pub mod errors;
pub mod utils;
mod os;
pub mod region;
pub mod options;
#[cfg(feature = "advise")]
pub mod advise;
pub mod manager;

pub use errors::MmapError;
pub use os::FileId;
pub use region::MappedRegion;
pub use options::MapOptions;
#[cfg(feature = "advise")]
pub use advise::AccessPattern;
#[cfg(feature = "advise")]
pub use manager::advise;
pub use manager::{map, sync, unmap};
