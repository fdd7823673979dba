//! # luxd core library
//!
//! `luxd` is a small data-acquisition daemon for Raspberry Pi class boards.
//! It polls a 10-bit light level from an MCP3002-style ADC over the board's
//! SPI0 peripheral every sampling period, retains the most recent samples in
//! a fixed-capacity ring buffer, and flushes that buffer to a plain-text file
//! whenever the process receives `SIGUSR1`.
//!
//! ## Crate structure
//!
//! - **`config`**: typed configuration loaded from `luxd.toml` and `LUXD_`
//!   environment variables.
//! - **`error`**: the [`AcqError`](error::AcqError) enum and the process exit
//!   code for each failure class.
//! - **`hardware`**: the memory-mapped register driver (GPIO function
//!   select, pin read/write, SPI byte transfer), the ADC protocol codec, and
//!   mock implementations for running without hardware.
//! - **`data`**: the [`Sample`](data::Sample) type, the shared sample ring
//!   buffer, and the dump-file writer.
//! - **`pipeline`**: the producer and consumer loops and the supervisor that
//!   wires them together over a bounded channel.
//! - **`logging`**: `tracing` subscriber initialization.
//!
//! The hardware paths require root (they map a page of `/dev/mem`); the rest
//! of the crate is exercised by tests against heap-backed register blocks
//! and mock sensors.

pub mod config;
pub mod data;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod pipeline;
