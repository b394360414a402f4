//! Sniffer Core Library
//!
//! This crate provides the shared error type, the raw frame representation,
//! and the frame source trait used by the sniffer capture and decode crates.

pub mod error;
pub mod packet;
pub mod source;

// Re-export commonly used types
pub use error::{Error, Result};
pub use packet::{CapturedFrame, RawFrame};
pub use source::{FrameSource, MemorySource};
