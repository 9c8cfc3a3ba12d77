//! RIFF/RF64 container primitives

mod channel_mask;
pub mod chunk;
pub mod ds64;
pub mod fmt;
