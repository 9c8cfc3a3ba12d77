//! Read and write Broadcast Wave (BWF) and RF64 WAVE files.
//!
//! `wave_bwf` streams PCM frames in and out of `RIFF`/`RF64` containers, and preserves the
//! broadcast metadata chunks alongside them:
//!
//! | Chunk  | Type                                              |
//! |--------|---------------------------------------------------|
//! | `bext` | [`Bext`](bext::Bext)                              |
//! | `chna` | [`ChannelUidMap`](chna::ChannelUidMap)            |
//! | `r64m` | [`MarkerSet`](r64m::MarkerSet)                    |
//! | `axml` | raw bytes                                         |
//! | `levl` | raw bytes                                         |
//! | `MD5 ` | 16 byte digest (stored reversed)                  |
//!
//! # Examples
//!
//! ## Writing a file
//!
//! ```rust,no_run
//! # fn main() -> wave_bwf::error::Result<()> {
//! use wave_bwf::bext::Bext;
//! use wave_bwf::wave::WaveWriter;
//!
//! let mut writer = WaveWriter::create("interview.wav")?;
//! writer.set_channels(1)?;
//! writer.set_sample_width(3)?;
//! writer.set_sample_rate(48000)?;
//!
//! let mut bext = Bext::new();
//! bext.set_description("Interview, take 3")?;
//! writer.set_bext(bext)?;
//!
//! // The header is written here, and the parameters are frozen
//! writer.write_frames(&[0; 3 * 48000])?;
//!
//! // Loudness measured after the fact is patched in on close
//! if let Some(bext) = writer.bext_mut() {
//! 	bext.set_loudness_value(Some(-23.0));
//! }
//!
//! writer.close()?;
//! # Ok(()) }
//! ```
//!
//! ## Reading a file
//!
//! ```rust,no_run
//! # fn main() -> wave_bwf::error::Result<()> {
//! use wave_bwf::wave::WaveReader;
//!
//! let mut reader = WaveReader::open("interview.wav")?;
//! println!(
//! 	"{:?}: {} frames",
//! 	reader.container_type(),
//! 	reader.frame_count()
//! );
//!
//! if let Some(markers) = reader.markers()? {
//! 	for marker in markers {
//! 		println!("{:?}: {}", marker.time_offset(), marker.label());
//! 	}
//! }
//!
//! let frames = reader.read_frames(1024)?;
//! reader.close();
//! # Ok(()) }
//! ```
//!
//! # Notes on `RF64`
//!
//! The layout is chosen once, when the header is written. Files whose declared (or first written)
//! payload exceeds [`WriteOptions::DEFAULT_RF64_THRESHOLD`](config::WriteOptions::DEFAULT_RF64_THRESHOLD)
//! bytes are written as `RF64`. Declare the frame count with
//! [`WaveWriter::set_frame_count`](wave::WaveWriter::set_frame_count) when streaming large files.

pub mod bext;
pub mod chna;
pub mod config;
pub mod error;
pub mod iff;
pub(crate) mod macros;
pub mod r64m;
mod util;
pub mod wave;

pub use wave::{OpenMode, OpenedWave, open};
