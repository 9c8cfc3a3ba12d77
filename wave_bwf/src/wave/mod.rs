//! Reading and writing WAVE files
//!
//! [`WaveReader`] walks an existing `RIFF`/`RF64` file, decoding metadata chunks on demand.
//! [`WaveWriter`] streams frames into a new file, choosing the layout when the header is written
//! and patching the sizes in place when it is closed.

mod read;
mod write;

pub use read::WaveReader;
pub use write::WaveWriter;

use crate::error::{BwfError, ErrorKind, Result};

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// The outer container of a WAVE file
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContainerLayout {
	/// A classic `RIFF` file with 32-bit sizes
	Riff,
	/// An `RF64` file, with the true sizes kept in `ds64`
	Rf64,
}

impl ContainerLayout {
	/// Choose a layout for a `data` payload of `payload_len` bytes
	///
	/// Anything larger than `threshold` bytes requires RF64.
	///
	/// # Examples
	///
	/// ```rust
	/// use wave_bwf::config::WriteOptions;
	/// use wave_bwf::wave::ContainerLayout;
	///
	/// let threshold = WriteOptions::DEFAULT_RF64_THRESHOLD;
	/// assert_eq!(
	/// 	ContainerLayout::for_payload(2_140_483_647, threshold),
	/// 	ContainerLayout::Riff
	/// );
	/// assert_eq!(
	/// 	ContainerLayout::for_payload(2_140_483_648, threshold),
	/// 	ContainerLayout::Rf64
	/// );
	/// ```
	pub fn for_payload(payload_len: u64, threshold: u64) -> Self {
		if payload_len > threshold {
			Self::Rf64
		} else {
			Self::Riff
		}
	}

	/// The four character code of the outer chunk
	pub fn fourcc(self) -> [u8; 4] {
		match self {
			Self::Riff => *b"RIFF",
			Self::Rf64 => *b"RF64",
		}
	}
}

/// The sample compression of a WAVE file
///
/// Only uncompressed PCM is supported.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum CompressionType {
	/// Uncompressed PCM
	#[default]
	None,
}

impl CompressionType {
	/// The short identifier, `NONE`
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "NONE",
		}
	}

	/// A human readable name, `not compressed`
	pub fn name(self) -> &'static str {
		match self {
			Self::None => "not compressed",
		}
	}
}

impl Display for CompressionType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for CompressionType {
	type Err = BwfError;

	/// Parse a compression identifier
	///
	/// # Errors
	///
	/// Anything other than `NONE`
	///
	/// # Examples
	///
	/// ```rust
	/// use wave_bwf::wave::CompressionType;
	///
	/// assert_eq!("NONE".parse::<CompressionType>().unwrap(), CompressionType::None);
	/// assert!("ULAW".parse::<CompressionType>().is_err());
	/// ```
	fn from_str(s: &str) -> Result<Self> {
		match s {
			"NONE" => Ok(Self::None),
			_ => Err(BwfError::new(ErrorKind::UnsupportedCompression)),
		}
	}
}

/// The parameters of a WAVE stream, all at once
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WaveParams {
	/// Number of interleaved channels
	pub channels: u16,
	/// Bytes per sample
	pub sample_width: u16,
	/// Frames per second
	pub sample_rate: u32,
	/// Number of frames
	pub frame_count: u64,
	/// Sample compression
	pub compression: CompressionType,
}

/// How to open a file with [`open`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpenMode {
	/// Read an existing file
	Read,
	/// Create (or truncate) a file for writing
	Write,
}

/// A file opened with [`open`]
pub enum OpenedWave {
	#[allow(missing_docs)]
	Reader(WaveReader<'static, File>),
	#[allow(missing_docs)]
	Writer(WaveWriter<'static, File>),
}

/// Open the file at `path` for reading or writing
///
/// The returned reader/writer owns the file handle, and releases it when closed.
///
/// # Errors
///
/// * The file could not be opened
/// * [`OpenMode::Read`]: See [`WaveReader::open`]
///
/// # Examples
///
/// ```rust,no_run
/// use wave_bwf::wave::{OpenMode, OpenedWave, open};
///
/// # fn main() -> wave_bwf::error::Result<()> {
/// if let OpenedWave::Reader(mut reader) = open("news.wav", OpenMode::Read)? {
/// 	println!("{} frames at {} Hz", reader.frame_count(), reader.sample_rate());
/// 	reader.close();
/// }
/// # Ok(()) }
/// ```
pub fn open<P>(path: P, mode: OpenMode) -> Result<OpenedWave>
where
	P: AsRef<Path>,
{
	match mode {
		OpenMode::Read => WaveReader::open(path).map(OpenedWave::Reader),
		OpenMode::Write => WaveWriter::create(path).map(OpenedWave::Writer),
	}
}

#[cfg(test)]
mod tests {
	use super::{CompressionType, ContainerLayout};
	use crate::error::ErrorKind;

	#[test_log::test]
	fn compression_names() {
		assert_eq!(CompressionType::None.as_str(), "NONE");
		assert_eq!(CompressionType::None.name(), "not compressed");
		assert_eq!(CompressionType::None.to_string(), "NONE");

		let err = "none".parse::<CompressionType>().unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::UnsupportedCompression));
	}

	#[test_log::test]
	fn layout_threshold() {
		assert_eq!(ContainerLayout::for_payload(0, 0), ContainerLayout::Riff);
		assert_eq!(ContainerLayout::for_payload(1, 0), ContainerLayout::Rf64);
		assert_eq!(ContainerLayout::Rf64.fourcc(), *b"RF64");
	}
}
