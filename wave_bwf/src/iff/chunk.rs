//! RIFF chunk framing

use crate::error::Result;
use crate::macros::{err, try_vec};

use std::fmt::{Display, Formatter};
use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;

use byteorder::{ByteOrder, ReadBytesExt};

pub(crate) const RIFF_CHUNK_HEADER_SIZE: u64 = 8;

/// The 32-bit size sentinel used by RF64 files, the real size lives in the `ds64` chunk
pub(crate) const RF64_SIZE_SENTINEL: u32 = u32::MAX;

/// The chunks (and containers) known to `wave_bwf`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ChunkKind {
	/// The classic `RIFF` container
	Riff,
	/// The 64-bit `RF64` container
	Rf64,
	/// `ds64`, the RF64 size extension
	Ds64,
	/// `fmt `, the audio format
	Fmt,
	/// `data`, the interleaved frames
	Data,
	/// `bext`, the broadcast audio extension
	Bext,
	/// `chna`, the channel to UID mapping
	Chna,
	/// `r64m`, sample accurate markers
	R64m,
	/// `axml`, free form XML
	Axml,
	/// `MD5 `, a digest of the audio data
	Md5,
	/// `levl`, peak envelope data
	Levl,
}

impl ChunkKind {
	/// The four character code that identifies this chunk on disk
	///
	/// # Examples
	///
	/// ```rust
	/// use wave_bwf::iff::chunk::ChunkKind;
	///
	/// assert_eq!(ChunkKind::Md5.fourcc(), *b"MD5 ");
	/// ```
	pub const fn fourcc(self) -> [u8; 4] {
		match self {
			Self::Riff => *b"RIFF",
			Self::Rf64 => *b"RF64",
			Self::Ds64 => *b"ds64",
			Self::Fmt => *b"fmt ",
			Self::Data => *b"data",
			Self::Bext => *b"bext",
			Self::Chna => *b"chna",
			Self::R64m => *b"r64m",
			Self::Axml => *b"axml",
			Self::Md5 => *b"MD5 ",
			Self::Levl => *b"levl",
		}
	}

	/// Look up a chunk by its four character code
	///
	/// # Examples
	///
	/// ```rust
	/// use wave_bwf::iff::chunk::ChunkKind;
	///
	/// assert_eq!(ChunkKind::from_fourcc(b"bext"), Some(ChunkKind::Bext));
	/// assert_eq!(ChunkKind::from_fourcc(b"JUNK"), None);
	/// ```
	pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
		match fourcc {
			b"RIFF" => Some(Self::Riff),
			b"RF64" => Some(Self::Rf64),
			b"ds64" => Some(Self::Ds64),
			b"fmt " => Some(Self::Fmt),
			b"data" => Some(Self::Data),
			b"bext" => Some(Self::Bext),
			b"chna" => Some(Self::Chna),
			b"r64m" => Some(Self::R64m),
			b"axml" => Some(Self::Axml),
			b"MD5 " => Some(Self::Md5),
			b"levl" => Some(Self::Levl),
			_ => None,
		}
	}
}

impl Display for ChunkKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let fourcc = self.fourcc();
		write!(f, "\"{}\"", String::from_utf8_lossy(&fourcc))
	}
}

/// The location of a chunk body within the stream
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ChunkRange {
	/// Absolute offset of the first body byte
	pub offset: u64,
	/// Length of the body in bytes, not including the pad byte
	pub size: u64,
}

pub(crate) struct Chunks<B>
where
	B: ByteOrder,
{
	pub fourcc: [u8; 4],
	/// The size of the current chunk's body, which is the declared size unless overridden
	pub size: u64,
	pub declared_size: u32,
	remaining_size: u64,
	_phantom: PhantomData<B>,
}

impl<B: ByteOrder> Chunks<B> {
	#[must_use]
	pub const fn new(stream_size: u64) -> Self {
		Self {
			fourcc: [0; 4],
			size: 0,
			declared_size: 0,
			remaining_size: stream_size,
			_phantom: PhantomData,
		}
	}

	pub fn next<R>(&mut self, data: &mut R) -> Result<bool>
	where
		R: Read,
	{
		if self.remaining_size < RIFF_CHUNK_HEADER_SIZE {
			return Ok(false);
		}

		data.read_exact(&mut self.fourcc)?;
		self.declared_size = data.read_u32::<B>()?;
		self.size = u64::from(self.declared_size);

		self.remaining_size = self.remaining_size.saturating_sub(RIFF_CHUNK_HEADER_SIZE);

		Ok(true)
	}

	/// Replace the declared size of the current chunk
	///
	/// RF64 files store the true size of oversized chunks in `ds64`, leaving a sentinel in the header.
	pub fn override_size(&mut self, size: u64) {
		self.size = size;
	}

	/// The number of bytes left in the stream after the current chunk header
	pub fn remaining(&self) -> u64 {
		self.remaining_size
	}

	/// Read the entire body of the current chunk, skipping the pad byte if present
	pub fn content<R>(&mut self, data: &mut R) -> Result<Vec<u8>>
	where
		R: Read + Seek,
	{
		if self.size > self.remaining_size {
			err!(SizeMismatch);
		}

		let mut content = try_vec![0; self.size as usize];
		data.read_exact(&mut content)?;

		self.remaining_size = self.remaining_size.saturating_sub(self.size);
		self.correct_position(data)?;

		Ok(content)
	}

	/// Record where the current chunk's body lives, and move past it
	pub fn range<R>(&mut self, data: &mut R) -> Result<ChunkRange>
	where
		R: Read + Seek,
	{
		let range = ChunkRange {
			offset: data.stream_position()?,
			size: self.size,
		};

		self.skip(data)?;
		Ok(range)
	}

	pub fn skip<R>(&mut self, data: &mut R) -> Result<()>
	where
		R: Read + Seek,
	{
		data.seek(SeekFrom::Current(self.size as i64))?;
		self.remaining_size = self.remaining_size.saturating_sub(self.size);

		self.correct_position(data)?;

		Ok(())
	}

	pub fn correct_position<R>(&mut self, data: &mut R) -> Result<()>
	where
		R: Read + Seek,
	{
		// Chunks are expected to start on even boundaries, and are padded
		// with a 0 if necessary. This is NOT the null terminator of the value,
		// and it is NOT included in the chunk's size
		if self.size % 2 != 0 && self.remaining_size > 0 {
			data.seek(SeekFrom::Current(1))?;
			self.remaining_size = self.remaining_size.saturating_sub(1);
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::{ChunkKind, Chunks};

	use std::io::Cursor;

	use byteorder::LittleEndian;

	#[test_log::test]
	fn walk_padded_chunks() {
		let mut stream = Vec::new();
		stream.extend(b"odd_");
		stream.extend(3u32.to_le_bytes());
		stream.extend(b"abc\0");
		stream.extend(b"even");
		stream.extend(2u32.to_le_bytes());
		stream.extend(b"de");

		let len = stream.len() as u64;
		let mut data = Cursor::new(stream);
		let mut chunks = Chunks::<LittleEndian>::new(len);

		assert!(chunks.next(&mut data).unwrap());
		assert_eq!(&chunks.fourcc, b"odd_");
		assert_eq!(chunks.content(&mut data).unwrap(), b"abc");

		assert!(chunks.next(&mut data).unwrap());
		assert_eq!(&chunks.fourcc, b"even");
		let range = chunks.range(&mut data).unwrap();
		assert_eq!(range.offset, 20);
		assert_eq!(range.size, 2);

		assert!(!chunks.next(&mut data).unwrap());
	}

	#[test_log::test]
	fn size_override() {
		let mut stream = Vec::new();
		stream.extend(b"data");
		stream.extend(u32::MAX.to_le_bytes());
		stream.extend([1, 2, 3, 4]);

		let len = stream.len() as u64;
		let mut data = Cursor::new(stream);
		let mut chunks = Chunks::<LittleEndian>::new(len);

		assert!(chunks.next(&mut data).unwrap());
		assert_eq!(chunks.declared_size, u32::MAX);
		assert!(chunks.content(&mut data).is_err());

		data.set_position(0);
		let mut chunks = Chunks::<LittleEndian>::new(len);
		assert!(chunks.next(&mut data).unwrap());
		chunks.override_size(4);
		assert_eq!(chunks.content(&mut data).unwrap(), [1, 2, 3, 4]);
	}

	#[test_log::test]
	fn fourcc_lookup() {
		for kind in [
			ChunkKind::Ds64,
			ChunkKind::Fmt,
			ChunkKind::Data,
			ChunkKind::Bext,
			ChunkKind::Chna,
			ChunkKind::R64m,
			ChunkKind::Axml,
			ChunkKind::Md5,
			ChunkKind::Levl,
		] {
			assert_eq!(ChunkKind::from_fourcc(&kind.fourcc()), Some(kind));
		}
	}
}
