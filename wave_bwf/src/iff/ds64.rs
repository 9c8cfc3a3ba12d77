//! RF64 `ds64` chunk

use crate::error::Result;
use crate::macros::decode_err;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Size of a `ds64` body without a size table
pub(crate) const DS64_BODY_SIZE: u32 = 28;

/// The RF64 64-bit size extension (`ds64`)
///
/// RF64 files store sentinel values in the 32-bit RIFF and `data` size fields, the true sizes are
/// stored here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Ds64 {
	pub(crate) riff_size: u64,
	pub(crate) data_size: u64,
	pub(crate) sample_count: u64,
	pub(crate) table_length: u32,
}

impl Ds64 {
	/// Create a `ds64` chunk with no size table
	pub fn new(riff_size: u64, data_size: u64, sample_count: u64) -> Self {
		Self {
			riff_size,
			data_size,
			sample_count,
			table_length: 0,
		}
	}

	/// Size of the `RF64` form, not including the 8-byte `RF64` header
	pub fn riff_size(&self) -> u64 {
		self.riff_size
	}

	/// Size of the `data` chunk body
	pub fn data_size(&self) -> u64 {
		self.data_size
	}

	/// Number of frames in the `data` chunk
	pub fn sample_count(&self) -> u64 {
		self.sample_count
	}

	/// Number of entries in the size table following the fixed fields
	pub fn table_length(&self) -> u32 {
		self.table_length
	}

	/// Read a `ds64` chunk body
	///
	/// The size table (used for chunks other than `data` exceeding 4 GiB) is not interpreted.
	///
	/// # Errors
	///
	/// * `content` is shorter than 28 bytes
	pub fn decode(mut content: &[u8]) -> Result<Self> {
		if content.len() < DS64_BODY_SIZE as usize {
			decode_err!(@BAIL Ds64, "Chunk is too short to hold the 64-bit sizes");
		}

		let riff_size = content.read_u64::<LittleEndian>()?;
		let data_size = content.read_u64::<LittleEndian>()?;
		let sample_count = content.read_u64::<LittleEndian>()?;
		let table_length = content.read_u32::<LittleEndian>()?;

		if table_length > 0 {
			log::debug!("ds64: Ignoring size table with {table_length} entries");
		}

		Ok(Self {
			riff_size,
			data_size,
			sample_count,
			table_length,
		})
	}

	/// Write a `ds64` chunk body
	///
	/// The table length is always written as 0, as no size table is written.
	pub fn encode(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(DS64_BODY_SIZE as usize);

		// Writing into a `Vec` is infallible
		let _ = out.write_u64::<LittleEndian>(self.riff_size);
		let _ = out.write_u64::<LittleEndian>(self.data_size);
		let _ = out.write_u64::<LittleEndian>(self.sample_count);
		let _ = out.write_u32::<LittleEndian>(0);

		out
	}
}

#[cfg(test)]
mod tests {
	use super::Ds64;

	#[test_log::test]
	fn decode_sizes() {
		let mut content = Vec::new();
		content.extend(5_000_000_036_u64.to_le_bytes());
		content.extend(5_000_000_000_u64.to_le_bytes());
		content.extend(1_250_000_000_u64.to_le_bytes());
		content.extend(0_u32.to_le_bytes());

		let ds64 = Ds64::decode(&content).unwrap();
		assert_eq!(ds64.riff_size(), 5_000_000_036);
		assert_eq!(ds64.data_size(), 5_000_000_000);
		assert_eq!(ds64.sample_count(), 1_250_000_000);
		assert_eq!(ds64.table_length(), 0);

		assert_eq!(ds64.encode(), content);
	}

	#[test_log::test]
	fn short_chunk() {
		assert!(Ds64::decode(&[0; 20]).unwrap_err().is_format_error());
	}
}
