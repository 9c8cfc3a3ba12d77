//! Sample accurate markers (`r64m`)
//!
//! The chunk body is a sequence of fixed size entries, each describing a single marker.

use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::{decode_err, encode_err};
use crate::util::text::{until_nul, windows_1252_decode, windows_1252_encode, write_fixed_text};

use std::io::Read;
use std::time::Duration;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

/// The size of a single marker entry
pub const MARKER_ENTRY_SIZE: usize = 320;

const LABEL_LEN: usize = 256;
const VENDOR_AND_PRODUCT_LEN: usize = 16;

/// The flags of a marker entry
///
/// # Examples
///
/// ```rust
/// use wave_bwf::r64m::MarkerFlags;
///
/// let flags = MarkerFlags::ENTRY_IS_VALID | MarkerFlags::LABEL_TEXT_IS_UTF_8;
/// assert!(flags.contains(MarkerFlags::ENTRY_IS_VALID));
/// assert!(!flags.contains(MarkerFlags::BYTE_OFFSET_IS_VALID));
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
#[repr(transparent)]
pub struct MarkerFlags(u32);

impl MarkerFlags {
	/// The entry describes a marker, entries without this flag are ignored
	pub const ENTRY_IS_VALID: Self = Self(1);
	/// The byte offset field is meaningful
	pub const BYTE_OFFSET_IS_VALID: Self = Self(1 << 1);
	/// The intra-sample offset field is meaningful
	pub const INTRA_SAMPLE_OFFSET_IS_VALID: Self = Self(1 << 2);
	/// The label lives in a separate `labl` chunk
	pub const LABEL_IS_IN_LABL_CHUNK: Self = Self(1 << 3);
	/// The label is UTF-8, rather than Windows-1252
	pub const LABEL_TEXT_IS_UTF_8: Self = Self(1 << 4);

	/// Create a flag set from its raw bits
	#[must_use]
	pub const fn from_bits(bits: u32) -> Self {
		Self(bits)
	}

	/// The raw bits
	#[must_use]
	pub const fn bits(self) -> u32 {
		self.0
	}

	/// Whether all flags in `other` are set
	#[must_use]
	pub const fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	fn set(&mut self, other: Self, value: bool) {
		if value {
			self.0 |= other.0;
		} else {
			self.0 &= !other.0;
		}
	}
}

impl std::ops::BitOr for MarkerFlags {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self::Output {
		Self(self.0 | rhs.0)
	}
}

/// A single marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
	flags: MarkerFlags,
	sample_offset: u64,
	time_offset: Duration,
	byte_offset: u64,
	intra_sample_offset: u64,
	label: String,
	label_chunk_id: u32,
	vendor_and_product: [u8; VENDOR_AND_PRODUCT_LEN],
	user_data: [u32; 4],
}

impl Marker {
	/// Create a marker at `sample_offset`, with a UTF-8 label
	///
	/// `sample_rate` is only used to derive [`Marker::time_offset`].
	///
	/// # Examples
	///
	/// ```rust
	/// use std::time::Duration;
	/// use wave_bwf::r64m::Marker;
	///
	/// let marker = Marker::new(95_520, 48000, "Intro ends");
	/// assert_eq!(marker.time_offset(), Duration::from_millis(1990));
	/// ```
	pub fn new(sample_offset: u64, sample_rate: u32, label: impl Into<String>) -> Self {
		Self {
			flags: MarkerFlags::ENTRY_IS_VALID | MarkerFlags::LABEL_TEXT_IS_UTF_8,
			sample_offset,
			time_offset: time_offset(sample_offset, sample_rate),
			byte_offset: 0,
			intra_sample_offset: 0,
			label: label.into(),
			label_chunk_id: 0,
			vendor_and_product: [0; VENDOR_AND_PRODUCT_LEN],
			user_data: [0; 4],
		}
	}

	/// The entry flags
	pub fn flags(&self) -> MarkerFlags {
		self.flags
	}

	/// The position of the marker, in frames
	pub fn sample_offset(&self) -> u64 {
		self.sample_offset
	}

	/// The position of the marker, as a duration from the start of the audio
	pub fn time_offset(&self) -> Duration {
		self.time_offset
	}

	/// The position of the marker in bytes, if [`MarkerFlags::BYTE_OFFSET_IS_VALID`] is set
	pub fn byte_offset(&self) -> Option<u64> {
		self.flags
			.contains(MarkerFlags::BYTE_OFFSET_IS_VALID)
			.then_some(self.byte_offset)
	}

	/// Set (or clear) the byte offset
	pub fn set_byte_offset(&mut self, byte_offset: Option<u64>) {
		self.flags
			.set(MarkerFlags::BYTE_OFFSET_IS_VALID, byte_offset.is_some());
		self.byte_offset = byte_offset.unwrap_or_default();
	}

	/// The offset within a compressed frame, if [`MarkerFlags::INTRA_SAMPLE_OFFSET_IS_VALID`] is set
	pub fn intra_sample_offset(&self) -> Option<u64> {
		self.flags
			.contains(MarkerFlags::INTRA_SAMPLE_OFFSET_IS_VALID)
			.then_some(self.intra_sample_offset)
	}

	/// Set (or clear) the intra-sample offset
	pub fn set_intra_sample_offset(&mut self, intra_sample_offset: Option<u64>) {
		self.flags.set(
			MarkerFlags::INTRA_SAMPLE_OFFSET_IS_VALID,
			intra_sample_offset.is_some(),
		);
		self.intra_sample_offset = intra_sample_offset.unwrap_or_default();
	}

	/// The label text
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Whether the label is stored as UTF-8 (otherwise Windows-1252)
	pub fn label_is_utf8(&self) -> bool {
		self.flags.contains(MarkerFlags::LABEL_TEXT_IS_UTF_8)
	}

	/// Choose between UTF-8 (`true`) and Windows-1252 (`false`) for the stored label
	pub fn set_label_utf8(&mut self, utf8: bool) {
		self.flags.set(MarkerFlags::LABEL_TEXT_IS_UTF_8, utf8);
	}

	/// The identifier of the `labl` chunk entry holding the label
	///
	/// Only meaningful when [`MarkerFlags::LABEL_IS_IN_LABL_CHUNK`] is set.
	pub fn label_chunk_id(&self) -> u32 {
		self.label_chunk_id
	}

	/// The vendor and product tag of the application that created the marker
	pub fn vendor_and_product(&self) -> &[u8; VENDOR_AND_PRODUCT_LEN] {
		&self.vendor_and_product
	}

	/// Application defined data
	pub fn user_data(&self) -> [u32; 4] {
		self.user_data
	}

	fn read<R>(reader: &mut R, sample_rate: u32, parse_mode: ParsingMode) -> Result<Self>
	where
		R: Read,
	{
		let flags = MarkerFlags(reader.read_u32::<LittleEndian>()?);
		let sample_offset = reader.read_u64::<LittleEndian>()?;
		let byte_offset = reader.read_u64::<LittleEndian>()?;
		let intra_sample_offset = reader.read_u64::<LittleEndian>()?;

		let mut label = [0; LABEL_LEN];
		reader.read_exact(&mut label)?;

		let label_chunk_id = reader.read_u32::<LittleEndian>()?;

		let mut vendor_and_product = [0; VENDOR_AND_PRODUCT_LEN];
		reader.read_exact(&mut vendor_and_product)?;

		let mut user_data = [0; 4];
		reader.read_u32_into::<LittleEndian>(&mut user_data)?;

		let label = decode_label(until_nul(&label), flags, parse_mode)?;

		Ok(Self {
			flags,
			sample_offset,
			time_offset: time_offset(sample_offset, sample_rate),
			byte_offset,
			intra_sample_offset,
			label,
			label_chunk_id,
			vendor_and_product,
			user_data,
		})
	}

	fn write(&self, out: &mut Vec<u8>) -> Result<()> {
		let label = if self.label_is_utf8() {
			self.label.as_bytes().to_vec()
		} else {
			match windows_1252_encode(&self.label) {
				Some(label) => label,
				None => encode_err!(@BAIL R64m, "Label can't be represented in Windows-1252"),
			}
		};

		if label.len() > LABEL_LEN {
			encode_err!(@BAIL R64m, "Label exceeds 256 bytes");
		}

		let _ = out.write_u32::<LittleEndian>(self.flags.0);
		let _ = out.write_u64::<LittleEndian>(self.sample_offset);
		let _ = out.write_u64::<LittleEndian>(self.byte_offset);
		let _ = out.write_u64::<LittleEndian>(self.intra_sample_offset);
		write_fixed_text(out, &label, LABEL_LEN);
		let _ = out.write_u32::<LittleEndian>(self.label_chunk_id);
		out.extend_from_slice(&self.vendor_and_product);
		for data in self.user_data {
			let _ = out.write_u32::<LittleEndian>(data);
		}

		Ok(())
	}
}

fn time_offset(sample_offset: u64, sample_rate: u32) -> Duration {
	if sample_rate == 0 {
		return Duration::ZERO;
	}

	let rate = u64::from(sample_rate);
	let nanos = (sample_offset % rate) * 1_000_000_000 / rate;
	Duration::new(sample_offset / rate, nanos as u32)
}

fn decode_label(label: &[u8], flags: MarkerFlags, parse_mode: ParsingMode) -> Result<String> {
	if !flags.contains(MarkerFlags::LABEL_TEXT_IS_UTF_8) {
		return Ok(windows_1252_decode(label));
	}

	match std::str::from_utf8(label) {
		Ok(label) => Ok(label.to_owned()),
		Err(_) => match parse_mode {
			ParsingMode::Strict => decode_err!(@BAIL R64m, "Label is flagged as UTF-8, but isn't valid"),
			ParsingMode::BestAttempt => {
				log::warn!("r64m: Label is not valid UTF-8, decoding as Windows-1252");
				Ok(windows_1252_decode(label))
			},
			ParsingMode::Relaxed => {
				log::warn!("r64m: Label is not valid UTF-8, discarding");
				Ok(String::new())
			},
		},
	}
}

/// The markers of an `r64m` chunk, in file order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkerSet {
	markers: Vec<Marker>,
}

impl MarkerSet {
	/// Create an empty set
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a marker
	pub fn push(&mut self, marker: Marker) {
		self.markers.push(marker);
	}

	/// All markers, in order
	pub fn markers(&self) -> &[Marker] {
		&self.markers
	}

	/// Get the marker at `index`
	pub fn get(&self, index: usize) -> Option<&Marker> {
		self.markers.get(index)
	}

	/// The number of markers
	pub fn len(&self) -> usize {
		self.markers.len()
	}

	/// Whether there are no markers
	pub fn is_empty(&self) -> bool {
		self.markers.is_empty()
	}

	/// Read an `r64m` chunk body
	///
	/// Entries without [`MarkerFlags::ENTRY_IS_VALID`] are dropped. `sample_rate` is used to derive
	/// each marker's time offset.
	///
	/// # Errors
	///
	/// * **(Strict)** The chunk ends with a partial entry
	/// * **(Strict)** A label flagged as UTF-8 is not valid UTF-8
	pub fn decode(content: &[u8], sample_rate: u32, parse_mode: ParsingMode) -> Result<Self> {
		let trailing = content.len() % MARKER_ENTRY_SIZE;
		if trailing != 0 {
			if parse_mode == ParsingMode::Strict {
				decode_err!(@BAIL R64m, "Chunk ends with a partial entry");
			}

			log::warn!("r64m: Ignoring {trailing} trailing bytes");
		}

		let mut markers = Vec::with_capacity(content.len() / MARKER_ENTRY_SIZE);
		for (index, mut entry) in content.chunks_exact(MARKER_ENTRY_SIZE).enumerate() {
			// Unused entries may hold anything past their flags
			let flags = MarkerFlags(LittleEndian::read_u32(entry));
			if !flags.contains(MarkerFlags::ENTRY_IS_VALID) {
				log::trace!("r64m: Skipping invalid entry #{index}");
				continue;
			}

			markers.push(Marker::read(&mut entry, sample_rate, parse_mode)?);
		}

		log::debug!("r64m: Found {} markers", markers.len());
		Ok(Self { markers })
	}

	/// Write an `r64m` chunk body
	///
	/// # Errors
	///
	/// * A label exceeds 256 bytes in its stored encoding
	/// * A Windows-1252 label contains characters outside of the code page
	pub fn encode(&self) -> Result<Vec<u8>> {
		let mut out = Vec::with_capacity(self.markers.len() * MARKER_ENTRY_SIZE);
		for marker in &self.markers {
			marker.write(&mut out)?;
		}

		Ok(out)
	}
}

impl From<Vec<Marker>> for MarkerSet {
	fn from(markers: Vec<Marker>) -> Self {
		Self { markers }
	}
}

impl<'a> IntoIterator for &'a MarkerSet {
	type Item = &'a Marker;
	type IntoIter = std::slice::Iter<'a, Marker>;

	fn into_iter(self) -> Self::IntoIter {
		self.markers.iter()
	}
}
