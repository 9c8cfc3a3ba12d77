//! The `fmt ` chunk

use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::{decode_err, encode_err};

pub use super::channel_mask::ChannelMask;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

const PCM: u16 = 0x0001;
const EXTENSIBLE: u16 = 0xFFFE;

// Size of the extension following `bits_per_sample` in an extensible `fmt ` chunk
const EXTENSIBLE_CB_SIZE: u16 = 22;

const PCM_FMT_SIZE: usize = 16;
const EXTENSIBLE_FMT_SIZE: usize = 40;

/// `KSDATAFORMAT_SUBTYPE_PCM` (00000001-0000-0010-8000-00aa00389b71), as four little endian words
pub const PCM_SUB_FORMAT: [u32; 4] = [0x0000_0001, 0x0010_0000, 0xAA00_0080, 0x719B_3800];

/// The format tags `wave_bwf` understands
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FormatTag {
	/// `WAVE_FORMAT_PCM`
	Pcm,
	/// `WAVE_FORMAT_EXTENSIBLE`
	Extensible,
}

impl FormatTag {
	/// The raw `wFormatTag` value
	pub fn as_u16(self) -> u16 {
		match self {
			Self::Pcm => PCM,
			Self::Extensible => EXTENSIBLE,
		}
	}
}

/// The `WAVE_FORMAT_EXTENSIBLE` specific fields
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtensibleFormat {
	/// Number of significant bits in each sample container
	pub valid_bits_per_sample: u16,
	/// Speaker assignment of the channels
	pub channel_mask: ChannelMask,
	/// The sub-format GUID, as four little endian words
	pub sub_format: [u32; 4],
}

/// A decoded `fmt ` chunk
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AudioFormat {
	pub(crate) format_tag: FormatTag,
	pub(crate) channels: u16,
	pub(crate) sample_rate: u32,
	pub(crate) bytes_per_second: u32,
	pub(crate) block_align: u16,
	pub(crate) bits_per_sample: u16,
	pub(crate) extensible: Option<ExtensibleFormat>,
}

impl AudioFormat {
	/// Describe a `WAVE_FORMAT_PCM` stream
	///
	/// # Errors
	///
	/// * The block alignment (`channels * sample_width`) or the bit depth doesn't fit in 16 bits
	/// * The byte rate doesn't fit in 32 bits
	///
	/// # Examples
	///
	/// ```rust
	/// # fn main() -> wave_bwf::error::Result<()> {
	/// use wave_bwf::iff::fmt::AudioFormat;
	///
	/// let format = AudioFormat::pcm(2, 48000, 3)?;
	/// assert_eq!(format.bits_per_sample(), 24);
	/// assert_eq!(format.frame_size(), 6);
	/// assert_eq!(format.bytes_per_second(), 288_000);
	///
	/// assert!(AudioFormat::pcm(u16::MAX, 48000, 4).is_err());
	/// # Ok(()) }
	/// ```
	pub fn pcm(channels: u16, sample_rate: u32, sample_width: u16) -> Result<Self> {
		let Some(block_align) = channels.checked_mul(sample_width) else {
			encode_err!(@BAIL Fmt, "Block alignment exceeds 16 bits");
		};

		let Some(bits_per_sample) = sample_width.checked_mul(8) else {
			encode_err!(@BAIL Fmt, "Bits per sample exceeds 16 bits");
		};

		let Some(bytes_per_second) = sample_rate.checked_mul(u32::from(block_align)) else {
			encode_err!(@BAIL Fmt, "Byte rate exceeds 32 bits");
		};

		Ok(Self {
			format_tag: FormatTag::Pcm,
			channels,
			sample_rate,
			bytes_per_second,
			block_align,
			bits_per_sample,
			extensible: None,
		})
	}

	/// Describe a `WAVE_FORMAT_EXTENSIBLE` stream with a PCM sub-format
	///
	/// # Errors
	///
	/// * See [`AudioFormat::pcm`]
	/// * `valid_bits_per_sample` is larger than the sample container
	pub fn extensible_pcm(
		channels: u16,
		sample_rate: u32,
		sample_width: u16,
		valid_bits_per_sample: u16,
		channel_mask: ChannelMask,
	) -> Result<Self> {
		let pcm = Self::pcm(channels, sample_rate, sample_width)?;
		if valid_bits_per_sample > pcm.bits_per_sample {
			encode_err!(@BAIL Fmt, "Valid bits per sample exceed the sample container");
		}

		Ok(Self {
			format_tag: FormatTag::Extensible,
			extensible: Some(ExtensibleFormat {
				valid_bits_per_sample,
				channel_mask,
				sub_format: PCM_SUB_FORMAT,
			}),
			..pcm
		})
	}

	/// The format tag
	pub fn format_tag(&self) -> FormatTag {
		self.format_tag
	}

	/// Channel count
	pub fn channels(&self) -> u16 {
		self.channels
	}

	/// Sample rate (Hz)
	pub fn sample_rate(&self) -> u32 {
		self.sample_rate
	}

	/// Average bytes per second, as declared
	pub fn bytes_per_second(&self) -> u32 {
		self.bytes_per_second
	}

	/// Block alignment, as declared
	pub fn block_align(&self) -> u16 {
		self.block_align
	}

	/// Bits per sample (container size)
	pub fn bits_per_sample(&self) -> u16 {
		self.bits_per_sample
	}

	/// Bytes per sample, `bits_per_sample` rounded up to whole bytes
	pub fn sample_width(&self) -> u16 {
		self.bits_per_sample.div_ceil(8)
	}

	/// Bytes per frame, `channels * sample_width`
	pub fn frame_size(&self) -> u64 {
		u64::from(self.channels) * u64::from(self.sample_width())
	}

	/// The extensible fields, only present for [`FormatTag::Extensible`]
	pub fn extensible(&self) -> Option<&ExtensibleFormat> {
		self.extensible.as_ref()
	}

	/// Read a `fmt ` chunk body
	///
	/// # Errors
	///
	/// * `content` is too short for its format tag
	/// * The format tag is anything other than `WAVE_FORMAT_PCM` or `WAVE_FORMAT_EXTENSIBLE`
	/// * An extensible chunk does not have a `cbSize` of 22
	/// * The channel count or sample size is 0
	/// * **(Strict)** An extensible sub-format other than PCM
	pub fn decode(mut content: &[u8], parse_mode: ParsingMode) -> Result<Self> {
		let len = content.len();
		if len < PCM_FMT_SIZE {
			decode_err!(@BAIL Fmt, "Chunk is too short (< 16)");
		}

		let format_tag = content.read_u16::<LittleEndian>()?;
		let channels = content.read_u16::<LittleEndian>()?;
		let sample_rate = content.read_u32::<LittleEndian>()?;
		let bytes_per_second = content.read_u32::<LittleEndian>()?;
		let block_align = content.read_u16::<LittleEndian>()?;
		let bits_per_sample = content.read_u16::<LittleEndian>()?;

		let mut format = Self {
			format_tag: FormatTag::Pcm,
			channels,
			sample_rate,
			bytes_per_second,
			block_align,
			bits_per_sample,
			extensible: None,
		};

		match format_tag {
			PCM => {},
			EXTENSIBLE => {
				if len < EXTENSIBLE_FMT_SIZE {
					decode_err!(@BAIL Fmt, "Extensible format identified, invalid chunk size found (< 40)");
				}

				let cb_size = content.read_u16::<LittleEndian>()?;
				if cb_size != EXTENSIBLE_CB_SIZE {
					decode_err!(@BAIL Fmt, "Extensible format identified, wrong cbSize (expected 22)");
				}

				let valid_bits_per_sample = content.read_u16::<LittleEndian>()?;
				let channel_mask = ChannelMask(content.read_u32::<LittleEndian>()?);

				let mut sub_format = [0; 4];
				content.read_u32_into::<LittleEndian>(&mut sub_format)?;

				if sub_format[0] != PCM_SUB_FORMAT[0] {
					if parse_mode == ParsingMode::Strict {
						decode_err!(@BAIL Fmt, "Extensible sub-format is not PCM");
					}

					log::warn!(
						"Extensible sub-format {:#06x} is not PCM, passing samples through unchanged",
						sub_format[0]
					);
				}

				format.format_tag = FormatTag::Extensible;
				format.extensible = Some(ExtensibleFormat {
					valid_bits_per_sample,
					channel_mask,
					sub_format,
				});
			},
			_ => decode_err!(@BAIL Fmt, "Unsupported format tag, only PCM and EXTENSIBLE are supported"),
		}

		if channels == 0 {
			decode_err!(@BAIL Fmt, "File contains 0 channels");
		}

		if bits_per_sample == 0 {
			decode_err!(@BAIL Fmt, "File has a sample size of 0 bits");
		}

		log::debug!(
			"fmt: {:?}, {} channel(s), {} Hz, {} bits per sample",
			format.format_tag,
			channels,
			sample_rate,
			bits_per_sample
		);

		Ok(format)
	}

	/// Write a `fmt ` chunk body
	pub fn encode(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(EXTENSIBLE_FMT_SIZE);

		// Writing into a `Vec` is infallible
		let _ = out.write_u16::<LittleEndian>(self.format_tag.as_u16());
		let _ = out.write_u16::<LittleEndian>(self.channels);
		let _ = out.write_u32::<LittleEndian>(self.sample_rate);
		let _ = out.write_u32::<LittleEndian>(self.bytes_per_second);
		let _ = out.write_u16::<LittleEndian>(self.block_align);
		let _ = out.write_u16::<LittleEndian>(self.bits_per_sample);

		if let (FormatTag::Extensible, Some(extensible)) = (self.format_tag, &self.extensible) {
			let _ = out.write_u16::<LittleEndian>(EXTENSIBLE_CB_SIZE);
			let _ = out.write_u16::<LittleEndian>(extensible.valid_bits_per_sample);
			let _ = out.write_u32::<LittleEndian>(extensible.channel_mask.bits());
			for word in extensible.sub_format {
				let _ = out.write_u32::<LittleEndian>(word);
			}
		}

		out
	}
}
