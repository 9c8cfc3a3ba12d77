use super::{CompressionType, ContainerLayout, WaveParams};
use crate::bext::{Bext, generate_coding_history};
use crate::chna::ChannelUidMap;
use crate::config::WriteOptions;
use crate::error::{BwfError, ErrorKind, Result, StateError};
use crate::iff::chunk::{ChunkKind, RF64_SIZE_SENTINEL, RIFF_CHUNK_HEADER_SIZE};
use crate::iff::ds64::{DS64_BODY_SIZE, Ds64};
use crate::iff::fmt::{AudioFormat, ChannelMask};
use crate::macros::state_err;
use crate::r64m::MarkerSet;
use crate::util::io::{Stream, normalize_sample_order};

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

// Absolute stream offsets of the fields patched on close
#[derive(Debug, Copy, Clone)]
struct Header {
	layout: ContainerLayout,
	/// Offset of the `RIFF`/`RF64` fourcc
	start: u64,
	/// Offset of the `ds64` body
	ds64: Option<u64>,
	/// Offset of the `data` size field
	data_size: u64,
	/// Offset of the first frame
	data_start: u64,
	/// Offset of the `bext` body
	bext: Option<u64>,
	/// The `data` size the header currently claims
	declared_len: u64,
}

/// A streaming writer for `RIFF`/`RF64` WAVE files
///
/// Parameters are set first, then any chunks that live before the frames (`bext` and `chna`).
/// The header is written on the first frame write (or [`WaveWriter::close`]), at which point the
/// layout is chosen and the parameters can no longer change. Closing the writer patches the
/// header sizes, and appends the `axml`, `levl`, `MD5 `, and `r64m` chunks after the frames.
///
/// # Examples
///
/// ```rust
/// # fn main() -> wave_bwf::error::Result<()> {
/// use std::io::Cursor;
/// use wave_bwf::bext::Bext;
/// use wave_bwf::wave::WaveWriter;
///
/// let mut file = Cursor::new(Vec::new());
///
/// let mut writer = WaveWriter::from_handle(&mut file);
/// writer.set_channels(2)?;
/// writer.set_sample_width(2)?;
/// writer.set_sample_rate(48000)?;
/// writer.set_bext(Bext::new())?;
///
/// writer.write_frames(&[0; 4 * 480])?;
///
/// // Loudness can be attached once all frames have been seen
/// if let Some(bext) = writer.bext_mut() {
/// 	bext.set_loudness_value(Some(-23.0));
/// }
///
/// writer.close()?;
/// # Ok(()) }
/// ```
pub struct WaveWriter<'a, S>
where
	S: Write + Seek,
{
	stream: Option<Stream<'a, S>>,
	options: WriteOptions,
	channels: Option<u16>,
	sample_width: Option<u16>,
	sample_rate: Option<u32>,
	declared_frames: Option<u64>,
	compression: CompressionType,
	header: Option<Header>,
	data_written: u64,
	frames_written: u64,
	bext: Option<Bext>,
	chna: Option<ChannelUidMap>,
	axml: Option<Vec<u8>>,
	levl: Option<Vec<u8>>,
	md5: Option<[u8; 16]>,
	markers: Option<MarkerSet>,
}

impl WaveWriter<'static, File> {
	/// Create (or truncate) the file at `path`
	///
	/// The file is closed when the writer is closed (or dropped).
	///
	/// # Errors
	///
	/// * The file could not be created
	pub fn create<P>(path: P) -> Result<Self>
	where
		P: AsRef<Path>,
	{
		Self::create_with_options(path, WriteOptions::new())
	}

	/// Create (or truncate) the file at `path` with the specified [`WriteOptions`]
	///
	/// # Errors
	///
	/// * The file could not be created
	pub fn create_with_options<P>(path: P, write_options: WriteOptions) -> Result<Self>
	where
		P: AsRef<Path>,
	{
		let file = File::create(path)?;
		Ok(Self::new_owned_with_options(file, write_options))
	}
}

impl<S> WaveWriter<'static, S>
where
	S: Write + Seek,
{
	/// Write to a stream the writer takes ownership of
	pub fn new_owned(stream: S) -> Self {
		Self::new_owned_with_options(stream, WriteOptions::new())
	}

	/// Write to a stream the writer takes ownership of, with the specified [`WriteOptions`]
	pub fn new_owned_with_options(stream: S, write_options: WriteOptions) -> Self {
		Self::new(Stream::Owned(stream), write_options)
	}
}

impl<'a, S> WaveWriter<'a, S>
where
	S: Write + Seek,
{
	/// Write to a borrowed stream, starting at its current position
	///
	/// Closing the writer finalizes the file and releases the borrow, the stream itself is left
	/// open.
	pub fn from_handle(stream: &'a mut S) -> Self {
		Self::from_handle_with_options(stream, WriteOptions::new())
	}

	/// Write to a borrowed stream, with the specified [`WriteOptions`]
	pub fn from_handle_with_options(stream: &'a mut S, write_options: WriteOptions) -> Self {
		Self::new(Stream::Borrowed(stream), write_options)
	}

	fn new(stream: Stream<'a, S>, options: WriteOptions) -> Self {
		Self {
			stream: Some(stream),
			options,
			channels: None,
			sample_width: None,
			sample_rate: None,
			declared_frames: None,
			compression: CompressionType::None,
			header: None,
			data_written: 0,
			frames_written: 0,
			bext: None,
			chna: None,
			axml: None,
			levl: None,
			md5: None,
			markers: None,
		}
	}

	fn check_configurable(&self) -> Result<()> {
		if self.stream.is_none() {
			state_err!(Closed);
		}

		if self.header.is_some() {
			state_err!(ParametersFrozen);
		}

		Ok(())
	}

	/// Set the number of interleaved channels
	///
	/// # Errors
	///
	/// * The header has already been written
	/// * `channels` is 0
	pub fn set_channels(&mut self, channels: u16) -> Result<()> {
		self.check_configurable()?;
		if channels == 0 {
			state_err!(InvalidParameter("channels"));
		}

		self.channels = Some(channels);
		Ok(())
	}

	/// Set the number of bytes per sample
	///
	/// # Errors
	///
	/// * The header has already been written
	/// * `sample_width` is not within `1..=4`
	pub fn set_sample_width(&mut self, sample_width: u16) -> Result<()> {
		self.check_configurable()?;
		if !(1..=4).contains(&sample_width) {
			state_err!(InvalidParameter("sample_width"));
		}

		self.sample_width = Some(sample_width);
		Ok(())
	}

	/// Set the number of frames per second
	///
	/// # Errors
	///
	/// * The header has already been written
	/// * `sample_rate` is 0
	pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<()> {
		self.check_configurable()?;
		if sample_rate == 0 {
			state_err!(InvalidParameter("sample_rate"));
		}

		self.sample_rate = Some(sample_rate);
		Ok(())
	}

	/// Declare the number of frames that will be written
	///
	/// This is only used to choose the layout and pre-fill the header. The header is corrected
	/// on close if a different number of frames was written.
	///
	/// # Errors
	///
	/// * The header has already been written
	pub fn set_frame_count(&mut self, frame_count: u64) -> Result<()> {
		self.check_configurable()?;
		self.declared_frames = Some(frame_count);
		Ok(())
	}

	/// Set the sample compression
	///
	/// Use [`CompressionType::from_str`](std::str::FromStr::from_str) to validate a compression
	/// identifier, only `NONE` is accepted.
	///
	/// # Errors
	///
	/// * The header has already been written
	pub fn set_compression_type(&mut self, compression: CompressionType) -> Result<()> {
		self.check_configurable()?;
		self.compression = compression;
		Ok(())
	}

	/// Set all parameters at once
	///
	/// # Errors
	///
	/// See the individual setters
	pub fn set_params(&mut self, params: WaveParams) -> Result<()> {
		self.set_channels(params.channels)?;
		self.set_sample_width(params.sample_width)?;
		self.set_sample_rate(params.sample_rate)?;
		self.set_frame_count(params.frame_count)?;
		self.set_compression_type(params.compression)
	}

	/// The number of interleaved channels
	///
	/// # Errors
	///
	/// * The channel count was never set
	pub fn channels(&self) -> Result<u16> {
		self.channels
			.ok_or(BwfError::from(StateError::ParameterNotSet("channels")))
	}

	/// The number of bytes per sample
	///
	/// # Errors
	///
	/// * The sample width was never set
	pub fn sample_width(&self) -> Result<u16> {
		self.sample_width
			.ok_or(BwfError::from(StateError::ParameterNotSet("sample_width")))
	}

	/// The number of frames per second
	///
	/// # Errors
	///
	/// * The sample rate was never set
	pub fn sample_rate(&self) -> Result<u32> {
		self.sample_rate
			.ok_or(BwfError::from(StateError::ParameterNotSet("sample_rate")))
	}

	/// The number of frames written so far
	pub fn frame_count(&self) -> u64 {
		self.frames_written
	}

	/// The sample compression
	pub fn compression_type(&self) -> CompressionType {
		self.compression
	}

	/// All parameters at once
	///
	/// The frame count is the declared frame count, or the number of frames written so far if
	/// none was declared.
	///
	/// # Errors
	///
	/// * The channel count, sample width, or sample rate was never set
	pub fn params(&self) -> Result<WaveParams> {
		Ok(WaveParams {
			channels: self.channels()?,
			sample_width: self.sample_width()?,
			sample_rate: self.sample_rate()?,
			frame_count: self.declared_frames.unwrap_or(self.frames_written),
			compression: self.compression,
		})
	}

	/// The number of frames written so far
	pub fn tell(&self) -> u64 {
		self.frames_written
	}

	fn check_pre_data_chunk(&self, kind: ChunkKind) -> Result<()> {
		if self.stream.is_none() {
			state_err!(Closed);
		}

		if self.header.is_some() {
			state_err!(MetadataFrozen(kind));
		}

		Ok(())
	}

	fn check_open(&self) -> Result<()> {
		if self.stream.is_none() {
			state_err!(Closed);
		}

		Ok(())
	}

	/// Stage a `bext` chunk, written alongside the header
	///
	/// If the chunk has no coding history, one is generated from the parameters when the header
	/// is written.
	///
	/// # Errors
	///
	/// * The header has already been written
	pub fn set_bext(&mut self, bext: Bext) -> Result<()> {
		self.check_pre_data_chunk(ChunkKind::Bext)?;
		self.bext = Some(bext);
		Ok(())
	}

	/// The staged `bext` chunk
	///
	/// After the header has been written, only the version and loudness fields are updated on
	/// close.
	pub fn bext_mut(&mut self) -> Option<&mut Bext> {
		self.bext.as_mut()
	}

	/// Append a coding history line describing the current parameters to the staged `bext` chunk
	///
	/// An empty `bext` chunk is staged if there is none.
	///
	/// # Errors
	///
	/// * The header has already been written
	/// * The channel count, sample width, or sample rate was never set
	pub fn append_coding_history(&mut self) -> Result<()> {
		self.check_pre_data_chunk(ChunkKind::Bext)?;
		let line = self.coding_history_line()?;

		self.bext
			.get_or_insert_with(Bext::new)
			.append_coding_history(&line);
		Ok(())
	}

	fn coding_history_line(&self) -> Result<String> {
		Ok(generate_coding_history(
			self.sample_rate()?,
			self.sample_width()?,
			self.channels()?,
			self.options.tool_name,
			self.options.tool_version,
		))
	}

	/// Stage a `chna` chunk, written alongside the header
	///
	/// # Errors
	///
	/// * The header has already been written
	pub fn set_chna(&mut self, chna: ChannelUidMap) -> Result<()> {
		self.check_pre_data_chunk(ChunkKind::Chna)?;
		self.chna = Some(chna);
		Ok(())
	}

	/// Stage an `axml` chunk, written after the frames on close
	///
	/// # Errors
	///
	/// * The writer is closed
	pub fn set_axml(&mut self, axml: impl Into<Vec<u8>>) -> Result<()> {
		self.check_open()?;
		self.axml = Some(axml.into());
		Ok(())
	}

	/// Stage a `levl` chunk, written after the frames on close
	///
	/// # Errors
	///
	/// * The writer is closed
	pub fn set_levl(&mut self, levl: impl Into<Vec<u8>>) -> Result<()> {
		self.check_open()?;
		self.levl = Some(levl.into());
		Ok(())
	}

	/// Stage an `MD5 ` chunk, written (reversed) after the frames on close
	///
	/// # Errors
	///
	/// * The writer is closed
	pub fn set_md5(&mut self, digest: [u8; 16]) -> Result<()> {
		self.check_open()?;
		self.md5 = Some(digest);
		Ok(())
	}

	/// Stage an `r64m` chunk, written after the frames on close
	///
	/// # Errors
	///
	/// * The writer is closed
	pub fn set_markers(&mut self, markers: MarkerSet) -> Result<()> {
		self.check_open()?;
		self.markers = Some(markers);
		Ok(())
	}

	fn frame_size(&self) -> Result<u64> {
		Ok(u64::from(self.channels()?) * u64::from(self.sample_width()?))
	}

	/// Write frames, then correct the header if it no longer matches
	///
	/// Passing an empty slice only corrects the header.
	///
	/// # Errors
	///
	/// See [`WaveWriter::write_raw_frames`]
	pub fn write_frames(&mut self, frames: &[u8]) -> Result<()> {
		self.write_raw_frames(frames)?;

		let data_written = self.data_written;
		if self
			.header
			.is_some_and(|header| header.declared_len != data_written)
		{
			self.patch_header(0, 0)?;
		}

		Ok(())
	}

	/// Write frames without touching the header
	///
	/// `frames` holds interleaved samples in the byte order of the host. The header is written
	/// first if this is the first write.
	///
	/// # Errors
	///
	/// * The writer is closed
	/// * The channel count, sample width, or sample rate was never set
	/// * `frames` does not hold a whole number of frames
	/// * A `RIFF` file would exceed 4 GiB
	/// * The stream could not be written
	pub fn write_raw_frames(&mut self, frames: &[u8]) -> Result<()> {
		self.check_open()?;

		let frame_size = self.frame_size()?;
		if frames.len() as u64 % frame_size != 0 {
			state_err!(PartialFrame {
				len: frames.len(),
				frame_size: frame_size as usize,
			});
		}

		let header = self.ensure_header(frames.len() as u64)?;
		if header.layout == ContainerLayout::Riff {
			let form_size =
				riff_form_size(&header, self.data_written + frames.len() as u64, 0);
			if form_size > u64::from(u32::MAX) {
				log::warn!("RIFF size limit reached, declare the frame count to write RF64");
				return Err(BwfError::new(ErrorKind::TooMuchData));
			}
		}

		let sample_width = usize::from(self.sample_width()?);
		let Some(stream) = self.stream.as_mut() else {
			state_err!(Closed);
		};

		if cfg!(target_endian = "big") {
			let mut frames = frames.to_vec();
			normalize_sample_order(&mut frames, sample_width);
			stream.write_all(&frames)?;
		} else {
			stream.write_all(frames)?;
		}

		self.data_written += frames.len() as u64;
		self.frames_written += frames.len() as u64 / frame_size;
		Ok(())
	}

	fn ensure_header(&mut self, first_write_len: u64) -> Result<Header> {
		if let Some(header) = self.header {
			return Ok(header);
		}

		let channels = self.channels()?;
		let sample_width = self.sample_width()?;
		let sample_rate = self.sample_rate()?;

		if u32::from(channels) * u32::from(sample_width) > u32::from(u16::MAX) {
			state_err!(InvalidParameter("channels"));
		}

		let frame_size = u64::from(channels) * u64::from(sample_width);
		let declared_frames = self
			.declared_frames
			.unwrap_or(first_write_len / frame_size);
		let declared_len = declared_frames * frame_size;

		let layout = ContainerLayout::for_payload(declared_len, self.options.rf64_threshold);
		log::debug!("Writing {layout:?} header, expecting {declared_len} bytes of frames");

		if let Some(bext) = self
			.bext
			.as_mut()
			.filter(|bext| bext.coding_history().is_empty())
		{
			bext.set_coding_history(generate_coding_history(
				sample_rate,
				sample_width,
				channels,
				self.options.tool_name,
				self.options.tool_version,
			));
		}

		let Some(stream) = self.stream.as_mut() else {
			state_err!(Closed);
		};

		let start = stream.stream_position()?;

		let mut out = Vec::new();
		out.extend_from_slice(&layout.fourcc());
		// Patched once the final size is known
		let _ = out.write_u32::<LittleEndian>(RF64_SIZE_SENTINEL);
		out.extend_from_slice(b"WAVE");

		let mut ds64 = None;
		if layout == ContainerLayout::Rf64 {
			ds64 = Some(start + out.len() as u64 + RIFF_CHUNK_HEADER_SIZE);
			// Sizes are estimated here, and corrected on close
			write_chunk(&mut out, ChunkKind::Ds64, &[0; DS64_BODY_SIZE as usize]);
		}

		let format = if self.options.extensible_format {
			AudioFormat::extensible_pcm(
				channels,
				sample_rate,
				sample_width,
				sample_width * 8,
				ChannelMask::for_channels(channels),
			)?
		} else {
			AudioFormat::pcm(channels, sample_rate, sample_width)?
		};
		write_chunk(&mut out, ChunkKind::Fmt, &format.encode());

		let mut bext = None;
		if let Some(chunk) = self.bext.as_ref() {
			bext = Some(start + out.len() as u64 + RIFF_CHUNK_HEADER_SIZE);
			write_chunk(&mut out, ChunkKind::Bext, &chunk.encode());
		}

		if let Some(chna) = self.chna.as_ref() {
			write_chunk(&mut out, ChunkKind::Chna, &chna.encode());
		}

		out.extend_from_slice(&ChunkKind::Data.fourcc());
		let data_size = start + out.len() as u64;
		let _ = out.write_u32::<LittleEndian>(match layout {
			ContainerLayout::Riff => declared_len.min(u64::from(u32::MAX)) as u32,
			ContainerLayout::Rf64 => RF64_SIZE_SENTINEL,
		});

		let header = Header {
			layout,
			start,
			ds64,
			data_size,
			data_start: start + out.len() as u64,
			bext,
			declared_len,
		};

		match layout {
			ContainerLayout::Riff => {
				let form_size = riff_form_size(&header, declared_len, 0);
				let form_size = form_size.min(u64::from(u32::MAX)) as u32;
				out[4..8].copy_from_slice(&form_size.to_le_bytes());
			},
			ContainerLayout::Rf64 => {
				let body = Ds64::new(
					riff_form_size(&header, declared_len, 0),
					declared_len,
					declared_frames,
				)
				.encode();
				let offset = (header.ds64.unwrap_or_default() - start) as usize;
				out[offset..offset + body.len()].copy_from_slice(&body);
			},
		}

		stream.write_all(&out)?;

		self.header = Some(header);
		Ok(header)
	}

	// Rewrite the size fields, and the mutable `bext` fields, then return to the end of the stream
	fn patch_header(&mut self, pad_len: u64, trailing_len: u64) -> Result<()> {
		let Some(mut header) = self.header else {
			return Ok(());
		};

		let Some(stream) = self.stream.as_mut() else {
			state_err!(Closed);
		};

		let form_size = riff_form_size(&header, self.data_written + pad_len, trailing_len);
		log::debug!(
			"Patching {:?} header: form size {form_size}, {} bytes of frames",
			header.layout,
			self.data_written
		);

		let end = stream.stream_position()?;

		match header.layout {
			ContainerLayout::Riff => {
				let Ok(form_size) = u32::try_from(form_size) else {
					return Err(BwfError::new(ErrorKind::TooMuchData));
				};

				stream.seek(SeekFrom::Start(header.start + 4))?;
				stream.write_u32::<LittleEndian>(form_size)?;
				stream.seek(SeekFrom::Start(header.data_size))?;
				stream.write_u32::<LittleEndian>(self.data_written as u32)?;
			},
			ContainerLayout::Rf64 => {
				let ds64 = Ds64::new(form_size, self.data_written, self.frames_written);
				stream.seek(SeekFrom::Start(header.ds64.unwrap_or_default()))?;
				stream.write_all(&ds64.encode())?;
			},
		}

		if let (Some(offset), Some(bext)) = (header.bext, self.bext.as_ref()) {
			stream.seek(SeekFrom::Start(offset + crate::bext::VERSION_OFFSET))?;
			stream.write_u16::<LittleEndian>(bext.version())?;
			stream.seek(SeekFrom::Start(offset + crate::bext::LOUDNESS_OFFSET))?;
			stream.write_all(&bext.encoded_loudness())?;
		}

		stream.seek(SeekFrom::Start(end))?;

		header.declared_len = self.data_written;
		self.header = Some(header);
		Ok(())
	}

	fn trailing_chunks(&self) -> Result<Vec<u8>> {
		let mut out = Vec::new();

		if let Some(axml) = self.axml.as_deref() {
			write_space_padded_chunk(&mut out, ChunkKind::Axml, axml);
		}

		if let Some(levl) = self.levl.as_deref() {
			write_space_padded_chunk(&mut out, ChunkKind::Levl, levl);
		}

		if let Some(mut digest) = self.md5 {
			digest.reverse();
			write_chunk(&mut out, ChunkKind::Md5, &digest);
		}

		if let Some(markers) = self.markers.as_ref() {
			write_chunk(&mut out, ChunkKind::R64m, &markers.encode()?);
		}

		Ok(out)
	}

	fn finalize(&mut self) -> Result<()> {
		self.ensure_header(0)?;

		let trailing = self.trailing_chunks()?;

		let Some(stream) = self.stream.as_mut() else {
			state_err!(Closed);
		};

		let pad_len = self.data_written % 2;
		if pad_len != 0 {
			stream.write_all(&[0])?;
		}

		self.patch_header(pad_len, trailing.len() as u64)?;

		let Some(stream) = self.stream.as_mut() else {
			state_err!(Closed);
		};

		stream.write_all(&trailing)?;
		stream.flush()?;
		Ok(())
	}

	/// Finalize the file and release the stream
	///
	/// The header is written if no frames were, then the sizes are patched and the trailing
	/// chunks are appended. The stream is released even if finalizing fails. Calling this more than
	/// once has no effect.
	///
	/// # Errors
	///
	/// * The channel count, sample width, or sample rate was never set
	/// * A staged marker can't be encoded
	/// * The stream could not be written
	pub fn close(&mut self) -> Result<()> {
		if self.stream.is_none() {
			return Ok(());
		}

		let result = self.finalize();
		if let Some(stream) = self.stream.take() {
			log::debug!("Closing writer (owned stream: {})", stream.is_owned());
		}

		result
	}

	/// Whether [`WaveWriter::close`] has been called
	pub fn is_closed(&self) -> bool {
		self.stream.is_none()
	}
}

impl<S> Drop for WaveWriter<'_, S>
where
	S: Write + Seek,
{
	fn drop(&mut self) {
		if let Err(e) = self.close() {
			log::warn!("Failed to finalize dropped writer: {e}");
		}
	}
}

// The size of the outer chunk: everything after its 8-byte header
fn riff_form_size(header: &Header, data_len: u64, trailing_len: u64) -> u64 {
	(header.data_start - header.start - RIFF_CHUNK_HEADER_SIZE) + data_len + trailing_len
}

fn write_chunk(out: &mut Vec<u8>, kind: ChunkKind, body: &[u8]) {
	out.extend_from_slice(&kind.fourcc());
	let _ = out.write_u32::<LittleEndian>(body.len() as u32);
	out.extend_from_slice(body);
	if body.len() % 2 != 0 {
		out.push(0);
	}
}

// `axml` and `levl` are padded within the body, with a space
fn write_space_padded_chunk(out: &mut Vec<u8>, kind: ChunkKind, body: &[u8]) {
	let padded_len = body.len() + body.len() % 2;

	out.extend_from_slice(&kind.fourcc());
	let _ = out.write_u32::<LittleEndian>(padded_len as u32);
	out.extend_from_slice(body);
	if padded_len != body.len() {
		out.push(b' ');
	}
}
