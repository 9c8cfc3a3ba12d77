use super::{CompressionType, ContainerLayout, WaveParams};
use crate::bext::Bext;
use crate::chna::ChannelUidMap;
use crate::config::{ParseOptions, ParsingMode};
use crate::error::{BwfError, ErrorKind, Result, StateError};
use crate::iff::chunk::{ChunkKind, ChunkRange, Chunks};
use crate::iff::ds64::Ds64;
use crate::iff::fmt::AudioFormat;
use crate::macros::{decode_err, try_vec};
use crate::r64m::MarkerSet;
use crate::util::io::{SeekStreamLen, Stream, normalize_sample_order};

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

const MD5_LEN: usize = 16;

// A metadata chunk that is only decoded when first requested
#[derive(Debug)]
enum Lazy<T> {
	Absent,
	Pending(ChunkRange),
	Ready(T),
}

impl<T> Lazy<T> {
	fn new(range: Option<ChunkRange>) -> Self {
		match range {
			Some(range) => Self::Pending(range),
			None => Self::Absent,
		}
	}
}

#[derive(Default)]
struct MetadataRanges {
	bext: Option<ChunkRange>,
	chna: Option<ChunkRange>,
	r64m: Option<ChunkRange>,
	axml: Option<ChunkRange>,
	md5: Option<ChunkRange>,
	levl: Option<ChunkRange>,
}

/// A reader over an existing `RIFF`/`RF64` WAVE file
///
/// The `fmt ` and `ds64` chunks are decoded when the file is opened, every other known chunk is
/// decoded the first time it is requested, and cached.
///
/// # Examples
///
/// ```rust,no_run
/// use wave_bwf::wave::WaveReader;
///
/// # fn main() -> wave_bwf::error::Result<()> {
/// let mut reader = WaveReader::open("news.wav")?;
///
/// if let Some(bext) = reader.bext()? {
/// 	println!("Originated by {}", bext.originator());
/// }
///
/// let first_second = reader.read_frames(u64::from(reader.sample_rate()))?;
/// reader.close();
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct WaveReader<'a, S>
where
	S: Read + Seek,
{
	stream: Option<Stream<'a, S>>,
	parse_mode: ParsingMode,
	layout: ContainerLayout,
	format: AudioFormat,
	ds64: Option<Ds64>,
	data: ChunkRange,
	frame_count: u64,
	position: u64,
	seek_pending: bool,
	bext: Lazy<Bext>,
	chna: Lazy<ChannelUidMap>,
	markers: Lazy<MarkerSet>,
	axml: Lazy<Vec<u8>>,
	md5: Lazy<[u8; MD5_LEN]>,
	levl: Lazy<Vec<u8>>,
}

impl WaveReader<'static, File> {
	/// Open the file at `path`
	///
	/// The file is closed when the reader is closed (or dropped).
	///
	/// # Errors
	///
	/// * The file could not be opened
	/// * See [`WaveReader::read_from_owned`]
	pub fn open<P>(path: P) -> Result<Self>
	where
		P: AsRef<Path>,
	{
		Self::open_with_options(path, ParseOptions::new())
	}

	/// Open the file at `path` with the specified [`ParseOptions`]
	///
	/// # Errors
	///
	/// See [`WaveReader::open`]
	pub fn open_with_options<P>(path: P, parse_options: ParseOptions) -> Result<Self>
	where
		P: AsRef<Path>,
	{
		let file = File::open(path)?;
		Self::read_from_owned_with_options(file, parse_options)
	}
}

impl<S> WaveReader<'static, S>
where
	S: Read + Seek,
{
	/// Read a WAVE file from a stream the reader takes ownership of
	///
	/// # Errors
	///
	/// * The stream doesn't start with a `RIFF`/`RF64` `WAVE` header
	/// * An `RF64` file doesn't start with a `ds64` chunk
	/// * The `fmt ` or `data` chunk is missing, or `data` comes first
	/// * The `fmt ` chunk is invalid, or describes a format other than PCM
	pub fn read_from_owned(stream: S) -> Result<Self> {
		Self::read_from_owned_with_options(stream, ParseOptions::new())
	}

	/// Read a WAVE file from a stream the reader takes ownership of, with the specified
	/// [`ParseOptions`]
	///
	/// # Errors
	///
	/// See [`WaveReader::read_from_owned`]
	pub fn read_from_owned_with_options(stream: S, parse_options: ParseOptions) -> Result<Self> {
		Self::read_from(Stream::Owned(stream), parse_options)
	}
}

impl<'a, S> WaveReader<'a, S>
where
	S: Read + Seek,
{
	/// Read a WAVE file from a borrowed stream, starting at its current position
	///
	/// Closing the reader releases the borrow, the stream itself is left open.
	///
	/// # Errors
	///
	/// See [`WaveReader::read_from_owned`]
	pub fn from_handle(stream: &'a mut S) -> Result<Self> {
		Self::from_handle_with_options(stream, ParseOptions::new())
	}

	/// Read a WAVE file from a borrowed stream, with the specified [`ParseOptions`]
	///
	/// # Errors
	///
	/// See [`WaveReader::read_from_owned`]
	pub fn from_handle_with_options(stream: &'a mut S, parse_options: ParseOptions) -> Result<Self> {
		Self::read_from(Stream::Borrowed(stream), parse_options)
	}

	fn read_from(mut stream: Stream<'a, S>, parse_options: ParseOptions) -> Result<Self> {
		let parse_mode = parse_options.parsing_mode;

		let stream_len = stream.stream_len_hack()?;
		let start = stream.stream_position()?;

		let mut id = [0; 4];
		stream.read_exact(&mut id)?;
		let form_size = stream.read_u32::<LittleEndian>()?;

		let layout = match &id {
			b"RIFF" => ContainerLayout::Riff,
			b"RF64" => ContainerLayout::Rf64,
			_ => decode_err!(@BAIL "File does not start with a RIFF or RF64 header"),
		};

		let mut form_type = [0; 4];
		stream.read_exact(&mut form_type)?;
		if &form_type != b"WAVE" {
			decode_err!(@BAIL "Form type is not WAVE");
		}

		log::debug!("Found {layout:?} container, declared size {form_size}");

		let mut chunks = Chunks::<LittleEndian>::new(stream_len.saturating_sub(start + 12));

		let mut ds64 = None;
		if layout == ContainerLayout::Rf64 {
			if !chunks.next(&mut stream)? || &chunks.fourcc != b"ds64" {
				decode_err!(@BAIL Ds64, "RF64 file does not start with a ds64 chunk");
			}

			let content = chunks.content(&mut stream)?;
			ds64 = Some(Ds64::decode(&content)?);
		}

		let mut format = None;
		let mut data = None;
		let mut ranges = MetadataRanges::default();

		while chunks.next(&mut stream)? {
			let Some(kind) = ChunkKind::from_fourcc(&chunks.fourcc) else {
				log::trace!(
					"Skipping unknown chunk {:?} ({} bytes)",
					String::from_utf8_lossy(&chunks.fourcc),
					chunks.size
				);
				chunks.skip(&mut stream)?;
				continue;
			};

			log::debug!("Found {kind} chunk, {} bytes", chunks.size);

			match kind {
				ChunkKind::Fmt => {
					if format.is_some() {
						log::warn!("Skipping duplicate \"fmt \" chunk");
						chunks.skip(&mut stream)?;
						continue;
					}

					let content = chunks.content(&mut stream)?;
					format = Some(AudioFormat::decode(&content, parse_mode)?);
				},
				ChunkKind::Data => {
					let Some(format) = format.as_ref() else {
						decode_err!(@BAIL Data, "Found \"data\" chunk before \"fmt \" chunk");
					};

					if data.is_some() {
						log::warn!("Skipping duplicate \"data\" chunk");
						chunks.skip(&mut stream)?;
						continue;
					}

					if let Some(ds64) = ds64.as_ref() {
						chunks.override_size(ds64.data_size());
					}

					if chunks.size > chunks.remaining() {
						if parse_mode == ParsingMode::Strict {
							decode_err!(@BAIL Data, "Chunk extends past the end of the stream");
						}

						log::warn!(
							"\"data\": Chunk claims {} bytes, only {} available, clamping",
							chunks.size,
							chunks.remaining()
						);
						chunks.override_size(chunks.remaining());
					}

					if chunks.size % format.frame_size() != 0 {
						log::warn!("\"data\": Chunk ends with a partial frame");
					}

					data = Some(chunks.range(&mut stream)?);
				},
				ChunkKind::Bext => capture(&mut ranges.bext, &mut chunks, &mut stream, kind, parse_mode)?,
				ChunkKind::Chna => capture(&mut ranges.chna, &mut chunks, &mut stream, kind, parse_mode)?,
				ChunkKind::R64m => capture(&mut ranges.r64m, &mut chunks, &mut stream, kind, parse_mode)?,
				ChunkKind::Axml => capture(&mut ranges.axml, &mut chunks, &mut stream, kind, parse_mode)?,
				ChunkKind::Md5 => capture(&mut ranges.md5, &mut chunks, &mut stream, kind, parse_mode)?,
				ChunkKind::Levl => capture(&mut ranges.levl, &mut chunks, &mut stream, kind, parse_mode)?,
				ChunkKind::Ds64 | ChunkKind::Riff | ChunkKind::Rf64 => {
					log::warn!("Skipping misplaced {kind} chunk");
					chunks.skip(&mut stream)?;
				},
			}
		}

		let Some(format) = format else {
			decode_err!(@BAIL Fmt, "File has no \"fmt \" chunk");
		};

		let Some(data) = data else {
			decode_err!(@BAIL Data, "File has no \"data\" chunk");
		};

		let frame_count = match ds64 {
			Some(ds64) if ds64.sample_count() > 0 => ds64.sample_count(),
			_ => data.size / format.frame_size(),
		};

		log::debug!(
			"{} channels, {} bytes per sample, {} Hz, {frame_count} frames",
			format.channels(),
			format.sample_width(),
			format.sample_rate()
		);

		Ok(Self {
			stream: Some(stream),
			parse_mode,
			layout,
			format,
			ds64,
			data,
			frame_count,
			position: 0,
			seek_pending: true,
			bext: Lazy::new(ranges.bext),
			chna: Lazy::new(ranges.chna),
			markers: Lazy::new(ranges.r64m),
			axml: Lazy::new(ranges.axml),
			md5: Lazy::new(ranges.md5),
			levl: Lazy::new(ranges.levl),
		})
	}

	/// Whether the file is `RIFF` or `RF64`
	pub fn container_type(&self) -> ContainerLayout {
		self.layout
	}

	/// The number of interleaved channels
	pub fn channels(&self) -> u16 {
		self.format.channels()
	}

	/// Bytes per sample
	pub fn sample_width(&self) -> u16 {
		self.format.sample_width()
	}

	/// Frames per second
	pub fn sample_rate(&self) -> u32 {
		self.format.sample_rate()
	}

	/// The number of frames in the `data` chunk
	///
	/// For RF64 files, this is the sample count of the `ds64` chunk (if non-zero).
	pub fn frame_count(&self) -> u64 {
		self.frame_count
	}

	/// The sample compression, always [`CompressionType::None`]
	pub fn compression_type(&self) -> CompressionType {
		CompressionType::None
	}

	/// The human readable name of the sample compression
	pub fn compression_name(&self) -> &'static str {
		self.compression_type().name()
	}

	/// All stream parameters at once
	pub fn params(&self) -> WaveParams {
		WaveParams {
			channels: self.channels(),
			sample_width: self.sample_width(),
			sample_rate: self.sample_rate(),
			frame_count: self.frame_count,
			compression: self.compression_type(),
		}
	}

	/// The decoded `fmt ` chunk
	pub fn format(&self) -> &AudioFormat {
		&self.format
	}

	/// The `ds64` chunk, only present in `RF64` files
	pub fn ds64(&self) -> Option<&Ds64> {
		self.ds64.as_ref()
	}

	/// Where the frames live in the stream
	pub fn data_range(&self) -> ChunkRange {
		self.data
	}

	/// The `bext` chunk
	///
	/// # Errors
	///
	/// * The reader is closed
	/// * See [`Bext::decode`]
	pub fn bext(&mut self) -> Result<Option<&Bext>> {
		let parse_mode = self.parse_mode;
		load(
			&mut self.stream,
			&mut self.seek_pending,
			&mut self.bext,
			|content| Bext::decode(&content, parse_mode).map(Some),
		)
	}

	/// The `chna` chunk
	///
	/// # Errors
	///
	/// * The reader is closed
	/// * See [`ChannelUidMap::decode`]
	pub fn chna(&mut self) -> Result<Option<&ChannelUidMap>> {
		let parse_mode = self.parse_mode;
		load(
			&mut self.stream,
			&mut self.seek_pending,
			&mut self.chna,
			|content| ChannelUidMap::decode(&content, parse_mode).map(Some),
		)
	}

	/// The markers of the `r64m` chunk
	///
	/// # Errors
	///
	/// * The reader is closed
	/// * See [`MarkerSet::decode`]
	pub fn markers(&mut self) -> Result<Option<&MarkerSet>> {
		let parse_mode = self.parse_mode;
		let sample_rate = self.sample_rate();
		load(
			&mut self.stream,
			&mut self.seek_pending,
			&mut self.markers,
			|content| MarkerSet::decode(&content, sample_rate, parse_mode).map(Some),
		)
	}

	/// The raw contents of the `axml` chunk
	///
	/// # Errors
	///
	/// * The reader is closed
	pub fn axml(&mut self) -> Result<Option<&[u8]>> {
		load(
			&mut self.stream,
			&mut self.seek_pending,
			&mut self.axml,
			|content| Ok(Some(content)),
		)
		.map(|axml| axml.map(Vec::as_slice))
	}

	/// The raw contents of the `levl` chunk
	///
	/// # Errors
	///
	/// * The reader is closed
	pub fn levl(&mut self) -> Result<Option<&[u8]>> {
		load(
			&mut self.stream,
			&mut self.seek_pending,
			&mut self.levl,
			|content| Ok(Some(content)),
		)
		.map(|levl| levl.map(Vec::as_slice))
	}

	/// The digest of the `MD5 ` chunk
	///
	/// The digest is stored reversed, this returns it in its natural order.
	///
	/// # Errors
	///
	/// * The reader is closed
	/// * **(Strict)** The chunk is not 16 bytes long
	pub fn md5(&mut self) -> Result<Option<[u8; MD5_LEN]>> {
		let parse_mode = self.parse_mode;
		load(
			&mut self.stream,
			&mut self.seek_pending,
			&mut self.md5,
			|content| {
				let Ok(mut digest) = <[u8; MD5_LEN]>::try_from(content.as_slice()) else {
					if parse_mode == ParsingMode::Strict {
						decode_err!(@BAIL Md5, "Digest is not 16 bytes long");
					}

					log::warn!("\"MD5 \": Expected 16 bytes, found {}, ignoring", content.len());
					return Ok(None);
				};

				digest.reverse();
				Ok(Some(digest))
			},
		)
		.map(|digest| digest.copied())
	}

	/// Read up to `frame_count` frames from the current position
	///
	/// Fewer frames are returned at the end of the `data` chunk. Samples are returned in the byte
	/// order of the host.
	///
	/// # Errors
	///
	/// * The reader is closed
	/// * The stream could not be read
	pub fn read_frames(&mut self, frame_count: u64) -> Result<Vec<u8>> {
		let frame_size = self.format.frame_size();
		let stream = self
			.stream
			.as_mut()
			.ok_or(BwfError::from(StateError::Closed))?;

		if self.seek_pending {
			stream.seek(SeekFrom::Start(
				self.data.offset + self.position * frame_size,
			))?;
			self.seek_pending = false;
		}

		let available = (self.data.size / frame_size)
			.min(self.frame_count)
			.saturating_sub(self.position);
		let frames = frame_count.min(available);
		if frames == 0 {
			return Ok(Vec::new());
		}

		let mut content = vec![0; (frames * frame_size) as usize];
		stream.read_exact(&mut content)?;
		normalize_sample_order(&mut content, usize::from(self.format.sample_width()));

		self.position += frames;
		Ok(content)
	}

	/// The current position, in frames
	pub fn tell(&self) -> u64 {
		self.position
	}

	/// Move to frame `position`
	///
	/// The stream itself is only seeked on the next read.
	///
	/// # Errors
	///
	/// * `position` is greater than [`WaveReader::frame_count`]
	pub fn set_position(&mut self, position: u64) -> Result<()> {
		if position > self.frame_count {
			return Err(BwfError::new(ErrorKind::PositionOutOfRange {
				position,
				frame_count: self.frame_count,
			}));
		}

		self.position = position;
		self.seek_pending = true;
		Ok(())
	}

	/// Move back to the first frame
	pub fn rewind(&mut self) {
		self.position = 0;
		self.seek_pending = true;
	}

	/// Release the stream, and any decoded metadata
	///
	/// Owned streams are closed, borrowed streams are left as is. Calling this more than once has
	/// no effect.
	pub fn close(&mut self) {
		if let Some(stream) = self.stream.take() {
			log::debug!("Closing reader (owned stream: {})", stream.is_owned());
		}

		self.bext = Lazy::Absent;
		self.chna = Lazy::Absent;
		self.markers = Lazy::Absent;
		self.axml = Lazy::Absent;
		self.md5 = Lazy::Absent;
		self.levl = Lazy::Absent;
	}

	/// Whether [`WaveReader::close`] has been called
	pub fn is_closed(&self) -> bool {
		self.stream.is_none()
	}
}

// Record the body of a metadata chunk
fn capture<S>(
	slot: &mut Option<ChunkRange>,
	chunks: &mut Chunks<LittleEndian>,
	stream: &mut S,
	kind: ChunkKind,
	parse_mode: ParsingMode,
) -> Result<()>
where
	S: Read + Seek,
{
	if chunks.size > chunks.remaining() {
		if parse_mode == ParsingMode::Strict {
			return Err(BwfError::new(ErrorKind::SizeMismatch));
		}

		log::warn!("{kind}: Chunk extends past the end of the stream, ignoring");
		return chunks.skip(stream);
	}

	if slot.is_some() {
		log::warn!("Skipping duplicate {kind} chunk");
		return chunks.skip(stream);
	}

	*slot = Some(chunks.range(stream)?);
	Ok(())
}

fn load<'c, S, T, F>(
	stream: &mut Option<Stream<'_, S>>,
	seek_pending: &mut bool,
	slot: &'c mut Lazy<T>,
	decode: F,
) -> Result<Option<&'c T>>
where
	S: Read + Seek,
	F: FnOnce(Vec<u8>) -> Result<Option<T>>,
{
	let Some(stream) = stream.as_mut() else {
		return Err(StateError::Closed.into());
	};

	if let Lazy::Pending(range) = *slot {
		stream.seek(SeekFrom::Start(range.offset))?;
		// Frame reads have to find their way back
		*seek_pending = true;

		let mut content = try_vec![0; range.size as usize];
		stream.read_exact(&mut content)?;

		*slot = match decode(content)? {
			Some(value) => Lazy::Ready(value),
			None => Lazy::Absent,
		};
	}

	match slot {
		Lazy::Ready(value) => Ok(Some(value)),
		_ => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use super::WaveReader;
	use crate::config::{ParseOptions, ParsingMode};
	use crate::error::ErrorKind;
	use crate::wave::ContainerLayout;

	use std::io::Cursor;

	fn chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], body: &[u8]) {
		out.extend(fourcc);
		out.extend((body.len() as u32).to_le_bytes());
		out.extend(body);
		if body.len() % 2 != 0 {
			out.push(0);
		}
	}

	fn fmt_mono_16() -> Vec<u8> {
		let mut fmt = Vec::new();
		fmt.extend(1_u16.to_le_bytes());
		fmt.extend(1_u16.to_le_bytes());
		fmt.extend(8000_u32.to_le_bytes());
		fmt.extend(16000_u32.to_le_bytes());
		fmt.extend(2_u16.to_le_bytes());
		fmt.extend(16_u16.to_le_bytes());
		fmt
	}

	fn riff(body: &[u8]) -> Vec<u8> {
		let mut out = Vec::new();
		out.extend(b"RIFF");
		out.extend((body.len() as u32 + 4).to_le_bytes());
		out.extend(b"WAVE");
		out.extend(body);
		out
	}

	#[test_log::test]
	fn minimal_file() {
		let mut body = Vec::new();
		chunk(&mut body, b"fmt ", &fmt_mono_16());
		chunk(&mut body, b"JUNK", &[0; 5]);
		chunk(&mut body, b"data", &[1, 0, 2, 0, 3, 0]);

		let mut reader = WaveReader::read_from_owned(Cursor::new(riff(&body))).unwrap();
		assert_eq!(reader.container_type(), ContainerLayout::Riff);
		assert_eq!(reader.channels(), 1);
		assert_eq!(reader.sample_width(), 2);
		assert_eq!(reader.sample_rate(), 8000);
		assert_eq!(reader.frame_count(), 3);
		assert!(reader.ds64().is_none());
		assert!(reader.bext().unwrap().is_none());

		assert_eq!(reader.read_frames(2).unwrap(), [1, 0, 2, 0]);
		assert_eq!(reader.tell(), 2);
		assert_eq!(reader.read_frames(10).unwrap(), [3, 0]);
		assert!(reader.read_frames(10).unwrap().is_empty());

		reader.rewind();
		assert_eq!(reader.read_frames(1).unwrap(), [1, 0]);
	}

	#[test_log::test]
	fn data_before_fmt() {
		let mut body = Vec::new();
		chunk(&mut body, b"data", &[0; 4]);
		chunk(&mut body, b"fmt ", &fmt_mono_16());

		let err = WaveReader::read_from_owned(Cursor::new(riff(&body))).unwrap_err();
		assert!(err.is_format_error());
	}

	#[test_log::test]
	fn missing_chunks() {
		let mut only_fmt = Vec::new();
		chunk(&mut only_fmt, b"fmt ", &fmt_mono_16());
		assert!(
			WaveReader::read_from_owned(Cursor::new(riff(&only_fmt)))
				.unwrap_err()
				.is_format_error()
		);

		let mut only_data = Vec::new();
		chunk(&mut only_data, b"data", &[0; 4]);
		assert!(
			WaveReader::read_from_owned(Cursor::new(riff(&only_data)))
				.unwrap_err()
				.is_format_error()
		);
	}

	#[test_log::test]
	fn bad_magic() {
		let mut file = riff(&[]);
		file[..4].copy_from_slice(b"FORM");
		assert!(
			WaveReader::read_from_owned(Cursor::new(file.clone()))
				.unwrap_err()
				.is_format_error()
		);

		let mut file = riff(&[]);
		file[8..12].copy_from_slice(b"AIFF");
		assert!(
			WaveReader::read_from_owned(Cursor::new(file))
				.unwrap_err()
				.is_format_error()
		);
	}

	#[test_log::test]
	fn truncated_data() {
		let mut body = Vec::new();
		chunk(&mut body, b"fmt ", &fmt_mono_16());
		body.extend(b"data");
		body.extend(100_u32.to_le_bytes());
		body.extend([0; 10]);
		let file = riff(&body);

		let strict = ParseOptions::new().parsing_mode(ParsingMode::Strict);
		assert!(
			WaveReader::read_from_owned_with_options(Cursor::new(file.clone()), strict).is_err()
		);

		let reader = WaveReader::read_from_owned(Cursor::new(file)).unwrap();
		assert_eq!(reader.frame_count(), 5);
	}

	#[test_log::test]
	fn position_range() {
		let mut body = Vec::new();
		chunk(&mut body, b"fmt ", &fmt_mono_16());
		chunk(&mut body, b"data", &[1, 0, 2, 0, 3, 0]);

		let mut reader = WaveReader::read_from_owned(Cursor::new(riff(&body))).unwrap();
		assert!(reader.set_position(3).is_ok());
		assert!(reader.read_frames(1).unwrap().is_empty());

		let err = reader.set_position(4).unwrap_err();
		assert!(err.is_range_error());
		assert!(matches!(
			err.kind(),
			ErrorKind::PositionOutOfRange {
				position: 4,
				frame_count: 3
			}
		));

		reader.set_position(1).unwrap();
		assert_eq!(reader.read_frames(1).unwrap(), [2, 0]);
	}

	#[test_log::test]
	fn close_is_idempotent() {
		let mut body = Vec::new();
		chunk(&mut body, b"fmt ", &fmt_mono_16());
		chunk(&mut body, b"data", &[1, 0]);
		chunk(&mut body, b"axml", b"<a/>");

		let mut cursor = Cursor::new(riff(&body));
		let mut reader = WaveReader::from_handle(&mut cursor).unwrap();
		assert_eq!(reader.axml().unwrap(), Some(&b"<a/>"[..]));

		reader.close();
		reader.close();
		assert!(reader.is_closed());
		assert!(reader.read_frames(1).unwrap_err().is_state_error());
		assert!(reader.axml().unwrap_err().is_state_error());

		drop(reader);
		// The borrowed stream is still usable
		assert_eq!(cursor.get_ref().len(), 12 + body.len());
	}
}
