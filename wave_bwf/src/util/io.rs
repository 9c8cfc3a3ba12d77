//! Stream ownership and sample byte order helpers

use std::io::{Read, Seek, SeekFrom, Write};

/// A stream that is either owned by a reader/writer or borrowed from the caller
///
/// An owned stream is dropped (and therefore closed) when the reader/writer is closed. A borrowed
/// stream is left untouched, it is up to the caller to close it.
#[derive(Debug)]
pub(crate) enum Stream<'a, S> {
	Owned(S),
	Borrowed(&'a mut S),
}

impl<S> Stream<'_, S> {
	fn get_mut(&mut self) -> &mut S {
		match self {
			Stream::Owned(stream) => stream,
			Stream::Borrowed(stream) => stream,
		}
	}

	pub(crate) fn is_owned(&self) -> bool {
		matches!(self, Stream::Owned(_))
	}
}

impl<S: Read> Read for Stream<'_, S> {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		self.get_mut().read(buf)
	}
}

impl<S: Write> Write for Stream<'_, S> {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		self.get_mut().write(buf)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		self.get_mut().flush()
	}
}

impl<S: Seek> Seek for Stream<'_, S> {
	fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
		self.get_mut().seek(pos)
	}
}

// TODO: https://github.com/rust-lang/rust/issues/59359
pub(crate) trait SeekStreamLen: Seek {
	fn stream_len_hack(&mut self) -> crate::error::Result<u64> {
		let current_pos = self.stream_position()?;
		let len = self.seek(SeekFrom::End(0))?;

		self.seek(SeekFrom::Start(current_pos))?;

		Ok(len)
	}
}

impl<T> SeekStreamLen for T where T: Seek {}

/// Convert little endian samples to the host byte order (and back, the operation is symmetric)
///
/// Samples on disk are always little endian, so this is a no-op on little endian hosts. 8-bit
/// samples never need swapping.
pub(crate) fn normalize_sample_order(frames: &mut [u8], sample_width: usize) {
	if cfg!(target_endian = "big") {
		swap_sample_bytes(frames, sample_width);
	}
}

fn swap_sample_bytes(frames: &mut [u8], sample_width: usize) {
	if sample_width <= 1 {
		return;
	}

	for sample in frames.chunks_exact_mut(sample_width) {
		sample.reverse();
	}
}

#[cfg(test)]
mod tests {
	use super::{Stream, swap_sample_bytes};

	use std::io::{Cursor, Read, Seek, SeekFrom, Write};

	#[test_log::test]
	fn swap_24_bit_samples() {
		let mut frames = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
		swap_sample_bytes(&mut frames, 3);
		assert_eq!(frames, [0x03, 0x02, 0x01, 0x06, 0x05, 0x04]);

		let mut bytes = [0x01, 0x02];
		swap_sample_bytes(&mut bytes, 1);
		assert_eq!(bytes, [0x01, 0x02]);
	}

	#[test_log::test]
	fn borrowed_stream_outlives_wrapper() {
		let mut cursor = Cursor::new(Vec::new());

		{
			let mut stream = Stream::Borrowed(&mut cursor);
			assert!(!stream.is_owned());
			stream.write_all(b"WAVE").unwrap();
			stream.seek(SeekFrom::Start(0)).unwrap();

			let mut tag = [0; 4];
			stream.read_exact(&mut tag).unwrap();
			assert_eq!(&tag, b"WAVE");
		}

		assert_eq!(cursor.into_inner(), b"WAVE");
	}
}
