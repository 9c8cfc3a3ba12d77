//! RF64 tests

use std::io::Cursor;

use wave_bwf::bext::Bext;
use wave_bwf::config::{ParseOptions, ParsingMode, WriteOptions};
use wave_bwf::wave::{ContainerLayout, WaveReader, WaveWriter};

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
	u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn u64_at(bytes: &[u8], offset: usize) -> u64 {
	u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

fn mono_16(frames: u16) -> Vec<u8> {
	(0..frames).flat_map(u16::to_le_bytes).collect()
}

fn write_rf64(options: WriteOptions, declared_frames: Option<u64>, frames: &[u8]) -> Vec<u8> {
	let mut file = Cursor::new(Vec::new());
	{
		let mut writer = WaveWriter::from_handle_with_options(&mut file, options);
		writer.set_channels(1).unwrap();
		writer.set_sample_width(2).unwrap();
		writer.set_sample_rate(8000).unwrap();
		if let Some(declared_frames) = declared_frames {
			writer.set_frame_count(declared_frames).unwrap();
		}

		writer.write_frames(frames).unwrap();
		writer.close().unwrap();
	}

	file.into_inner()
}

#[test_log::test]
fn rf64_layout() {
	let frames = mono_16(10);
	let bytes = write_rf64(WriteOptions::new().rf64_threshold(0), None, &frames);

	assert_eq!(bytes.len(), 100);
	assert_eq!(&bytes[..4], b"RF64");
	assert_eq!(u32_at(&bytes, 4), u32::MAX);
	assert_eq!(&bytes[8..12], b"WAVE");

	assert_eq!(&bytes[12..16], b"ds64");
	assert_eq!(u32_at(&bytes, 16), 28);
	assert_eq!(u64_at(&bytes, 20), 100 - 8);
	assert_eq!(u64_at(&bytes, 28), 20);
	assert_eq!(u64_at(&bytes, 36), 10);
	assert_eq!(u32_at(&bytes, 44), 0);

	assert_eq!(&bytes[48..52], b"fmt ");
	assert_eq!(&bytes[72..76], b"data");
	assert_eq!(u32_at(&bytes, 76), u32::MAX);
	assert_eq!(&bytes[80..], &frames[..]);
}

#[test_log::test]
fn rf64_read_back() {
	let frames = mono_16(10);
	let bytes = write_rf64(WriteOptions::new().rf64_threshold(0), None, &frames);

	let mut reader = WaveReader::read_from_owned(Cursor::new(bytes)).unwrap();
	assert_eq!(reader.container_type(), ContainerLayout::Rf64);
	assert_eq!(reader.frame_count(), 10);

	let ds64 = reader.ds64().unwrap();
	assert_eq!(ds64.riff_size(), 92);
	assert_eq!(ds64.data_size(), 20);
	assert_eq!(reader.data_range().offset, 80);
	assert_eq!(reader.data_range().size, 20);

	assert_eq!(reader.read_frames(100).unwrap(), frames);
}

#[test_log::test]
fn declared_length_chooses_rf64() {
	let frames = mono_16(10);
	let bytes = write_rf64(WriteOptions::new().rf64_threshold(100), Some(1000), &frames);
	assert_eq!(&bytes[..4], b"RF64");

	// The estimate is replaced by what was actually written
	let mut reader = WaveReader::read_from_owned(Cursor::new(bytes)).unwrap();
	assert_eq!(reader.ds64().unwrap().data_size(), 20);
	assert_eq!(reader.frame_count(), 10);
	assert_eq!(reader.read_frames(1000).unwrap(), frames);

	// Small enough for RIFF
	let bytes = write_rf64(WriteOptions::new().rf64_threshold(100), Some(50), &frames);
	assert_eq!(&bytes[..4], b"RIFF");
}

#[test_log::test]
fn zero_sample_count_uses_data_size() {
	let mut bytes = write_rf64(WriteOptions::new().rf64_threshold(0), None, &mono_16(10));
	bytes[36..44].copy_from_slice(&0_u64.to_le_bytes());

	let reader = WaveReader::read_from_owned(Cursor::new(bytes)).unwrap();
	assert_eq!(reader.ds64().unwrap().sample_count(), 0);
	assert_eq!(reader.frame_count(), 10);
}

#[test_log::test]
fn rf64_requires_ds64() {
	let mut bytes = write_rf64(WriteOptions::new(), None, &mono_16(10));
	assert_eq!(&bytes[..4], b"RIFF");
	bytes[..4].copy_from_slice(b"RF64");

	let err = WaveReader::read_from_owned(Cursor::new(bytes)).unwrap_err();
	assert!(err.is_format_error());
}

#[test_log::test]
fn rf64_with_bext() {
	let mut file = Cursor::new(Vec::new());
	{
		let mut writer =
			WaveWriter::from_handle_with_options(&mut file, WriteOptions::new().rf64_threshold(0));
		writer.set_channels(2).unwrap();
		writer.set_sample_width(2).unwrap();
		writer.set_sample_rate(48000).unwrap();

		let mut bext = Bext::new();
		bext.set_description("Long take").unwrap();
		writer.set_bext(bext).unwrap();

		writer.write_frames(&[0; 4 * 100]).unwrap();
		writer.bext_mut().unwrap().set_loudness_value(Some(-18.5));
		writer.set_axml("<ebuCoreMain/>").unwrap();
		writer.close().unwrap();
	}

	let strict = ParseOptions::new().parsing_mode(ParsingMode::Strict);
	let mut reader =
		WaveReader::read_from_owned_with_options(Cursor::new(file.into_inner()), strict).unwrap();
	assert_eq!(reader.container_type(), ContainerLayout::Rf64);
	assert_eq!(reader.frame_count(), 100);

	let bext = reader.bext().unwrap().unwrap();
	assert_eq!(bext.description(), "Long take");
	assert_eq!(bext.loudness_value(), Some(-18.5));
	assert_eq!(reader.axml().unwrap(), Some(&b"<ebuCoreMain/>"[..]));
}

#[test_log::test]
fn default_threshold_boundary() {
	let frames = mono_16(10);

	// 1_070_241_824 mono 16-bit frames are 2_140_483_648 bytes, one past the default threshold
	let bytes = write_rf64(WriteOptions::new(), Some(1_070_241_824), &frames);
	assert_eq!(&bytes[..4], b"RF64");
	assert_eq!(u64_at(&bytes, 28), 20);

	let bytes = write_rf64(WriteOptions::new(), Some(1_070_241_823), &frames);
	assert_eq!(&bytes[..4], b"RIFF");
	assert_eq!(u32_at(&bytes, 40), 20);
	assert_eq!(&bytes[44..], &frames[..]);
}
