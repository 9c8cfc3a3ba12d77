//! Read/write round-trip tests

use std::io::{Cursor, Seek, SeekFrom, Write};

use wave_bwf::bext::{Bext, OriginationDate, OriginationTime};
use wave_bwf::chna::{ChannelUidMap, UidEntry};
use wave_bwf::config::WriteOptions;
use wave_bwf::iff::fmt::{ChannelMask, FormatTag};
use wave_bwf::wave::{CompressionType, ContainerLayout, OpenMode, OpenedWave, WaveParams, WaveReader, WaveWriter};

const SAMPLE_RATE: u32 = 48000;

// 24-bit stereo, with every frame distinguishable
fn stereo_24_frames(count: u32) -> Vec<u8> {
	let mut frames = Vec::new();
	for i in 0..count {
		let left = i.to_le_bytes();
		let right = (i | 0x80_0000).to_le_bytes();
		frames.extend_from_slice(&left[..3]);
		frames.extend_from_slice(&right[..3]);
	}

	frames
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
	u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn chna() -> ChannelUidMap {
	let mut chna = ChannelUidMap::new();
	chna.add_new_track(UidEntry::new(1, "ATU_00000001", "AT_00010001_01", "AP_00010002").unwrap())
		.unwrap();
	chna.add_new_track(UidEntry::new(2, "ATU_00000002", "AT_00010002_01", "AP_00010002").unwrap())
		.unwrap();
	chna
}

#[test_log::test]
fn broadcast_wave_round_trip() {
	let frames = stereo_24_frames(100);

	let mut bext = Bext::new();
	bext.set_description("Morning bulletin").unwrap();
	bext.set_originator("NEWSROOM").unwrap();
	bext.set_originator_reference("NR-2024-0117").unwrap();
	bext.set_origination_date(OriginationDate {
		year: 2024,
		month: 1,
		day: 17,
	})
	.unwrap();
	bext.set_origination_time(OriginationTime {
		hour: 6,
		minute: 30,
		second: 0,
	})
	.unwrap();
	bext.set_time_reference(u64::from(SAMPLE_RATE) * 6 * 3600);

	let digest: [u8; 16] = std::array::from_fn(|i| i as u8);

	let mut file = Cursor::new(Vec::new());
	{
		let mut writer = WaveWriter::from_handle(&mut file);
		writer
			.set_params(WaveParams {
				channels: 2,
				sample_width: 3,
				sample_rate: SAMPLE_RATE,
				frame_count: 100,
				compression: CompressionType::None,
			})
			.unwrap();
		writer.set_bext(bext).unwrap();
		writer.set_chna(chna()).unwrap();
		writer.set_axml("<x />").unwrap();
		writer.set_levl(vec![7; 10]).unwrap();
		writer.set_md5(digest).unwrap();

		writer.write_frames(&frames[..60 * 6]).unwrap();
		writer.write_frames(&frames[60 * 6..]).unwrap();
		assert_eq!(writer.frame_count(), 100);
		writer.close().unwrap();
	}

	let bytes = file.into_inner();
	assert_eq!(&bytes[..4], b"RIFF");
	assert_eq!(u32_at(&bytes, 4) as usize, bytes.len() - 8);

	let mut reader = WaveReader::read_from_owned(Cursor::new(bytes)).unwrap();
	assert_eq!(reader.container_type(), ContainerLayout::Riff);
	assert_eq!(
		reader.params(),
		WaveParams {
			channels: 2,
			sample_width: 3,
			sample_rate: SAMPLE_RATE,
			frame_count: 100,
			compression: CompressionType::None,
		}
	);
	assert_eq!(reader.compression_name(), "not compressed");

	let bext = reader.bext().unwrap().unwrap().clone();
	assert_eq!(bext.description(), "Morning bulletin");
	assert_eq!(bext.originator(), "NEWSROOM");
	assert_eq!(bext.originator_reference(), "NR-2024-0117");
	assert_eq!(bext.origination_date().year, 2024);
	assert_eq!(bext.origination_time().minute, 30);
	assert_eq!(bext.time_reference(), 48000 * 6 * 3600);
	assert_eq!(bext.version(), 1);
	assert_eq!(bext.loudness_value(), None);
	assert_eq!(
		bext.coding_history(),
		format!(
			"A=PCM,F=48000,W=24,M=stereo,T=wave_bwf-{}\r\n",
			env!("CARGO_PKG_VERSION")
		)
	);

	let chna = reader.chna().unwrap().unwrap();
	assert_eq!(chna.track_count(), 2);
	assert_eq!(chna.uid_count(), 2);
	assert_eq!(chna.track(1).unwrap().track_uid(), "ATU_00000002");

	// Padded to an even length with a space
	assert_eq!(reader.axml().unwrap(), Some(&b"<x /> "[..]));
	assert_eq!(reader.levl().unwrap(), Some(&[7; 10][..]));
	assert_eq!(reader.md5().unwrap(), Some(digest));
	assert!(reader.markers().unwrap().is_none());

	// Metadata reads don't disturb the frame position
	assert_eq!(reader.read_frames(60).unwrap(), &frames[..60 * 6]);
	assert!(reader.bext().unwrap().is_some());
	assert_eq!(reader.read_frames(1000).unwrap(), &frames[60 * 6..]);
	assert_eq!(reader.tell(), 100);

	reader.set_position(99).unwrap();
	assert_eq!(reader.read_frames(1).unwrap(), &frames[99 * 6..]);
}

#[test_log::test]
fn md5_is_stored_reversed() {
	let digest: [u8; 16] = std::array::from_fn(|i| i as u8);

	let mut file = Cursor::new(Vec::new());
	{
		let mut writer = WaveWriter::from_handle(&mut file);
		writer.set_channels(1).unwrap();
		writer.set_sample_width(2).unwrap();
		writer.set_sample_rate(8000).unwrap();
		writer.set_md5(digest).unwrap();
		writer.write_frames(&[0; 4]).unwrap();
		writer.close().unwrap();
	}

	let bytes = file.into_inner();
	assert_eq!(&bytes[48..52], b"MD5 ");
	assert_eq!(u32_at(&bytes, 52), 16);
	assert_eq!(bytes[56], 15);
	assert_eq!(bytes[71], 0);
}

#[test_log::test]
fn loudness_patched_after_streaming() {
	let mut file = Cursor::new(Vec::new());
	{
		let mut writer = WaveWriter::from_handle(&mut file);
		writer.set_channels(2).unwrap();
		writer.set_sample_width(2).unwrap();
		writer.set_sample_rate(SAMPLE_RATE).unwrap();
		writer.set_bext(Bext::new()).unwrap();

		writer.write_frames(&[0; 4 * 480]).unwrap();

		let bext = writer.bext_mut().unwrap();
		bext.set_loudness_value(Some(-23.0));
		bext.set_loudness_range(Some(4.5));
		bext.set_max_true_peak_level(Some(-1.0));
		writer.close().unwrap();
	}

	let mut reader = WaveReader::read_from_owned(Cursor::new(file.into_inner())).unwrap();
	let bext = reader.bext().unwrap().unwrap();
	assert_eq!(bext.version(), 2);
	assert_eq!(bext.loudness_value(), Some(-23.0));
	assert_eq!(bext.loudness_range(), Some(4.5));
	assert_eq!(bext.max_true_peak_level(), Some(-1.0));
	assert_eq!(bext.max_momentary_loudness(), None);
	assert_eq!(bext.max_short_term_loudness(), None);
}

#[test_log::test]
fn existing_coding_history_is_kept() {
	let mut bext = Bext::new();
	bext.set_coding_history("A=ANALOGUE,M=mono,T=Studer A810\r\n");

	let mut file = Cursor::new(Vec::new());
	{
		let mut writer = WaveWriter::from_handle_with_options(
			&mut file,
			WriteOptions::new().tool("capture", "2.0"),
		);
		writer.set_channels(1).unwrap();
		writer.set_sample_width(3).unwrap();
		writer.set_sample_rate(96000).unwrap();
		writer.set_bext(bext).unwrap();
		writer.append_coding_history().unwrap();
		writer.write_frames(&[0; 3]).unwrap();
		writer.close().unwrap();
	}

	let mut reader = WaveReader::read_from_owned(Cursor::new(file.into_inner())).unwrap();
	assert_eq!(
		reader.bext().unwrap().unwrap().coding_history(),
		"A=ANALOGUE,M=mono,T=Studer A810\r\nA=PCM,F=96000,W=24,M=mono,T=capture-2.0\r\n"
	);
	assert_eq!(reader.frame_count(), 1);
}

#[test_log::test]
fn undeclared_length_is_corrected() {
	let mut file = Cursor::new(Vec::new());
	{
		let mut writer = WaveWriter::from_handle(&mut file);
		writer.set_channels(1).unwrap();
		writer.set_sample_width(2).unwrap();
		writer.set_sample_rate(8000).unwrap();
		writer.set_frame_count(1000).unwrap();
		writer.write_frames(&[1, 0, 2, 0]).unwrap();
		assert_eq!(writer.params().unwrap().frame_count, 1000);
		writer.close().unwrap();
	}

	let bytes = file.into_inner();
	assert_eq!(bytes.len(), 44 + 4);
	assert_eq!(u32_at(&bytes, 4), 36 + 4);
	assert_eq!(u32_at(&bytes, 40), 4);
}

#[test_log::test]
fn header_only_file() {
	let mut file = Cursor::new(Vec::new());
	{
		let mut writer = WaveWriter::from_handle(&mut file);
		writer.set_channels(1).unwrap();
		writer.set_sample_width(1).unwrap();
		writer.set_sample_rate(8000).unwrap();
		writer.close().unwrap();
	}

	let mut reader = WaveReader::read_from_owned(Cursor::new(file.into_inner())).unwrap();
	assert_eq!(reader.frame_count(), 0);
	assert!(reader.read_frames(10).unwrap().is_empty());
}

#[test_log::test]
fn starts_at_stream_position() {
	let mut file = Cursor::new(Vec::new());
	file.write_all(b"prefix").unwrap();
	{
		let mut writer = WaveWriter::from_handle(&mut file);
		writer.set_channels(1).unwrap();
		writer.set_sample_width(2).unwrap();
		writer.set_sample_rate(8000).unwrap();
		writer.write_frames(&[5, 0, 6, 0]).unwrap();
		writer.close().unwrap();
	}

	assert_eq!(&file.get_ref()[..6], b"prefix");
	assert_eq!(u32_at(file.get_ref(), 6 + 4), 36 + 4);

	file.seek(SeekFrom::Start(6)).unwrap();
	let mut reader = WaveReader::from_handle(&mut file).unwrap();
	assert_eq!(reader.read_frames(2).unwrap(), [5, 0, 6, 0]);
}

#[test_log::test]
fn files_on_disk() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("take.wav");

	let mut writer = WaveWriter::create(&path).unwrap();
	writer.set_channels(2).unwrap();
	writer.set_sample_width(3).unwrap();
	writer.set_sample_rate(SAMPLE_RATE).unwrap();
	writer.write_frames(&stereo_24_frames(10)).unwrap();
	writer.close().unwrap();
	writer.close().unwrap();
	drop(writer);

	let OpenedWave::Reader(mut reader) = wave_bwf::open(&path, OpenMode::Read).unwrap() else {
		panic!("Expected a reader");
	};
	assert_eq!(reader.frame_count(), 10);
	assert_eq!(reader.read_frames(10).unwrap(), stereo_24_frames(10));
	reader.close();
	reader.close();
	assert!(reader.is_closed());

	// Opening for writing truncates
	let OpenedWave::Writer(mut writer) = wave_bwf::open(&path, OpenMode::Write).unwrap() else {
		panic!("Expected a writer");
	};
	writer.set_channels(1).unwrap();
	writer.set_sample_width(1).unwrap();
	writer.set_sample_rate(8000).unwrap();
	writer.close().unwrap();
	drop(writer);

	let reader = WaveReader::open(&path).unwrap();
	assert_eq!(reader.frame_count(), 0);
	assert_eq!(std::fs::metadata(&path).unwrap().len(), 44);
}

#[test_log::test]
fn missing_file() {
	let dir = tempfile::tempdir().unwrap();
	let err = WaveReader::open(dir.path().join("missing.wav")).unwrap_err();
	assert!(err.is_io_error());
}

#[test_log::test]
fn extensible_format() {
	// 5.1, 24-bit, two frames
	let frames: Vec<u8> = (0..36).collect();

	let mut file = Cursor::new(Vec::new());
	{
		let mut writer = WaveWriter::from_handle_with_options(
			&mut file,
			WriteOptions::new().extensible_format(true),
		);
		writer.set_channels(6).unwrap();
		writer.set_sample_width(3).unwrap();
		writer.set_sample_rate(SAMPLE_RATE).unwrap();
		writer.write_frames(&frames).unwrap();
		writer.close().unwrap();
	}

	let bytes = file.into_inner();
	assert_eq!(bytes.len(), 68 + 36);
	assert_eq!(&bytes[12..16], b"fmt ");
	assert_eq!(u32_at(&bytes, 16), 40);
	assert_eq!(&bytes[20..22], &[0xFE, 0xFF]);
	// cbSize, then valid bits per sample
	assert_eq!(&bytes[36..40], &[22, 0, 24, 0]);
	assert_eq!(u32_at(&bytes, 40), 0x3F);
	assert_eq!(&bytes[60..64], b"data");

	let mut reader = WaveReader::read_from_owned(Cursor::new(bytes)).unwrap();
	assert_eq!(reader.format().format_tag(), FormatTag::Extensible);
	assert_eq!(
		reader.format().extensible().unwrap().channel_mask,
		ChannelMask::for_channels(6)
	);
	assert_eq!(reader.channels(), 6);
	assert_eq!(reader.sample_width(), 3);
	assert_eq!(reader.frame_count(), 2);
	assert_eq!(reader.read_frames(2).unwrap(), frames);
}
