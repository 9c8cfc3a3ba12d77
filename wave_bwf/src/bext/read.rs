use super::loudness::Loudness;
use super::{
	BEXT_HEADER_SIZE, Bext, DESCRIPTION_LEN, ORIGINATOR_LEN, ORIGINATOR_REFERENCE_LEN,
	OriginationDate, OriginationTime, RESERVED_LEN, UMID_LEN,
};
use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::decode_err;
use crate::util::text::decode_fixed_text;

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

pub(super) fn decode(content: &[u8], parse_mode: ParsingMode) -> Result<Bext> {
	if content.len() < BEXT_HEADER_SIZE {
		decode_err!(@BAIL Bext, "Chunk is too short to hold the fixed fields");
	}

	let mut reader = content;

	let description = read_text(&mut reader, DESCRIPTION_LEN, parse_mode)?;
	let originator = read_text(&mut reader, ORIGINATOR_LEN, parse_mode)?;
	let originator_reference = read_text(&mut reader, ORIGINATOR_REFERENCE_LEN, parse_mode)?;

	let mut date = [0; 10];
	reader.read_exact(&mut date)?;
	let mut time = [0; 8];
	reader.read_exact(&mut time)?;

	let origination_date = parse_date(&date, parse_mode)?;
	let origination_time = parse_time(&time, parse_mode)?;

	let time_reference_low = reader.read_u32::<LittleEndian>()?;
	let time_reference_high = reader.read_u32::<LittleEndian>()?;
	let time_reference = (u64::from(time_reference_high) << 32) | u64::from(time_reference_low);

	let version = reader.read_u16::<LittleEndian>()?;
	if version > super::MAX_VERSION {
		log::warn!("bext: Unknown version {version}, reading as version 2");
	}

	let mut umid = [0; UMID_LEN];
	reader.read_exact(&mut umid)?;

	let loudness = if version >= 2 {
		Loudness {
			value: reader.read_i16::<LittleEndian>()?,
			range: reader.read_i16::<LittleEndian>()?,
			max_true_peak_level: reader.read_i16::<LittleEndian>()?,
			max_momentary: reader.read_i16::<LittleEndian>()?,
			max_short_term: reader.read_i16::<LittleEndian>()?,
		}
	} else {
		reader = &reader[10..];
		Loudness::UNSET
	};

	reader = &reader[RESERVED_LEN..];

	let coding_history = read_coding_history(reader, parse_mode)?;

	log::debug!(
		"bext: Version {version}, {} bytes of coding history",
		coding_history.len()
	);

	Ok(Bext {
		description,
		originator,
		originator_reference,
		origination_date,
		origination_time,
		time_reference,
		version,
		umid,
		loudness,
		coding_history,
	})
}

fn read_text(reader: &mut &[u8], len: usize, parse_mode: ParsingMode) -> Result<String> {
	let (field, rest) = reader.split_at(len);
	*reader = rest;

	decode_fixed_text(field, parse_mode)
}

// The coding history runs to the end of the chunk, and may be padded with any number of nulls
fn read_coding_history(content: &[u8], parse_mode: ParsingMode) -> Result<String> {
	decode_fixed_text(content, parse_mode)
}

fn parse_date(field: &[u8; 10], parse_mode: ParsingMode) -> Result<OriginationDate> {
	// Only the digit positions are checked, writers disagree on the separator
	match (
		parse_digits(&field[0..4]),
		parse_digits(&field[5..7]),
		parse_digits(&field[8..10]),
	) {
		(Some(year), Some(month), Some(day)) => Ok(OriginationDate {
			year,
			month: month as u8,
			day: day as u8,
		}),
		_ if field.iter().all(|b| *b == 0) => Ok(OriginationDate::default()),
		_ => {
			if parse_mode == ParsingMode::Strict {
				decode_err!(@BAIL Bext, "Origination date is not in the form yyyy-mm-dd");
			}

			log::warn!("bext: Invalid origination date, ignoring");
			Ok(OriginationDate::default())
		},
	}
}

fn parse_time(field: &[u8; 8], parse_mode: ParsingMode) -> Result<OriginationTime> {
	match (
		parse_digits(&field[0..2]),
		parse_digits(&field[3..5]),
		parse_digits(&field[6..8]),
	) {
		(Some(hour), Some(minute), Some(second)) => Ok(OriginationTime {
			hour: hour as u8,
			minute: minute as u8,
			second: second as u8,
		}),
		_ if field.iter().all(|b| *b == 0) => Ok(OriginationTime::default()),
		_ => {
			if parse_mode == ParsingMode::Strict {
				decode_err!(@BAIL Bext, "Origination time is not in the form hh-mm-ss");
			}

			log::warn!("bext: Invalid origination time, ignoring");
			Ok(OriginationTime::default())
		},
	}
}

fn parse_digits(digits: &[u8]) -> Option<u16> {
	digits.iter().try_fold(0_u16, |acc, b| {
		b.is_ascii_digit().then(|| acc * 10 + u16::from(b - b'0'))
	})
}
