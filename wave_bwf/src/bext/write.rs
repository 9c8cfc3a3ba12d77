use super::{
	BEXT_HEADER_SIZE, Bext, DESCRIPTION_LEN, ORIGINATOR_LEN, ORIGINATOR_REFERENCE_LEN,
	RESERVED_LEN,
};
use crate::util::text::write_fixed_text;

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

pub(super) fn encode(bext: &Bext) -> Vec<u8> {
	let history = bext.coding_history.as_bytes();

	let mut out = Vec::with_capacity(BEXT_HEADER_SIZE + history.len() + 1);
	write_fixed_text(&mut out, bext.description.as_bytes(), DESCRIPTION_LEN);
	write_fixed_text(&mut out, bext.originator.as_bytes(), ORIGINATOR_LEN);
	write_fixed_text(
		&mut out,
		bext.originator_reference.as_bytes(),
		ORIGINATOR_REFERENCE_LEN,
	);

	let date = bext.origination_date;
	let time = bext.origination_time;

	// Writing into a `Vec` is infallible
	let _ = write!(
		out,
		"{:04}-{:02}-{:02}{:02}-{:02}-{:02}",
		date.year, date.month, date.day, time.hour, time.minute, time.second
	);

	let (low, high) = bext.time_reference_parts();
	let _ = out.write_u32::<LittleEndian>(low);
	let _ = out.write_u32::<LittleEndian>(high);
	let _ = out.write_u16::<LittleEndian>(bext.version);
	out.extend_from_slice(&bext.umid);
	out.extend_from_slice(&bext.encoded_loudness());
	out.resize(out.len() + RESERVED_LEN, 0);

	debug_assert_eq!(out.len(), BEXT_HEADER_SIZE);

	out.extend_from_slice(history);
	if out.len() % 2 != 0 {
		out.push(0);
	}

	out
}
