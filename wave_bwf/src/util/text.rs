use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::err;

// Windows-1252 differs from Latin-1 only in 0x80..=0x9F. The five bytes left undefined
// by the code page map to their C1 control code points.
const WINDOWS_1252_HIGH: [char; 32] = [
	'\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
	'\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
	'\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
	'\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// The bytes of a fixed-width field up to (not including) the first null byte
pub(crate) fn until_nul(bytes: &[u8]) -> &[u8] {
	match bytes.iter().position(|b| *b == 0) {
		Some(pos) => &bytes[..pos],
		None => bytes,
	}
}

pub(crate) fn windows_1252_decode(bytes: &[u8]) -> String {
	bytes
		.iter()
		.map(|&b| match b {
			0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(b - 0x80)],
			_ => char::from(b),
		})
		.collect()
}

/// Encode `text` as Windows-1252, returning `None` if a character has no mapping
pub(crate) fn windows_1252_encode(text: &str) -> Option<Vec<u8>> {
	text.chars()
		.map(|c| match c as u32 {
			0..=0x7F | 0xA0..=0xFF => Some(c as u8),
			_ => WINDOWS_1252_HIGH
				.iter()
				.position(|high| *high == c)
				.map(|pos| 0x80 + pos as u8),
		})
		.collect()
}

/// Decode a null-padded text field
///
/// The text is truncated at the first null byte. Fields are expected to be UTF-8 (plain ASCII in
/// practice), anything else is handled according to `parse_mode`.
pub(crate) fn decode_fixed_text(bytes: &[u8], parse_mode: ParsingMode) -> Result<String> {
	let bytes = until_nul(bytes);
	match std::str::from_utf8(bytes) {
		Ok(text) => Ok(text.to_owned()),
		Err(_) => match parse_mode {
			ParsingMode::Strict => err!(TextDecode("Expected a UTF-8 string")),
			ParsingMode::BestAttempt => {
				log::warn!("Text field is not valid UTF-8, decoding as Windows-1252");
				Ok(windows_1252_decode(bytes))
			},
			ParsingMode::Relaxed => {
				log::warn!("Text field is not valid UTF-8, discarding");
				Ok(String::new())
			},
		},
	}
}

/// Write `text` into exactly `width` bytes, padding with nulls
///
/// The caller is expected to have verified that `text` fits.
pub(crate) fn write_fixed_text(out: &mut Vec<u8>, text: &[u8], width: usize) {
	debug_assert!(text.len() <= width);

	let len = text.len().min(width);
	out.extend_from_slice(&text[..len]);
	out.resize(out.len() + (width - len), 0);
}
