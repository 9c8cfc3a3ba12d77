//! The broadcast audio extension chunk (`bext`)
//!
//! See [EBU Tech 3285](https://tech.ebu.ch/docs/tech/tech3285.pdf) for the chunk layout.
//!
//! # Examples
//!
//! ```rust
//! # fn main() -> wave_bwf::error::Result<()> {
//! use wave_bwf::bext::Bext;
//!
//! let mut bext = Bext::new();
//! bext.set_description("Evening news, 2nd edition")?;
//! bext.set_originator("NEWSROOM")?;
//!
//! // Setting any loudness field upgrades the chunk to version 2
//! bext.set_loudness_value(Some(-23.0));
//! assert_eq!(bext.version(), 2);
//!
//! let bytes = bext.encode();
//! assert_eq!(Bext::decode(&bytes, Default::default())?, bext);
//! # Ok(()) }
//! ```

mod coding_history;
mod loudness;
mod read;
mod write;

pub use coding_history::generate_coding_history;
pub use loudness::{LOUDNESS_UNSET, scale_down, scale_up};

use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::encode_err;
use loudness::Loudness;

use chrono::{Datelike, Local, Timelike};

pub(crate) const DESCRIPTION_LEN: usize = 256;
pub(crate) const ORIGINATOR_LEN: usize = 32;
pub(crate) const ORIGINATOR_REFERENCE_LEN: usize = 32;
pub(crate) const UMID_LEN: usize = 64;
pub(crate) const RESERVED_LEN: usize = 180;

/// Size of everything before the coding history
pub const BEXT_HEADER_SIZE: usize = 602;

/// Offset of the version field within the chunk body
pub(crate) const VERSION_OFFSET: u64 = 346;
/// Offset of the first loudness field within the chunk body
pub(crate) const LOUDNESS_OFFSET: u64 = 412;

/// The highest `bext` version understood
pub const MAX_VERSION: u16 = 2;

/// The origination date of a `bext` chunk, stored as `yyyy-mm-dd`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct OriginationDate {
	pub year: u16,
	pub month: u8,
	pub day: u8,
}

/// The origination time of a `bext` chunk, stored as `hh-mm-ss`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct OriginationTime {
	pub hour: u8,
	pub minute: u8,
	pub second: u8,
}

impl OriginationDate {
	fn fits(self) -> bool {
		self.year <= 9999 && self.month <= 99 && self.day <= 99
	}
}

impl OriginationTime {
	fn fits(self) -> bool {
		self.hour <= 99 && self.minute <= 99 && self.second <= 99
	}
}

/// A `bext` chunk
#[derive(Debug, Clone, PartialEq)]
pub struct Bext {
	pub(crate) description: String,
	pub(crate) originator: String,
	pub(crate) originator_reference: String,
	pub(crate) origination_date: OriginationDate,
	pub(crate) origination_time: OriginationTime,
	pub(crate) time_reference: u64,
	pub(crate) version: u16,
	pub(crate) umid: [u8; UMID_LEN],
	pub(crate) loudness: Loudness,
	pub(crate) coding_history: String,
}

impl Default for Bext {
	fn default() -> Self {
		Self::new()
	}
}

macro_rules! text_field {
	($(#[$meta:meta])* $field:ident, $setter:ident, $len:ident, $err:literal) => {
		$(#[$meta])*
		pub fn $field(&self) -> &str {
			&self.$field
		}

		#[doc = concat!("Set the ", stringify!($field))]
		///
		/// # Errors
		///
		/// * The value is longer than its fixed-width field
		pub fn $setter(&mut self, value: impl Into<String>) -> Result<()> {
			let value = value.into();
			if value.len() > $len {
				encode_err!(@BAIL Bext, $err);
			}

			self.$field = value;
			Ok(())
		}
	};
}

macro_rules! loudness_field {
	($(#[$meta:meta])* $getter:ident, $setter:ident, $field:ident) => {
		$(#[$meta])*
		///
		/// This is only available in version 2 chunks.
		pub fn $getter(&self) -> Option<f64> {
			if self.version < 2 {
				return None;
			}

			scale_down(self.loudness.$field)
		}

		#[doc = concat!("Set (or clear, with `None`) the ", stringify!($field), " field")]
		///
		/// This upgrades the chunk to version 2. Values outside of `(-100, 100)` can't be stored,
		/// and are written as unset.
		pub fn $setter(&mut self, value: Option<f64>) {
			self.loudness.$field = value.map_or(LOUDNESS_UNSET, scale_up);
			if self.version < 2 {
				self.version = 2;
			}
		}
	};
}

impl Bext {
	/// Create an empty version 1 `bext` chunk, originated now (local time)
	pub fn new() -> Self {
		let (origination_date, origination_time) = now_local();

		Self {
			description: String::new(),
			originator: String::new(),
			originator_reference: String::new(),
			origination_date,
			origination_time,
			time_reference: 0,
			version: 1,
			umid: [0; UMID_LEN],
			loudness: Loudness::UNSET,
			coding_history: String::new(),
		}
	}

	text_field!(
		/// Free text description of the sound sequence
		description,
		set_description,
		DESCRIPTION_LEN,
		"Description exceeds 256 bytes"
	);
	text_field!(
		/// The name of the originator
		originator,
		set_originator,
		ORIGINATOR_LEN,
		"Originator exceeds 32 bytes"
	);
	text_field!(
		/// Unambiguous reference allocated by the originating organisation
		originator_reference,
		set_originator_reference,
		ORIGINATOR_REFERENCE_LEN,
		"Originator reference exceeds 32 bytes"
	);

	/// The origination date
	pub fn origination_date(&self) -> OriginationDate {
		self.origination_date
	}

	/// Set the origination date
	///
	/// # Errors
	///
	/// * The year has more than 4 digits, or the month/day more than 2
	pub fn set_origination_date(&mut self, date: OriginationDate) -> Result<()> {
		if !date.fits() {
			encode_err!(@BAIL Bext, "Origination date does not fit in yyyy-mm-dd");
		}

		self.origination_date = date;
		Ok(())
	}

	/// The origination time
	pub fn origination_time(&self) -> OriginationTime {
		self.origination_time
	}

	/// Set the origination time
	///
	/// # Errors
	///
	/// * Any of the fields have more than 2 digits
	pub fn set_origination_time(&mut self, time: OriginationTime) -> Result<()> {
		if !time.fits() {
			encode_err!(@BAIL Bext, "Origination time does not fit in hh-mm-ss");
		}

		self.origination_time = time;
		Ok(())
	}

	/// The time reference, a sample count since midnight
	pub fn time_reference(&self) -> u64 {
		self.time_reference
	}

	/// The time reference, split into its stored `(low, high)` 32-bit halves
	pub fn time_reference_parts(&self) -> (u32, u32) {
		(self.time_reference as u32, (self.time_reference >> 32) as u32)
	}

	/// Set the time reference
	pub fn set_time_reference(&mut self, samples: u64) {
		self.time_reference = samples;
	}

	/// The chunk version (0, 1, or 2)
	pub fn version(&self) -> u16 {
		self.version
	}

	/// Set the chunk version
	///
	/// Loudness fields are only written for version 2 chunks.
	///
	/// # Errors
	///
	/// * `version` is greater than [`MAX_VERSION`]
	pub fn set_version(&mut self, version: u16) -> Result<()> {
		if version > MAX_VERSION {
			encode_err!(@BAIL Bext, "Unknown version, expected 0, 1, or 2");
		}

		self.version = version;
		Ok(())
	}

	/// The SMPTE UMID
	pub fn umid(&self) -> &[u8; UMID_LEN] {
		&self.umid
	}

	/// Set the SMPTE UMID
	pub fn set_umid(&mut self, umid: [u8; UMID_LEN]) {
		self.umid = umid;
	}

	loudness_field!(
		/// Integrated loudness (LUFS)
		loudness_value,
		set_loudness_value,
		value
	);
	loudness_field!(
		/// Loudness range (LU)
		loudness_range,
		set_loudness_range,
		range
	);
	loudness_field!(
		/// Maximum true peak level (dBTP)
		max_true_peak_level,
		set_max_true_peak_level,
		max_true_peak_level
	);
	loudness_field!(
		/// Highest momentary loudness (LUFS)
		max_momentary_loudness,
		set_max_momentary_loudness,
		max_momentary
	);
	loudness_field!(
		/// Highest short-term loudness (LUFS)
		max_short_term_loudness,
		set_max_short_term_loudness,
		max_short_term
	);

	/// The coding history, a series of `\r\n` terminated lines
	pub fn coding_history(&self) -> &str {
		&self.coding_history
	}

	/// Replace the coding history
	pub fn set_coding_history(&mut self, coding_history: impl Into<String>) {
		self.coding_history = coding_history.into();
	}

	/// Append a line to the coding history
	///
	/// A `\r\n` separator is only inserted if the existing history doesn't already end with one.
	///
	/// # Examples
	///
	/// ```rust
	/// use wave_bwf::bext::Bext;
	///
	/// let mut bext = Bext::new();
	/// bext.set_coding_history("A=ANALOGUE,M=stereo,T=Studer A816");
	/// bext.append_coding_history("A=PCM,F=48000,W=24,M=stereo,T=capture-1.0\r\n");
	///
	/// assert_eq!(
	/// 	bext.coding_history(),
	/// 	"A=ANALOGUE,M=stereo,T=Studer A816\r\nA=PCM,F=48000,W=24,M=stereo,T=capture-1.0\r\n"
	/// );
	/// ```
	pub fn append_coding_history(&mut self, line: &str) {
		coding_history::append(&mut self.coding_history, line);
	}

	/// Read a `bext` chunk body
	///
	/// # Errors
	///
	/// * `content` is shorter than [`BEXT_HEADER_SIZE`]
	/// * **(Strict)** The date/time fields contain non-digits
	/// * **(Strict)** A text field is not valid UTF-8
	pub fn decode(content: &[u8], parse_mode: ParsingMode) -> Result<Self> {
		read::decode(content, parse_mode)
	}

	/// Write a `bext` chunk body
	///
	/// This is the fixed 602 byte header, followed by the coding history. The output is always of
	/// even length.
	pub fn encode(&self) -> Vec<u8> {
		write::encode(self)
	}

	pub(crate) fn encoded_loudness(&self) -> [u8; 10] {
		if self.version >= 2 {
			return self.loudness.to_le_bytes();
		}

		[0; 10]
	}
}

fn now_local() -> (OriginationDate, OriginationTime) {
	origination_stamp(&Local::now())
}

fn origination_stamp<T>(at: &T) -> (OriginationDate, OriginationTime)
where
	T: Datelike + Timelike,
{
	(
		OriginationDate {
			year: at.year().clamp(0, 9999) as u16,
			month: at.month() as u8,
			day: at.day() as u8,
		},
		OriginationTime {
			hour: at.hour() as u8,
			minute: at.minute() as u8,
			second: at.second() as u8,
		},
	)
}
