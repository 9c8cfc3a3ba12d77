/// Options to control how a [`WaveReader`](crate::wave::WaveReader) treats malformed input
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ParseOptions {
	pub(crate) parsing_mode: ParsingMode,
}

impl Default for ParseOptions {
	fn default() -> Self {
		Self::new()
	}
}

impl ParseOptions {
	/// Default parsing mode
	pub const DEFAULT_PARSING_MODE: ParsingMode = ParsingMode::BestAttempt;

	/// Creates a new `ParseOptions`, alias for `Default` implementation
	#[must_use]
	pub const fn new() -> Self {
		Self {
			parsing_mode: Self::DEFAULT_PARSING_MODE,
		}
	}

	/// The parsing mode to use, see [`ParsingMode`] for details
	///
	/// # Examples
	///
	/// ```rust
	/// use wave_bwf::config::{ParseOptions, ParsingMode};
	///
	/// // Archive ingest, reject anything that would not survive a rewrite
	/// let parsing_options = ParseOptions::new().parsing_mode(ParsingMode::Strict);
	/// ```
	pub fn parsing_mode(&mut self, parsing_mode: ParsingMode) -> Self {
		self.parsing_mode = parsing_mode;
		*self
	}
}

/// How strictly chunk layouts are enforced while reading
///
/// The container structure itself (the `RIFF`/`RF64` header, `fmt `, and `data`) is always
/// validated. The modes only differ in how recoverable defects are handled.
///
/// # Examples
///
/// ```rust,no_run
/// use wave_bwf::config::{ParseOptions, ParsingMode};
/// use wave_bwf::wave::WaveReader;
///
/// # fn main() -> wave_bwf::error::Result<()> {
/// let parsing_options = ParseOptions::new().parsing_mode(ParsingMode::Relaxed);
/// let mut reader = WaveReader::open_with_options("field_recording.wav", parsing_options)?;
///
/// // A mangled `bext` chunk yields empty fields rather than an error
/// let bext = reader.bext()?;
/// # Ok(()) }
/// ```
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Default)]
#[non_exhaustive]
pub enum ParsingMode {
	/// Error on any defect
	///
	/// * A `data` chunk extends past the end of the stream
	/// * A `chna` table or `r64m` entry is cut short
	/// * A `bext` date or time contains non-digits
	/// * Text can't be decoded
	/// * An extensible `fmt ` chunk has a non-PCM sub-format
	Strict,
	/// Repair what can be repaired, with a warning
	///
	/// * Truncated chunks are clamped to the bytes available
	/// * Text that isn't valid UTF-8 is decoded as Windows-1252
	/// * Malformed `bext` dates and times are zeroed
	#[default]
	BestAttempt,
	/// As [`ParsingMode::BestAttempt`], but undecodable text is discarded
	Relaxed,
}
