//! Errors raised while reading or writing a WAVE file
//!
//! Every fallible operation returns a [`BwfError`]. Its [`ErrorKind`] carries the details, and
//! the `is_*_error` predicates sort it into the broad categories a caller usually cares about.

use crate::iff::chunk::ChunkKind;

use std::collections::TryReserveError;
use std::fmt::{Display, Formatter};

/// Alias for `Result<T, BwfError>`
pub type Result<T> = std::result::Result<T, BwfError>;

/// What went wrong
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
	/// The container or one of its chunks could not be decoded
	Malformed(ChunkError),
	/// A value has no valid representation in its chunk
	Unencodable(ChunkError),
	/// Attempted to use a compression type other than `NONE`
	UnsupportedCompression,
	/// A chunk body is over the allocation limit, or a size can't be addressed by the container
	TooMuchData,
	/// A chunk claims a size that doesn't fit within the container
	SizeMismatch,
	/// Text was rejected under [`ParsingMode::Strict`](crate::config::ParsingMode::Strict)
	TextDecode(&'static str),

	/// A reader or writer was used out of order
	State(StateError),
	/// Attempted to seek outside of `[0, frame_count]`
	PositionOutOfRange {
		/// The requested frame position
		position: u64,
		/// The number of frames in the data chunk
		frame_count: u64,
	},

	/// The underlying stream failed
	Io(std::io::Error),
	/// Memory for a chunk body could not be reserved
	Alloc(TryReserveError),
}

/// Errors caused by calling reader/writer methods in the wrong state
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateError {
	/// The header has already been written, parameters can no longer change
	ParametersFrozen,
	/// A required parameter was requested or needed before it was set
	ParameterNotSet(&'static str),
	/// A parameter was given an out of range value
	InvalidParameter(&'static str),
	/// The provided frame bytes do not hold a whole number of frames
	PartialFrame {
		/// Length of the provided buffer
		len: usize,
		/// Size of a single frame (`channels * sample_width`)
		frame_size: usize,
	},
	/// A chunk that is emitted alongside the header was set after the header was written
	MetadataFrozen(ChunkKind),
	/// The underlying stream has already been released
	Closed,
}

impl Display for StateError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::ParametersFrozen => {
				write!(f, "Cannot change parameters after starting to write")
			},
			Self::ParameterNotSet(name) => write!(f, "Parameter `{name}` is not set"),
			Self::InvalidParameter(name) => write!(f, "Bad value for parameter `{name}`"),
			Self::PartialFrame { len, frame_size } => write!(
				f,
				"Frame data of {len} bytes is not a multiple of the frame size ({frame_size} bytes)"
			),
			Self::MetadataFrozen(chunk) => write!(
				f,
				"{chunk}: chunk must be set before the first frame is written"
			),
			Self::Closed => write!(f, "The stream has already been closed"),
		}
	}
}

/// A description of bad data, and the chunk it was found in
///
/// Errors in the outer `RIFF`/`RF64` header aren't tied to a chunk.
///
/// # Examples
///
/// ```rust
/// use wave_bwf::error::ChunkError;
/// use wave_bwf::iff::chunk::ChunkKind;
///
/// let chna_error = ChunkError::new(ChunkKind::Chna, "Too many UIDs");
/// assert_eq!(chna_error.chunk(), Some(ChunkKind::Chna));
/// assert_eq!(chna_error.to_string(), r#""chna": Too many UIDs"#);
///
/// let header_error = ChunkError::container("Form type is not WAVE");
/// assert_eq!(header_error.chunk(), None);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChunkError {
	chunk: Option<ChunkKind>,
	description: &'static str,
}

impl ChunkError {
	/// An error in the body of `chunk`
	#[must_use]
	pub const fn new(chunk: ChunkKind, description: &'static str) -> Self {
		Self {
			chunk: Some(chunk),
			description,
		}
	}

	/// An error in the container itself
	#[must_use]
	pub const fn container(description: &'static str) -> Self {
		Self {
			chunk: None,
			description,
		}
	}

	/// The chunk at fault, if any
	pub fn chunk(&self) -> Option<ChunkKind> {
		self.chunk
	}

	/// What was wrong with it
	pub fn description(&self) -> &'static str {
		self.description
	}
}

impl Display for ChunkError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.chunk {
			Some(chunk) => write!(f, "{chunk}: {}", self.description),
			None => f.write_str(self.description),
		}
	}
}

/// Errors that could occur within `wave_bwf`
#[derive(Debug)]
pub struct BwfError {
	pub(crate) kind: ErrorKind,
}

impl BwfError {
	/// Create a `BwfError` from an [`ErrorKind`]
	///
	/// # Examples
	///
	/// ```rust
	/// use wave_bwf::error::{BwfError, ErrorKind};
	///
	/// let too_much_data = BwfError::new(ErrorKind::TooMuchData);
	/// assert!(too_much_data.is_format_error());
	/// ```
	#[must_use]
	pub const fn new(kind: ErrorKind) -> Self {
		Self { kind }
	}

	/// Returns the [`ErrorKind`]
	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}

	/// Whether the input (or output) violates the container's structure
	pub fn is_format_error(&self) -> bool {
		matches!(
			self.kind,
			ErrorKind::Malformed(_)
				| ErrorKind::Unencodable(_)
				| ErrorKind::UnsupportedCompression
				| ErrorKind::SizeMismatch
				| ErrorKind::TooMuchData
				| ErrorKind::TextDecode(_)
		)
	}

	/// Whether a method was called in the wrong reader/writer state
	pub fn is_state_error(&self) -> bool {
		matches!(self.kind, ErrorKind::State(_))
	}

	/// Whether a frame position was out of range
	pub fn is_range_error(&self) -> bool {
		matches!(self.kind, ErrorKind::PositionOutOfRange { .. })
	}

	/// Whether the error originated in the underlying stream
	pub fn is_io_error(&self) -> bool {
		matches!(self.kind, ErrorKind::Io(_))
	}
}

impl std::error::Error for BwfError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self.kind {
			ErrorKind::Io(ref err) => Some(err),
			ErrorKind::Alloc(ref err) => Some(err),
			_ => None,
		}
	}
}

macro_rules! impl_from {
	($($source:ty => $variant:ident),+ $(,)?) => {
		$(
			impl From<$source> for BwfError {
				fn from(input: $source) -> Self {
					Self::new(ErrorKind::$variant(input))
				}
			}
		)+
	};
}

impl_from! {
	StateError => State,
	std::io::Error => Io,
	TryReserveError => Alloc,
}

impl Display for BwfError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.kind {
			ErrorKind::Malformed(err) => write!(f, "Malformed file, {err}"),
			ErrorKind::Unencodable(err) => write!(f, "Unable to encode, {err}"),
			ErrorKind::UnsupportedCompression => {
				write!(f, "Unsupported compression type, only `NONE` is allowed")
			},
			ErrorKind::TooMuchData => write!(
				f,
				"Attempted to read/write an abnormally large amount of data"
			),
			ErrorKind::SizeMismatch => write!(
				f,
				"Encountered an invalid chunk size, either too big or too small to be valid"
			),
			ErrorKind::TextDecode(message) => write!(f, "Text decoding: {message}"),

			ErrorKind::State(ref state_err) => write!(f, "{state_err}"),
			ErrorKind::PositionOutOfRange {
				position,
				frame_count,
			} => write!(
				f,
				"Position {position} is not in range (0..={frame_count})"
			),

			ErrorKind::Io(ref err) => write!(f, "{err}"),
			ErrorKind::Alloc(ref err) => write!(f, "{err}"),
		}
	}
}
