use std::cell::Cell;

thread_local! {
	static GLOBAL_OPTIONS: Cell<GlobalOptions> = const { Cell::new(GlobalOptions::new()) };
}

pub(crate) fn global_options() -> GlobalOptions {
	GLOBAL_OPTIONS.get()
}

/// Options shared by every reader and writer on the current thread
///
/// # Examples
///
/// ```rust
/// use wave_bwf::config::{GlobalOptions, apply_global_options};
///
/// // Production files here carry `axml` chunks of up to 64 MiB
/// apply_global_options(GlobalOptions::new().allocation_limit(64 * 1024 * 1024));
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct GlobalOptions {
	pub(crate) allocation_limit: usize,
}

impl GlobalOptions {
	/// Default limit, in bytes, for the body of any single metadata chunk
	pub const DEFAULT_ALLOCATION_LIMIT: usize = 16 * 1024 * 1024;

	/// Creates a new `GlobalOptions`, alias for `Default` implementation
	#[must_use]
	pub const fn new() -> Self {
		Self {
			allocation_limit: Self::DEFAULT_ALLOCATION_LIMIT,
		}
	}

	/// The largest metadata chunk body, in bytes, that will be buffered
	///
	/// `bext`, `chna`, `r64m`, `axml`, `levl`, and `MD5 ` bodies are read into memory when first
	/// requested. A body larger than this fails with
	/// [`ErrorKind::TooMuchData`](crate::error::ErrorKind::TooMuchData) instead of being allocated.
	///
	/// Frames are only buffered as requested through
	/// [`WaveReader::read_frames`](crate::wave::WaveReader::read_frames), and are not affected.
	pub fn allocation_limit(mut self, allocation_limit: usize) -> Self {
		self.allocation_limit = allocation_limit;
		self
	}
}

impl Default for GlobalOptions {
	fn default() -> Self {
		Self::new()
	}
}

/// Replace the [`GlobalOptions`] of the current thread
///
/// Readers created before the call are affected too, as chunks are buffered lazily.
pub fn apply_global_options(options: GlobalOptions) {
	GLOBAL_OPTIONS.set(options);
}
