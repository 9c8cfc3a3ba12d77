/// Options to control how `wave_bwf` writes a file
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct WriteOptions {
	pub(crate) rf64_threshold: u64,
	pub(crate) tool_name: &'static str,
	pub(crate) tool_version: &'static str,
	pub(crate) extensible_format: bool,
}

impl WriteOptions {
	/// Default payload size, in bytes, above which the RF64 layout is chosen
	///
	/// This leaves some headroom under the 32-bit limit for auxiliary chunks.
	pub const DEFAULT_RF64_THRESHOLD: u64 = 2_140_483_647;

	/// Creates a new `WriteOptions`, alias for `Default` implementation
	///
	/// See also: [`WriteOptions::default`]
	///
	/// # Examples
	///
	/// ```rust
	/// use wave_bwf::config::WriteOptions;
	///
	/// let write_options = WriteOptions::new();
	/// ```
	pub const fn new() -> Self {
		Self {
			rf64_threshold: Self::DEFAULT_RF64_THRESHOLD,
			tool_name: env!("CARGO_PKG_NAME"),
			tool_version: env!("CARGO_PKG_VERSION"),
			extensible_format: false,
		}
	}

	/// The payload size, in bytes, above which the RF64 layout is used
	///
	/// The payload size is the declared frame count multiplied by the frame size, or the size of the
	/// first write if no frame count was declared.
	///
	/// # Examples
	///
	/// ```rust
	/// use wave_bwf::config::WriteOptions;
	///
	/// // Always write RF64, even for tiny files
	/// let options = WriteOptions::new().rf64_threshold(0);
	/// ```
	pub fn rf64_threshold(mut self, rf64_threshold: u64) -> Self {
		self.rf64_threshold = rf64_threshold;
		self
	}

	/// The tool name and version recorded in generated coding history lines (`T=<name>-<version>`)
	///
	/// # Examples
	///
	/// ```rust
	/// use wave_bwf::config::WriteOptions;
	///
	/// let options = WriteOptions::new().tool("my_recorder", "2.1.0");
	/// ```
	pub fn tool(mut self, name: &'static str, version: &'static str) -> Self {
		self.tool_name = name;
		self.tool_version = version;
		self
	}

	/// Whether to write a `WAVE_FORMAT_EXTENSIBLE` `fmt ` chunk rather than plain `WAVE_FORMAT_PCM`
	///
	/// The extensible chunk declares every bit of the sample container as valid, and assigns the
	/// usual speaker positions for 1, 2, 4, 6, and 8 channels (see
	/// [`ChannelMask::for_channels`](crate::iff::fmt::ChannelMask::for_channels)). Other channel
	/// counts are written without speaker positions.
	///
	/// # Examples
	///
	/// ```rust
	/// use wave_bwf::config::WriteOptions;
	///
	/// // A 5.1 mix for tools that want a channel mask
	/// let options = WriteOptions::new().extensible_format(true);
	/// ```
	pub fn extensible_format(mut self, extensible_format: bool) -> Self {
		self.extensible_format = extensible_format;
		self
	}
}

impl Default for WriteOptions {
	/// The default implementation for `WriteOptions`
	///
	/// The defaults are as follows:
	///
	/// ```rust,ignore
	/// WriteOptions {
	/// 	rf64_threshold: Self::DEFAULT_RF64_THRESHOLD,
	/// 	tool_name: env!("CARGO_PKG_NAME"),
	/// 	tool_version: env!("CARGO_PKG_VERSION"),
	/// 	extensible_format: false,
	/// }
	/// ```
	fn default() -> Self {
		Self::new()
	}
}
