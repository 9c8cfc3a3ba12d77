use std::ops::BitOr;

/// Speaker positions of a `WAVE_FORMAT_EXTENSIBLE` stream (`dwChannelMask`)
///
/// Bit `n` set means the stream carries the `n`th speaker position, with channels stored in
/// ascending bit order. Channels beyond the highest set bit have no assigned position.
///
/// # Examples
///
/// ```rust
/// use wave_bwf::iff::fmt::ChannelMask;
///
/// let stereo = ChannelMask::FRONT_LEFT | ChannelMask::FRONT_RIGHT;
/// assert_eq!(stereo, ChannelMask::stereo());
/// assert_eq!(stereo.channel_count(), 2);
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
#[repr(transparent)]
pub struct ChannelMask(pub(crate) u32);

#[allow(missing_docs)]
impl ChannelMask {
	pub const FRONT_LEFT: Self = Self(0x1);
	pub const FRONT_RIGHT: Self = Self(0x2);
	pub const FRONT_CENTER: Self = Self(0x4);
	pub const LOW_FREQUENCY: Self = Self(0x8);
	pub const BACK_LEFT: Self = Self(0x10);
	pub const BACK_RIGHT: Self = Self(0x20);
	pub const SIDE_LEFT: Self = Self(0x200);
	pub const SIDE_RIGHT: Self = Self(0x400);
}

impl ChannelMask {
	/// Create a mask from its raw bits
	#[must_use]
	pub const fn from_bits(bits: u32) -> Self {
		Self(bits)
	}

	/// Front left and right
	#[must_use]
	pub const fn stereo() -> Self {
		Self(Self::FRONT_LEFT.0 | Self::FRONT_RIGHT.0)
	}

	/// The usual layout for a stream of `channels` channels
	///
	/// Covers mono, stereo, quad, 5.1, and 7.1. Any other count has no implied layout and
	/// yields an empty mask.
	#[must_use]
	pub const fn for_channels(channels: u16) -> Self {
		let bits = match channels {
			1 => Self::FRONT_CENTER.0,
			2 => Self::stereo().0,
			4 => Self::stereo().0 | Self::BACK_LEFT.0 | Self::BACK_RIGHT.0,
			6 => 0x3F,
			8 => 0x3F | Self::SIDE_LEFT.0 | Self::SIDE_RIGHT.0,
			_ => 0,
		};

		Self(bits)
	}

	/// The raw bits
	#[must_use]
	pub const fn bits(self) -> u32 {
		self.0
	}

	/// The number of speaker positions assigned
	#[must_use]
	pub const fn channel_count(self) -> u32 {
		self.0.count_ones()
	}
}

impl BitOr for ChannelMask {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self::Output {
		Self(self.0 | rhs.0)
	}
}
