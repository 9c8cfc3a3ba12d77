/// The stored value of a loudness field that has not been measured
pub const LOUDNESS_UNSET: i16 = 0x7FFF;

/// Convert a loudness value to its stored fixed-point form (hundredths)
///
/// Values within `(-100, 100)` are rounded to the nearest hundredth, halfway cases away from zero.
/// Anything else (including NaN) can't be represented, and becomes [`LOUDNESS_UNSET`].
///
/// # Examples
///
/// ```rust
/// use wave_bwf::bext::{LOUDNESS_UNSET, scale_up};
///
/// assert_eq!(scale_up(-23.0), -2300);
/// assert_eq!(scale_up(0.125), 13);
/// assert_eq!(scale_up(-0.125), -13);
/// assert_eq!(scale_up(100.0), LOUDNESS_UNSET);
/// ```
pub fn scale_up(value: f64) -> i16 {
	if value > -100.0 && value < 100.0 {
		return (value * 100.0).round() as i16;
	}

	LOUDNESS_UNSET
}

/// Convert a stored loudness field back to its value
///
/// Returns `None` for [`LOUDNESS_UNSET`].
///
/// # Examples
///
/// ```rust
/// use wave_bwf::bext::{LOUDNESS_UNSET, scale_down};
///
/// assert_eq!(scale_down(-2300), Some(-23.0));
/// assert_eq!(scale_down(LOUDNESS_UNSET), None);
/// ```
pub fn scale_down(stored: i16) -> Option<f64> {
	if stored == LOUDNESS_UNSET {
		return None;
	}

	Some(f64::from(stored) / 100.0)
}

/// The five EBU R128 loudness fields of a version 2 `bext` chunk, in their stored form
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Loudness {
	pub(crate) value: i16,
	pub(crate) range: i16,
	pub(crate) max_true_peak_level: i16,
	pub(crate) max_momentary: i16,
	pub(crate) max_short_term: i16,
}

impl Loudness {
	pub(crate) const UNSET: Self = Self {
		value: LOUDNESS_UNSET,
		range: LOUDNESS_UNSET,
		max_true_peak_level: LOUDNESS_UNSET,
		max_momentary: LOUDNESS_UNSET,
		max_short_term: LOUDNESS_UNSET,
	};

	pub(crate) fn to_le_bytes(self) -> [u8; 10] {
		let mut out = [0; 10];
		for (dest, field) in out.chunks_exact_mut(2).zip([
			self.value,
			self.range,
			self.max_true_peak_level,
			self.max_momentary,
			self.max_short_term,
		]) {
			dest.copy_from_slice(&field.to_le_bytes());
		}

		out
	}
}

impl Default for Loudness {
	fn default() -> Self {
		Self::UNSET
	}
}

#[cfg(test)]
mod tests {
	use super::{LOUDNESS_UNSET, scale_down, scale_up};

	#[test_log::test]
	fn scaling_is_inverse_within_range() {
		let mut value = -99.99;
		while value < 100.0 {
			let stored = scale_up(value);
			assert_ne!(stored, LOUDNESS_UNSET, "{value} should be representable");

			let restored = scale_down(stored).unwrap();
			assert!(
				(restored - value).abs() <= 0.01,
				"{value} was restored as {restored}"
			);

			value += 0.37;
		}
	}

	#[test_log::test]
	fn rounding() {
		assert_eq!(scale_up(0.0), 0);
		assert_eq!(scale_up(1.005_1), 101);
		assert_eq!(scale_up(-1.005_1), -101);
		assert_eq!(scale_up(-0.004), 0);
		assert_eq!(scale_up(99.99), 9999);
	}

	#[test_log::test]
	fn out_of_range() {
		for value in [100.0, 250.0, -100.0, -1000.0, f64::NAN, f64::INFINITY] {
			assert_eq!(scale_up(value), LOUDNESS_UNSET);
		}

		assert_eq!(scale_down(LOUDNESS_UNSET), None);
	}
}
