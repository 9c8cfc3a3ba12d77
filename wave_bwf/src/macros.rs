macro_rules! try_vec {
	($elem:expr; $size:expr) => {{ $crate::util::alloc::fallible_vec_from_element($elem, $size)? }};
}

// Shorthand for return Err(BwfError::new(ErrorKind::Foo))
//
// Usage:
// - err!(Variant)          -> return Err(BwfError::new(ErrorKind::Variant))
// - err!(Variant(Message)) -> return Err(BwfError::new(ErrorKind::Variant(Message)))
macro_rules! err {
	($variant:ident) => {
		return Err(crate::error::BwfError::new(
			crate::error::ErrorKind::$variant,
		))
	};
	($variant:ident($reason:literal)) => {
		return Err(crate::error::BwfError::new(
			crate::error::ErrorKind::$variant($reason),
		))
	};
}

// Build an `ErrorKind::Malformed` error, optionally tied to a `ChunkKind`
//
// - decode_err!(Chna, "Message")
// - decode_err!("Message")
//
// Prefix with `@BAIL` to return it instead
macro_rules! decode_err {
	($chunk:ident, $reason:literal) => {
		crate::error::BwfError::new(crate::error::ErrorKind::Malformed(
			crate::error::ChunkError::new(crate::iff::chunk::ChunkKind::$chunk, $reason),
		))
	};
	($reason:literal) => {
		crate::error::BwfError::new(crate::error::ErrorKind::Malformed(
			crate::error::ChunkError::container($reason),
		))
	};
	(@BAIL $($chunk:ident,)? $reason:literal) => {
		return Err(decode_err!($($chunk,)? $reason))
	};
}

// As `decode_err!`, for `ErrorKind::Unencodable`. Encoding errors always belong to a chunk.
macro_rules! encode_err {
	($chunk:ident, $reason:literal) => {
		crate::error::BwfError::new(crate::error::ErrorKind::Unencodable(
			crate::error::ChunkError::new(crate::iff::chunk::ChunkKind::$chunk, $reason),
		))
	};
	(@BAIL $chunk:ident, $reason:literal) => {
		return Err(encode_err!($chunk, $reason))
	};
}

// Shorthand for return Err(BwfError::from(StateError::Foo))
//
// Usage:
// - state_err!(Variant)
// - state_err!(Variant(value))
// - state_err!(Variant { field: value })
macro_rules! state_err {
	($variant:ident) => {
		return Err(crate::error::BwfError::from(
			crate::error::StateError::$variant,
		))
	};
	($variant:ident($($arg:expr),+)) => {
		return Err(crate::error::BwfError::from(
			crate::error::StateError::$variant($($arg),+),
		))
	};
	($variant:ident { $($field:ident: $value:expr),+ $(,)? }) => {
		return Err(crate::error::BwfError::from(
			crate::error::StateError::$variant { $($field: $value),+ },
		))
	};
}

pub(crate) use {decode_err, encode_err, err, state_err, try_vec};
