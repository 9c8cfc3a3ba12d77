use crate::config::global_options;
use crate::error::Result;
use crate::macros::err;

/// A `Vec` of `expected_size` copies of `element`, bounded by the thread's allocation limit
///
/// Chunk bodies go through `try_vec!`, which calls this.
pub(crate) fn fallible_vec_from_element<T>(element: T, expected_size: usize) -> Result<Vec<T>>
where
	T: Clone,
{
	if expected_size == 0 {
		return Ok(Vec::new());
	}

	if expected_size > global_options().allocation_limit {
		err!(TooMuchData);
	}

	let mut v = Vec::new();
	v.try_reserve_exact(expected_size)?;
	v.resize(expected_size, element);

	Ok(v)
}
