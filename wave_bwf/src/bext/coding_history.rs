const LINE_END: &str = "\r\n";

/// Generate an EBU R98 coding history line describing linear PCM
///
/// `sample_width` is in bytes. One and two channels are written as `mono` and `stereo`.
///
/// # Examples
///
/// ```rust
/// use wave_bwf::bext::generate_coding_history;
///
/// assert_eq!(
/// 	generate_coding_history(48000, 3, 2, "wave_bwf", "0.1.0"),
/// 	"A=PCM,F=48000,W=24,M=stereo,T=wave_bwf-0.1.0\r\n"
/// );
/// assert_eq!(
/// 	generate_coding_history(44100, 2, 6, "wave_bwf", "0.1.0"),
/// 	"A=PCM,F=44100,W=16,M=6,T=wave_bwf-0.1.0\r\n"
/// );
/// ```
pub fn generate_coding_history(
	sample_rate: u32,
	sample_width: u16,
	channels: u16,
	tool_name: &str,
	tool_version: &str,
) -> String {
	let mode = match channels {
		1 => String::from("mono"),
		2 => String::from("stereo"),
		n => n.to_string(),
	};

	format!(
		"A=PCM,F={sample_rate},W={},M={mode},T={tool_name}-{tool_version}{LINE_END}",
		u32::from(sample_width) * 8
	)
}

pub(super) fn append(history: &mut String, line: &str) {
	if !history.ends_with(LINE_END) {
		history.push_str(LINE_END);
	}

	history.push_str(line);
}

#[cfg(test)]
mod tests {
	use super::append;

	#[test_log::test]
	fn separator_only_when_missing() {
		let mut history = String::from("A=ANALOGUE\r\n");
		append(&mut history, "A=PCM\r\n");
		assert_eq!(history, "A=ANALOGUE\r\nA=PCM\r\n");

		let mut history = String::from("A=ANALOGUE");
		append(&mut history, "A=PCM\r\n");
		assert_eq!(history, "A=ANALOGUE\r\nA=PCM\r\n");
	}

	#[test_log::test]
	fn empty_history_gets_separator() {
		let mut history = String::new();
		append(&mut history, "A=PCM\r\n");
		assert_eq!(history, "\r\nA=PCM\r\n");
	}
}
