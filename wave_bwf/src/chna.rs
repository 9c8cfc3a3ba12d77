//! The channel to audio definition model UID mapping (`chna`)
//!
//! See [EBU Tech 3285 s7](https://tech.ebu.ch/docs/tech/tech3285s7.pdf).

use crate::config::ParsingMode;
use crate::error::Result;
use crate::macros::{decode_err, encode_err};
use crate::util::text::{decode_fixed_text, write_fixed_text};

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

const TRACK_UID_LEN: usize = 12;
const TRACK_REF_LEN: usize = 14;
const PACK_REF_LEN: usize = 11;

/// The on-disk size of a single UID entry, including its pad byte
pub const UID_ENTRY_SIZE: usize = 2 + TRACK_UID_LEN + TRACK_REF_LEN + PACK_REF_LEN + 1;

const SMALL_TABLE_SLOTS: usize = 32;

/// The most entries a `chna` table can hold
pub const MAX_UIDS: usize = 2048;

/// A single track to UID mapping
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UidEntry {
	track_index: u16,
	track_uid: String,
	track_ref: String,
	pack_ref: String,
}

impl UidEntry {
	/// Create a new entry
	///
	/// # Errors
	///
	/// * `track_uid` exceeds 12 bytes, `track_ref` 14 bytes, or `pack_ref` 11 bytes
	///
	/// # Examples
	///
	/// ```rust
	/// # fn main() -> wave_bwf::error::Result<()> {
	/// use wave_bwf::chna::UidEntry;
	///
	/// let entry = UidEntry::new(1, "ATU_00000001", "AT_00031001_01", "AP_00031001")?;
	/// assert_eq!(entry.track_index(), 1);
	///
	/// assert!(UidEntry::new(1, "ATU_000000001", "AT_00031001_01", "AP_00031001").is_err());
	/// # Ok(()) }
	/// ```
	pub fn new(
		track_index: u16,
		track_uid: impl Into<String>,
		track_ref: impl Into<String>,
		pack_ref: impl Into<String>,
	) -> Result<Self> {
		let track_uid = track_uid.into();
		let track_ref = track_ref.into();
		let pack_ref = pack_ref.into();

		if track_uid.len() > TRACK_UID_LEN {
			encode_err!(@BAIL Chna, "Track UID exceeds 12 bytes");
		}

		if track_ref.len() > TRACK_REF_LEN {
			encode_err!(@BAIL Chna, "Track format reference exceeds 14 bytes");
		}

		if pack_ref.len() > PACK_REF_LEN {
			encode_err!(@BAIL Chna, "Pack format reference exceeds 11 bytes");
		}

		Ok(Self {
			track_index,
			track_uid,
			track_ref,
			pack_ref,
		})
	}

	/// The (1-based) index of the track in the file
	pub fn track_index(&self) -> u16 {
		self.track_index
	}

	/// The audio track UID, `ATU_xxxxxxxx`
	pub fn track_uid(&self) -> &str {
		&self.track_uid
	}

	/// The audio track format reference, `AT_xxxxxxxx_xx`
	pub fn track_ref(&self) -> &str {
		&self.track_ref
	}

	/// The audio pack format reference, `AP_xxxxxxxx`
	pub fn pack_ref(&self) -> &str {
		&self.pack_ref
	}

	fn read<R>(reader: &mut R, parse_mode: ParsingMode) -> Result<Self>
	where
		R: Read,
	{
		let track_index = reader.read_u16::<LittleEndian>()?;

		let mut fields = [0; UID_ENTRY_SIZE - 2];
		reader.read_exact(&mut fields)?;

		let (track_uid, rest) = fields.split_at(TRACK_UID_LEN);
		let (track_ref, rest) = rest.split_at(TRACK_REF_LEN);
		let pack_ref = &rest[..PACK_REF_LEN];

		Ok(Self {
			track_index,
			track_uid: decode_fixed_text(track_uid, parse_mode)?,
			track_ref: decode_fixed_text(track_ref, parse_mode)?,
			pack_ref: decode_fixed_text(pack_ref, parse_mode)?,
		})
	}

	fn write(&self, out: &mut Vec<u8>) {
		let _ = out.write_u16::<LittleEndian>(self.track_index);
		write_fixed_text(out, self.track_uid.as_bytes(), TRACK_UID_LEN);
		write_fixed_text(out, self.track_ref.as_bytes(), TRACK_REF_LEN);
		write_fixed_text(out, self.pack_ref.as_bytes(), PACK_REF_LEN);
		out.push(0);
	}
}

/// A `chna` chunk
///
/// The number of tracks only counts those added with [`ChannelUidMap::add_new_track`], while
/// every entry counts towards the number of UIDs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelUidMap {
	track_count: u16,
	entries: Vec<UidEntry>,
}

impl ChannelUidMap {
	/// Create an empty map
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an entry for a track not yet in the map
	///
	/// # Errors
	///
	/// * The map already holds [`MAX_UIDS`] entries
	pub fn add_new_track(&mut self, entry: UidEntry) -> Result<()> {
		self.push(entry)?;
		self.track_count += 1;
		Ok(())
	}

	/// Add an entry reusing the index of a track already in the map
	///
	/// # Errors
	///
	/// * The map already holds [`MAX_UIDS`] entries
	pub fn add_existing_track(&mut self, entry: UidEntry) -> Result<()> {
		self.push(entry)
	}

	fn push(&mut self, entry: UidEntry) -> Result<()> {
		if self.entries.len() >= MAX_UIDS {
			encode_err!(@BAIL Chna, "Too many UIDs, the table holds at most 2048");
		}

		self.entries.push(entry);
		Ok(())
	}

	/// The number of distinct tracks
	pub fn track_count(&self) -> u16 {
		self.track_count
	}

	/// The number of UID entries
	pub fn uid_count(&self) -> u16 {
		self.entries.len() as u16
	}

	/// Get the entry at `index`
	pub fn track(&self, index: usize) -> Option<&UidEntry> {
		self.entries.get(index)
	}

	/// All entries, in order
	pub fn entries(&self) -> &[UidEntry] {
		&self.entries
	}

	/// The number of entries the on-disk table is padded to
	pub fn slot_count(&self) -> usize {
		if self.entries.len() < SMALL_TABLE_SLOTS {
			SMALL_TABLE_SLOTS
		} else {
			MAX_UIDS
		}
	}

	/// Read a `chna` chunk body
	///
	/// Exactly as many entries as the UID count claims are read, the zeroed padding slots are
	/// ignored.
	///
	/// # Errors
	///
	/// * `content` is shorter than 4 bytes
	/// * **(Strict)** `content` holds fewer entries than the UID count
	pub fn decode(content: &[u8], parse_mode: ParsingMode) -> Result<Self> {
		let mut reader = content;
		if reader.len() < 4 {
			decode_err!(@BAIL Chna, "Chunk is too short to hold the track and UID counts");
		}

		let track_count = reader.read_u16::<LittleEndian>()?;
		let mut uid_count = usize::from(reader.read_u16::<LittleEndian>()?);

		let available = reader.len() / UID_ENTRY_SIZE;
		if available < uid_count {
			if parse_mode == ParsingMode::Strict {
				decode_err!(@BAIL Chna, "Table holds fewer entries than the UID count");
			}

			log::warn!("chna: Expected {uid_count} UIDs, only {available} present, truncating");
			uid_count = available;
		}

		if usize::from(track_count) > uid_count {
			log::warn!("chna: Track count ({track_count}) exceeds UID count ({uid_count})");
		}

		let mut entries = Vec::with_capacity(uid_count);
		for _ in 0..uid_count {
			entries.push(UidEntry::read(&mut reader, parse_mode)?);
		}

		Ok(Self {
			track_count,
			entries,
		})
	}

	/// Write a `chna` chunk body, padded to 32 or 2048 slots
	pub fn encode(&self) -> Vec<u8> {
		let slots = self.slot_count();

		let mut out = Vec::with_capacity(4 + slots * UID_ENTRY_SIZE);
		let _ = out.write_u16::<LittleEndian>(self.track_count);
		let _ = out.write_u16::<LittleEndian>(self.uid_count());

		for entry in &self.entries {
			entry.write(&mut out);
		}

		out.resize(4 + slots * UID_ENTRY_SIZE, 0);
		out
	}
}

#[cfg(test)]
mod tests {
	use super::{ChannelUidMap, MAX_UIDS, UID_ENTRY_SIZE, UidEntry};
	use crate::config::ParsingMode;

	fn entry(index: u16) -> UidEntry {
		UidEntry::new(
			index,
			format!("ATU_{index:08}"),
			"AT_00010001_01",
			"AP_00010002",
		)
		.unwrap()
	}

	fn map_with(uids: u16) -> ChannelUidMap {
		let mut map = ChannelUidMap::new();
		for i in 1..=uids {
			map.add_new_track(entry(i)).unwrap();
		}

		map
	}

	#[test_log::test]
	fn small_table_padding() {
		let map = map_with(10);
		let encoded = map.encode();

		assert_eq!(encoded.len(), 4 + 32 * UID_ENTRY_SIZE);
		assert_eq!(&encoded[..4], &[10, 0, 10, 0]);
		assert!(encoded[4 + 10 * UID_ENTRY_SIZE..].iter().all(|b| *b == 0));

		assert_eq!(
			ChannelUidMap::decode(&encoded, ParsingMode::Strict).unwrap(),
			map
		);
	}

	#[test_log::test]
	fn large_table_padding() {
		let map = map_with(40);
		let encoded = map.encode();

		assert_eq!(encoded.len(), 4 + 2048 * UID_ENTRY_SIZE);
		assert_eq!(
			ChannelUidMap::decode(&encoded, ParsingMode::Strict).unwrap(),
			map
		);
	}

	#[test_log::test]
	fn entry_layout() {
		let map = map_with(1);
		let encoded = map.encode();

		assert_eq!(&encoded[4..6], &[1, 0]);
		assert_eq!(&encoded[6..18], b"ATU_00000001");
		assert_eq!(&encoded[18..32], b"AT_00010001_01");
		assert_eq!(&encoded[32..43], b"AP_00010002");
		assert_eq!(encoded[43], 0);
	}

	#[test_log::test]
	fn existing_tracks() {
		let mut map = ChannelUidMap::new();
		map.add_new_track(entry(1)).unwrap();
		map.add_new_track(entry(2)).unwrap();
		map.add_existing_track(
			UidEntry::new(2, "ATU_00000003", "AT_00010002_01", "AP_00010003").unwrap(),
		)
		.unwrap();

		assert_eq!(map.track_count(), 2);
		assert_eq!(map.uid_count(), 3);
		assert_eq!(map.track(2).unwrap().track_index(), 2);
		assert_eq!(map.track(2).unwrap().pack_ref(), "AP_00010003");
		assert!(map.track(3).is_none());

		let decoded = ChannelUidMap::decode(&map.encode(), ParsingMode::Strict).unwrap();
		assert_eq!(decoded.track_count(), 2);
		assert_eq!(decoded.uid_count(), 3);
	}

	#[test_log::test]
	fn capacity() {
		let mut map = ChannelUidMap::new();
		for _ in 0..MAX_UIDS {
			map.add_new_track(entry(1)).unwrap();
		}

		assert!(map.add_existing_track(entry(1)).is_err());
		assert_eq!(usize::from(map.uid_count()), MAX_UIDS);
	}

	#[test_log::test]
	fn short_table() {
		let map = map_with(3);
		let encoded = map.encode();
		let truncated = &encoded[..4 + 2 * UID_ENTRY_SIZE];

		assert!(ChannelUidMap::decode(truncated, ParsingMode::Strict).is_err());

		let decoded = ChannelUidMap::decode(truncated, ParsingMode::BestAttempt).unwrap();
		assert_eq!(decoded.uid_count(), 2);
		assert_eq!(decoded.track_count(), 3);
	}
}
