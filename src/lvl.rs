//! LaserTank `.lvl` files: back-to-back fixed-size records, no header, no count.
//!
//! Each record is laid out as
//!
//! | bytes | field                                 |
//! |-------|---------------------------------------|
//! | 256   | map, 16 rows of 16 tile codes         |
//! | 31    | level name, zero-terminated if short  |
//! | 256   | hint, zero-terminated if short        |
//! | 31    | author name, zero-terminated if short |
//! | 1     | difficulty                            |
//! | 1     | unused                                |

use {
	byteorder::ReadBytesExt,
	core::fmt,
	log::debug,
	memchr::memchr,
	rand::{seq::SliceRandom, Rng},
	serde::{Serialize, Serializer},
	std::{
		fs,
		io::{self, ErrorKind, Read},
		path::{Path, PathBuf},
	},
	thiserror::Error,
};

pub const MAP_SIZE: usize = 16;
pub const MAP_LEN: usize = MAP_SIZE.pow(2);
pub const NAME_LEN: usize = 31;
pub const HINT_LEN: usize = 256;
pub const RECORD_LEN: usize = MAP_LEN + NAME_LEN + HINT_LEN + NAME_LEN + 2;

/// Tile codes indexed `[row][col]`.
pub type LevelMap = [[u8; MAP_SIZE]; MAP_SIZE];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Difficulty {
	Unset,
	Kids,
	Easy,
	Medium,
	Hard,
	Deadly,
	Unknown(u8),
}

impl Difficulty {
	#[must_use]
	pub const fn raw(self) -> u8 {
		match self {
			Self::Unset => 0,
			Self::Kids => 1,
			Self::Easy => 2,
			Self::Medium => 4,
			Self::Hard => 8,
			Self::Deadly => 16,
			Self::Unknown(byte) => byte,
		}
	}
}

impl From<u8> for Difficulty {
	fn from(byte: u8) -> Self {
		match byte {
			0 => Self::Unset,
			1 => Self::Kids,
			2 => Self::Easy,
			4 => Self::Medium,
			8 => Self::Hard,
			16 => Self::Deadly,
			byte => Self::Unknown(byte),
		}
	}
}

impl fmt::Display for Difficulty {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Unset => f.write_str("Unset"),
			Self::Kids => f.write_str("Kids"),
			Self::Easy => f.write_str("Easy"),
			Self::Medium => f.write_str("Medium"),
			Self::Hard => f.write_str("Hard"),
			Self::Deadly => f.write_str("Deadly"),
			Self::Unknown(byte) => write!(f, "{byte}"),
		}
	}
}

// stored the way the file stores it
impl Serialize for Difficulty {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u8(self.raw())
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Level {
	pub levelName: String,
	pub authorName: String,
	pub hint: String,
	pub difficulty: Difficulty,
	pub levelMap: LevelMap,
}

impl Level {
	/// Reads one whole record. A reader that runs dry mid-record yields `ErrorKind::UnexpectedEof`.
	pub fn read(reader: &mut impl Read) -> io::Result<Self> {
		let mut levelMap = [[0; MAP_SIZE]; MAP_SIZE];
		for row in &mut levelMap {
			reader.read_exact(row)?;
		}
		let levelName = readText::<NAME_LEN>(reader)?;
		let hint = readText::<HINT_LEN>(reader)?;
		let authorName = readText::<NAME_LEN>(reader)?;
		let difficulty = Difficulty::from(reader.read_u8()?);
		reader.read_u8()?;
		Ok(Self { levelName, authorName, hint, difficulty, levelMap })
	}
}

/// Consumes the whole `N`-byte block; everything from the first zero on is ignored.
fn readText<const N: usize>(reader: &mut impl Read) -> io::Result<String> {
	let mut block = [0; N];
	reader.read_exact(&mut block)?;
	Ok(latin1(&block[..memchr(0, &block).unwrap_or(N)]))
}

/// One char per byte, by numeric value.
#[must_use]
pub fn latin1(bytes: &[u8]) -> String {
	bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Decodes every whole record of `buffer`; a trailing partial record is dropped.
#[must_use]
pub fn decode(mut buffer: &[u8]) -> Vec<Level> {
	let mut levels = Vec::with_capacity(buffer.len() / RECORD_LEN);
	while buffer.len() >= RECORD_LEN {
		match Level::read(&mut buffer) {
			Err(_) => break,
			Ok(level) => levels.push(level),
		}
	}
	if !buffer.is_empty() {
		debug!("ignoring {} trailing bytes after {} levels", buffer.len(), levels.len());
	}
	levels
}

/// Like [`decode`], but for a stream. Only errors other than running out of bytes are returned.
pub fn readLevels(reader: &mut impl Read) -> io::Result<Vec<Level>> {
	let mut levels = Vec::new();
	loop {
		match Level::read(reader) {
			Ok(level) => levels.push(level),
			Err(err) if err.kind() == ErrorKind::UnexpectedEof => break,
			Err(err) => return Err(err),
		}
	}
	Ok(levels)
}

#[derive(Debug, Error)]
pub enum LvlError {
	#[error("{path:?}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

pub fn decodeFile(path: impl AsRef<Path>) -> Result<Vec<Level>, LvlError> {
	let path = path.as_ref();
	let buffer = fs::read(path).map_err(|source| LvlError::Io { path: path.to_owned(), source })?;
	let levels = decode(&buffer);
	debug!("{path:?}: {} levels", levels.len());
	Ok(levels)
}

pub fn pickRandom<'a, R: Rng + ?Sized>(levels: &'a [Level], rng: &mut R) -> Option<&'a Level> {
	levels.choose(rng)
}

pub mod tile {
	use {super::LevelMap, std::collections::BTreeMap};

	pub const GROUND: u8 = 0;
	pub const TANK: u8 = 1;
	pub const FLAG: u8 = 2;
	pub const WATER: u8 = 3;
	pub const STONE_BLOCK: u8 = 4;
	pub const PUSHABLE_BLOCK: u8 = 5;
	pub const BRICKS: u8 = 6;
	pub const ANTITANK_UP: u8 = 7;
	pub const MIRROR_UP_LEFT: u8 = 11;
	pub const CONVEYOR_UP: u8 = 15;
	pub const GLASS_BLOCK: u8 = 19;
	pub const MOVABLE_MIRROR_UP_LEFT: u8 = 20;
	pub const ICE: u8 = 24;
	pub const CRACKED_ICE: u8 = 25;
	pub const TUNNEL_FIRST: u8 = 64;
	pub const TUNNEL_CHANNELS: u8 = 8;

	/// `channel` is taken modulo 8.
	#[must_use]
	pub const fn tunnel(channel: u8) -> u8 {
		TUNNEL_FIRST + 2 * (channel % TUNNEL_CHANNELS)
	}

	#[must_use]
	pub fn name(code: u8) -> Option<&'static str> {
		static NAMES: [&str; 26] = [
			"Ground",
			"Tank",
			"Flag",
			"Water",
			"Stone block",
			"Pushable block",
			"Bricks",
			"Antitank (up)",
			"Antitank (right)",
			"Antitank (down)",
			"Antitank (left)",
			"Mirror (up-left)",
			"Mirror (up-right)",
			"Mirror (down-right)",
			"Mirror (down-left)",
			"Conveyor (up)",
			"Conveyor (right)",
			"Conveyor (down)",
			"Conveyor (left)",
			"Glass block",
			"Movable mirror (up-left)",
			"Movable mirror (up-right)",
			"Movable mirror (down-right)",
			"Movable mirror (down-left)",
			"Ice",
			"Cracked ice",
		];
		static TUNNELS: [&str; TUNNEL_CHANNELS as usize] = [
			"Tunnel (0, red)",
			"Tunnel (1, green)",
			"Tunnel (2, blue)",
			"Tunnel (3, cyan)",
			"Tunnel (4, yellow)",
			"Tunnel (5, pink)",
			"Tunnel (6, white)",
			"Tunnel (7, black)",
		];
		match code {
			0..=CRACKED_ICE => Some(NAMES[code as usize]),
			TUNNEL_FIRST..=78 if code % 2 == 0 => Some(TUNNELS[((code - TUNNEL_FIRST) / 2) as usize]),
			_ => None,
		}
	}

	/// Every code used in `levelMaps`, named; codes outside the tile table are called "unknown".
	pub fn legend<'a>(levelMaps: impl IntoIterator<Item = &'a LevelMap>) -> BTreeMap<u8, &'static str> {
		let mut legend = BTreeMap::new();
		for &code in levelMaps.into_iter().flatten().flatten() {
			legend.entry(code).or_insert_with(|| name(code).unwrap_or("unknown"));
		}
		legend
	}
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		rand::{rngs::StdRng, SeedableRng},
	};

	fn record(levelMap: &LevelMap, levelName: &[u8], hint: &[u8], authorName: &[u8], difficulty: u8) -> Vec<u8> {
		fn block(text: &[u8], len: usize) -> impl Iterator<Item = u8> + '_ {
			text.iter().copied().chain(core::iter::repeat(0)).take(len)
		}
		let mut record = Vec::with_capacity(RECORD_LEN);
		record.extend(levelMap.iter().flatten());
		record.extend(block(levelName, NAME_LEN));
		record.extend(block(hint, HINT_LEN));
		record.extend(block(authorName, NAME_LEN));
		record.extend([difficulty, 0]);
		assert_eq!(record.len(), RECORD_LEN);
		record
	}

	fn countingMap() -> LevelMap {
		let mut levelMap = [[0; MAP_SIZE]; MAP_SIZE];
		for (row, codes) in levelMap.iter_mut().enumerate() {
			for (col, code) in codes.iter_mut().enumerate() {
				*code = (row * MAP_SIZE + col) as u8;
			}
		}
		levelMap
	}

	#[test]
	fn record_len() {
		assert_eq!(RECORD_LEN, 576);
	}

	#[test]
	fn decodes_every_field() {
		let levelMap = countingMap();
		let buffer = record(&levelMap, b"Cake Walk", b"Push it\nthen shoot", b"Jim", 2);
		let levels = decode(&buffer);
		assert_eq!(
			levels,
			[Level {
				levelName: "Cake Walk".into(),
				authorName: "Jim".into(),
				hint: "Push it\nthen shoot".into(),
				difficulty: Difficulty::Easy,
				levelMap,
			}]
		);
	}

	#[test]
	fn map_is_row_major_as_stored() {
		let buffer = record(&countingMap(), b"", b"", b"", 0);
		let levelMap = decode(&buffer)[0].levelMap;
		assert_eq!(levelMap[0][1], buffer[1]);
		assert_eq!(levelMap[1][0], buffer[MAP_SIZE]);
		assert_eq!(levelMap[15][15], buffer[MAP_LEN - 1]);
	}

	#[test]
	fn whole_and_partial_record_counts() {
		let one = record(&countingMap(), b"a", b"", b"b", 0);
		for k in 0..4 {
			let buffer = one.repeat(k);
			assert_eq!(decode(&buffer).len(), k);
			for r in [1, 300, RECORD_LEN - 1] {
				let mut buffer = buffer.clone();
				buffer.extend(&one[..r]);
				assert_eq!(decode(&buffer).len(), k);
			}
		}
	}

	#[test]
	fn keeps_record_order() {
		let mut buffer = record(&[[1; MAP_SIZE]; MAP_SIZE], b"first", b"", b"x", 1);
		buffer.extend(record(&[[2; MAP_SIZE]; MAP_SIZE], b"second", b"", b"y", 16));
		let levels = decode(&buffer);
		assert_eq!(levels[0].levelName, "first");
		assert_eq!(levels[0].levelMap, [[1; MAP_SIZE]; MAP_SIZE]);
		assert_eq!(levels[1].levelName, "second");
		assert_eq!(levels[1].difficulty, Difficulty::Deadly);
	}

	#[test]
	fn empty_buffer_has_no_levels() {
		assert!(decode(&[]).is_empty());
		assert!(decode(&[7; RECORD_LEN - 1]).is_empty());
	}

	#[test]
	fn text_stops_at_first_zero() {
		let name = b"Alpha\0Junk left by the editor";
		let buffer = record(&countingMap(), name, b"hint\0stale", name, 0);
		let level = &decode(&buffer)[0];
		assert_eq!(level.levelName, "Alpha");
		assert_eq!(level.authorName, "Alpha");
		assert_eq!(level.hint, "hint");
	}

	#[test]
	fn text_without_zero_fills_the_block() {
		let name = [b'n'; NAME_LEN];
		let hint = [b'h'; HINT_LEN];
		let level = &decode(&record(&countingMap(), &name, &hint, &name, 8))[0];
		assert_eq!(level.levelName.len(), NAME_LEN);
		assert_eq!(level.authorName.len(), NAME_LEN);
		assert_eq!(level.hint.len(), HINT_LEN);
		assert_eq!(level.difficulty, Difficulty::Hard);
	}

	#[test]
	fn truncation_is_idempotent() {
		let fields: [&[u8]; 3] = [b"Maze\0\x01\x02", b"Go left\nthen\0right", b"\xC9mile\0zz"];
		let level = &decode(&record(&countingMap(), fields[0], fields[1], fields[2], 0))[0];
		for (text, field) in [&level.levelName, &level.hint, &level.authorName].into_iter().zip(fields) {
			let reencoded: Vec<u8> = text.chars().map(|c| c as u8).collect();
			assert_eq!(reencoded, &field[..memchr(0, field).unwrap_or(field.len())]);
		}
		assert_eq!(level.authorName, "\u{C9}mile");
	}

	#[test]
	fn difficulty_bytes() {
		assert_eq!(Difficulty::from(4), Difficulty::Medium);
		assert_eq!(Difficulty::from(0), Difficulty::Unset);
		assert_eq!(Difficulty::from(3), Difficulty::Unknown(3));
		for byte in 0..=u8::MAX {
			assert_eq!(Difficulty::from(byte).raw(), byte);
		}
		assert_eq!(Difficulty::Unknown(12).to_string(), "12");
		assert_eq!(Difficulty::Kids.to_string(), "Kids");
	}

	#[test]
	fn out_of_range_map_codes_pass_through() {
		let levelMap = [[0xFF; MAP_SIZE]; MAP_SIZE];
		assert_eq!(decode(&record(&levelMap, b"", b"", b"", 0))[0].levelMap, levelMap);
	}

	#[test]
	fn reads_levels_from_a_stream() {
		let mut buffer = record(&countingMap(), b"one", b"", b"", 0).repeat(2);
		buffer.extend([1, 2, 3]);
		assert_eq!(readLevels(&mut buffer.as_slice()).unwrap().len(), 2);
	}

	#[test]
	fn unreadable_file_is_an_io_failure() {
		let path = std::env::temp_dir().join("lasertank_tweeter-no-such-dir").join("missing.lvl");
		assert!(matches!(decodeFile(&path), Err(LvlError::Io { path: errPath, .. }) if errPath == path));
	}

	#[test]
	fn decodes_a_file() {
		let path = std::env::temp_dir().join(format!("lasertank_tweeter-{}.lvl", std::process::id()));
		fs::write(&path, record(&countingMap(), b"On disk", b"", b"", 1)).unwrap();
		let levels = decodeFile(&path).unwrap();
		fs::remove_file(&path).unwrap();
		assert_eq!(levels[0].levelName, "On disk");
	}

	#[test]
	fn random_pick() {
		let rng = &mut StdRng::seed_from_u64(7);
		assert!(pickRandom(&[], rng).is_none());
		let mut buffer = Vec::new();
		for name in [b"a", b"b", b"c"] {
			buffer.extend(record(&countingMap(), name, b"", b"", 0));
		}
		let levels = decode(&buffer);
		assert!(levels.contains(pickRandom(&levels, rng).unwrap()));
		let [a, b] = [1, 1].map(|seed| pickRandom(&levels, &mut StdRng::seed_from_u64(seed)).unwrap().levelName.clone());
		assert_eq!(a, b);
	}

	#[test]
	fn tile_names() {
		assert_eq!(tile::name(tile::GROUND), Some("Ground"));
		assert_eq!(tile::name(tile::CRACKED_ICE), Some("Cracked ice"));
		assert_eq!(tile::name(tile::tunnel(3)), Some("Tunnel (3, cyan)"));
		assert_eq!(tile::tunnel(3), 70);
		assert_eq!(tile::name(65), None);
		assert_eq!(tile::name(26), None);
		assert_eq!(tile::name(80), None);
	}

	#[test]
	fn tile_legend() {
		let mut levelMap = [[tile::GROUND; MAP_SIZE]; MAP_SIZE];
		levelMap[3][4] = tile::tunnel(7);
		let mut other = [[tile::ICE; MAP_SIZE]; MAP_SIZE];
		other[0][0] = 99;
		let legend = tile::legend([&levelMap, &other]);
		assert_eq!(
			legend.into_iter().collect::<Vec<_>>(),
			[(0, "Ground"), (24, "Ice"), (78, "Tunnel (7, black)"), (99, "unknown")]
		);
	}
}
