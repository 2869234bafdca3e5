#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

pub mod caption;
pub mod config;
pub mod lvl;
pub mod render;

pub use {
	caption::MAX_CAPTION_LEN,
	lvl::{decode, decodeFile, Difficulty, Level, LevelMap},
	render::{composite, renderLevel, Assets, Image},
};

use {
	serde::ser,
	std::{fs::File, os},
};

pub fn toml_toStringPretty<T: ?Sized + ser::Serialize>(value: &T) -> Result<String, toml::ser::Error> {
	let mut string = String::with_capacity(128);
	value.serialize((&mut toml::ser::Serializer::pretty(&mut string)).pretty_array(false))?;
	Ok(string)
}

#[cfg(unix)]
pub fn stdoutRaw() -> File {
	use os::unix::io::FromRawFd;
	unsafe { File::from_raw_fd(1) }
}

#[cfg(windows)]
pub fn stdoutRaw() -> File {
	use {
		os::windows::io::{AsRawHandle, FromRawHandle},
		std::io,
	};
	unsafe { File::from_raw_handle(io::stdout().as_raw_handle()) }
}
