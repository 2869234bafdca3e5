use {
	const_format::concatcp,
	serde::Deserialize,
	std::{
		fs, io,
		path::{Path, PathBuf},
	},
	thiserror::Error,
};

pub const DEFAULT_CONFIG_PATH: &str = concatcp!(env!("CARGO_PKG_NAME"), ".toml");

/// Every key is optional:
///
/// ```toml
/// tileAtlas = "tiles.png"
/// borderFrame = "frame.png"
/// output = "output.png"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub tileAtlas: PathBuf,
	pub borderFrame: PathBuf,
	pub output: PathBuf,
}

impl Default for Config {
	fn default() -> Self {
		Self { tileAtlas: "tiles.png".into(), borderFrame: "frame.png".into(), output: "output.png".into() }
	}
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("{path:?}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("{path:?}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

impl Config {
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let string = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
		toml::from_str(&string).map_err(|source| ConfigError::Parse { path: path.to_owned(), source })
	}

	/// An explicit path must exist; otherwise [`DEFAULT_CONFIG_PATH`] is read if present.
	pub fn loadOrDefault(path: Option<&Path>) -> Result<Self, ConfigError> {
		match path {
			Some(path) => Self::load(path),
			None if Path::new(DEFAULT_CONFIG_PATH).is_file() => Self::load(DEFAULT_CONFIG_PATH),
			None => Ok(Self::default()),
		}
	}
}
