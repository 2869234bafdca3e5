#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	anyhow::Context,
	clap::Parser,
	env_logger::Env,
	lasertank_tweeter::{
		lvl::{self, tile},
		stdoutRaw, toml_toStringPretty, Level,
	},
	log::debug,
	serde::Serialize,
	std::{
		collections::BTreeMap,
		fs::File,
		io::{self, BufReader, Write},
		path::PathBuf,
	},
};

/// Dumps every level of a .lvl file (stdin when no path is given) as TOML.
#[derive(Parser)]
struct Args {
	lvlPath: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
	let Args { lvlPath } = Args::parse();

	let levels = match &lvlPath {
		Some(path) => {
			let file = File::open(path).with_context(|| format!("{path:?}"))?;
			lvl::readLevels(&mut BufReader::new(file)).with_context(|| format!("{path:?}"))?
		}
		None => lvl::readLevels(&mut io::stdin().lock()).context("stdin")?,
	};
	debug!("{} levels", levels.len());

	stdoutRaw().write_all(toml_toStringPretty(&LvlTOML::new(levels))?.as_bytes())?;

	Ok(())
}

#[derive(Serialize)]
struct LvlTOML {
	#[serde(rename = "level")]
	levels: Vec<Level>,

	/// tile code -> name, for every code the levels use
	tiles: BTreeMap<String, &'static str>,
}

impl LvlTOML {
	fn new(levels: Vec<Level>) -> Self {
		let tiles = tile::legend(levels.iter().map(|level| &level.levelMap))
			.into_iter()
			.map(|(code, name)| (code.to_string(), name))
			.collect();
		Self { levels, tiles }
	}
}
