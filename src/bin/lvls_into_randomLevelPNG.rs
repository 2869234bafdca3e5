#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	anyhow::Context,
	clap::Parser,
	env_logger::Env,
	lasertank_tweeter::{
		caption,
		config::Config,
		decodeFile,
		lvl::{pickRandom, Level},
		renderLevel, Assets,
	},
	log::{error, info, warn},
	rand::{rngs::StdRng, SeedableRng},
	std::{
		fs::File,
		io::{self, BufWriter, Write},
		path::PathBuf,
		process::ExitCode,
	},
};

/// Picks one level out of the given .lvl files, renders it to a PNG and prints its caption.
#[derive(Parser)]
struct Args {
	#[clap(required = true)]
	lvlPaths: Vec<PathBuf>,

	/// Defaults to lasertank_tweeter.toml, when present
	#[clap(long)]
	config: Option<PathBuf>,

	#[clap(long = "tileAtlas")]
	tileAtlas: Option<PathBuf>,

	#[clap(long = "borderFrame")]
	borderFrame: Option<PathBuf>,

	#[clap(long, short)]
	output: Option<PathBuf>,

	#[clap(long)]
	seed: Option<u64>,

	#[clap(long, short)]
	verbose: bool,
}

impl Args {
	/// Flags win over the config file.
	fn overriding(&self, config: Config) -> Config {
		Config {
			tileAtlas: self.tileAtlas.clone().unwrap_or(config.tileAtlas),
			borderFrame: self.borderFrame.clone().unwrap_or(config.borderFrame),
			output: self.output.clone().unwrap_or(config.output),
		}
	}
}

fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();
	env_logger::Builder::from_env(Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }))
		.init();

	let Config { tileAtlas, borderFrame, output } =
		args.overriding(Config::loadOrDefault(args.config.as_deref())?);
	let Args { lvlPaths, seed, .. } = args;

	let mut levels = Vec::<Level>::new();
	for path in &lvlPaths {
		match decodeFile(path) {
			Err(err) => warn!("skipping {err}"),
			Ok(decoded) => levels.extend(decoded),
		}
	}
	info!("{} levels in {} files", levels.len(), lvlPaths.len());

	let rng = &mut match seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_entropy(),
	};
	let Some(level) = pickRandom(&levels, rng) else {
		error!("no levels to pick from");
		return Ok(ExitCode::FAILURE);
	};

	let caption = caption::format(level);
	writeln!(io::stdout().lock(), "{caption}")?;

	let assets = match Assets::load(&tileAtlas, &borderFrame) {
		Err(err) => {
			error!("{:#}", anyhow::Error::from(err));
			return Ok(ExitCode::FAILURE);
		}
		Ok(assets) => assets,
	};
	let file = File::create(&output).with_context(|| format!("{output:?}"))?;
	renderLevel(level, &assets).writePng(BufWriter::new(file)).with_context(|| format!("{output:?}"))?;
	info!("{:?} rendered to {output:?}", level.levelName);

	Ok(ExitCode::SUCCESS)
}
