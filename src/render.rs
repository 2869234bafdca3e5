//! Draws a level map the way the game shows it: 32×32 tiles from a horizontal atlas strip,
//! inside a decorative border frame.

use {
	crate::lvl::{tile::TUNNEL_FIRST, Level, LevelMap, MAP_SIZE},
	core::{fmt, iter},
	log::{debug, trace},
	png::{BitDepth, ColorType, Transformations},
	std::{
		fs::File,
		io::{self, BufReader, Read, Write},
		path::{Path, PathBuf},
	},
	thiserror::Error,
};

pub type Vec2 = [usize; 2];
pub type Rgba = [u8; RGBA_SIZE];

pub const X: usize = 0;
pub const Y: usize = 1;
pub const WIDTH: usize = 0;
pub const HEIGHT: usize = 1;

pub const RGBA_SIZE: usize = 4;
pub const FULLY_TRANSPARENT: Rgba = [0; RGBA_SIZE];
pub const TILE_SIZE: usize = 32;
pub const TILE_DIMENSIONS: Vec2 = [TILE_SIZE; 2];
pub const CANVAS_SIZE: usize = TILE_SIZE * MAP_SIZE;
pub const FRAME_OFFSET: Vec2 = [17, 17];

/// RGBA8, rows top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
	pub width: usize,
	pub height: usize,
	pub data: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ImageError {
	#[error(transparent)]
	Io(#[from] io::Error),
	#[error(transparent)]
	Decoding(#[from] png::DecodingError),
	#[error(transparent)]
	Encoding(#[from] png::EncodingError),
	#[error("PNG decoded to {colorType:?} at {bitDepth:?} bits")]
	UnexpectedOutput { colorType: ColorType, bitDepth: BitDepth },
}

impl Image {
	#[must_use]
	pub fn fromWidthHeight(width: usize, height: usize) -> Self {
		Self { width, height, data: vec![0; width * height * RGBA_SIZE] }
	}

	#[must_use]
	pub fn dimensions(&self) -> Vec2 {
		[self.width, self.height]
	}

	#[inline(always)]
	fn offset(&self, point: Vec2) -> usize {
		(point[Y] * self.width + point[X]) * RGBA_SIZE
	}

	#[must_use]
	pub fn contains(&self, point: Vec2, dimensions: Vec2) -> bool {
		point[X] + dimensions[WIDTH] <= self.width && point[Y] + dimensions[HEIGHT] <= self.height
	}

	#[cfg(test)]
	fn pixel(&self, point: Vec2) -> Option<Rgba> {
		if !self.contains(point, [1, 1]) {
			return None;
		}
		let offset = self.offset(point);
		<Rgba>::try_from(&self.data[offset..offset + RGBA_SIZE]).ok()
	}

	/// Out-of-bounds points are ignored.
	pub fn putPixel(&mut self, point: Vec2, rgba: Rgba) {
		if self.contains(point, [1, 1]) {
			let offset = self.offset(point);
			self.data[offset..offset + RGBA_SIZE].copy_from_slice(&rgba);
		}
	}

	#[cfg(test)]
	fn fill(&mut self, rgba: Rgba) {
		for pixel in self.data.chunks_exact_mut(RGBA_SIZE) {
			pixel.copy_from_slice(&rgba);
		}
	}

	/// Replaces (no blending) the rectangle at `destPoint` with the one at `srcPoint` of `src`,
	/// clipped to both images.
	pub fn blitPixelsRectangle(&mut self, destPoint: Vec2, dimensions: Vec2, src: &Image, srcPoint: Vec2) {
		let clip = |i: usize| {
			dimensions[i]
				.min(self.dimensions()[i].saturating_sub(destPoint[i]))
				.min(src.dimensions()[i].saturating_sub(srcPoint[i]))
		};
		let (width, height) = (clip(WIDTH), clip(HEIGHT));
		if width == 0 || height == 0 {
			return;
		}
		let len = width * RGBA_SIZE;
		for y in 0..height {
			let destOffset = self.offset([destPoint[X], destPoint[Y] + y]);
			let srcOffset = src.offset([srcPoint[X], srcPoint[Y] + y]);
			self.data[destOffset..destOffset + len].copy_from_slice(&src.data[srcOffset..srcOffset + len]);
		}
	}

	/// Any 8- or 16-bit PNG; the result is always RGBA8.
	pub fn fromPng(reader: impl Read) -> Result<Self, ImageError> {
		let mut decoder = png::Decoder::new(reader);
		decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
		let mut png = decoder.read_info()?;
		let mut buffer = vec![0; png.output_buffer_size()];
		let frame = png.next_frame(&mut buffer)?;
		let (srcPixelSize, toRgba): (usize, fn(&[u8]) -> Rgba) = match (frame.color_type, frame.bit_depth) {
			(ColorType::Rgba, BitDepth::Eight) => (4, |src| [src[0], src[1], src[2], src[3]]),
			(ColorType::Rgb, BitDepth::Eight) => (3, |src| [src[0], src[1], src[2], u8::MAX]),
			(ColorType::GrayscaleAlpha, BitDepth::Eight) => (2, |src| [src[0], src[0], src[0], src[1]]),
			(ColorType::Grayscale, BitDepth::Eight) => (1, |src| [src[0], src[0], src[0], u8::MAX]),
			// EXPAND | STRIP_16 never hand out indexed or non-8-bit rows
			(colorType, bitDepth) => return Err(ImageError::UnexpectedOutput { colorType, bitDepth }),
		};
		let mut image = Self::fromWidthHeight(frame.width as _, frame.height as _);
		let rowLen = image.width * RGBA_SIZE;
		if rowLen == 0 {
			return Ok(image);
		}
		for (srcRow, destRow) in iter::zip(buffer.chunks(frame.line_size), image.data.chunks_exact_mut(rowLen)) {
			for (src, dest) in iter::zip(srcRow.chunks_exact(srcPixelSize), destRow.chunks_exact_mut(RGBA_SIZE)) {
				dest.copy_from_slice(&toRgba(src));
			}
		}
		Ok(image)
	}

	pub fn writePng(&self, writer: impl Write) -> Result<(), ImageError> {
		let mut png = png::Encoder::new(writer, self.width as _, self.height as _);
		png.set_color(ColorType::Rgba);
		png.set_depth(BitDepth::Eight);
		let mut writer = png.write_header()?;
		writer.write_image_data(&self.data)?;
		writer.finish()?;
		Ok(())
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Asset {
	TileAtlas,
	BorderFrame,
}

impl fmt::Display for Asset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::TileAtlas => "tile atlas",
			Self::BorderFrame => "border frame",
		})
	}
}

#[derive(Debug, Error)]
pub enum RenderError {
	#[error("could not load the {asset} from {path:?}")]
	AssetLoad {
		asset: Asset,
		path: PathBuf,
		#[source]
		source: ImageError,
	},
}

impl Image {
	pub fn fromPngFile(path: impl AsRef<Path>, asset: Asset) -> Result<Self, RenderError> {
		let path = path.as_ref();
		let load = || -> Result<Self, ImageError> { Self::fromPng(BufReader::new(File::open(path)?)) };
		let image = load().map_err(|source| RenderError::AssetLoad { asset, path: path.to_owned(), source })?;
		debug!("{asset} {path:?}: {}x{}", image.width, image.height);
		Ok(image)
	}
}

pub struct Assets {
	pub tileAtlas: Image,
	pub borderFrame: Image,
}

impl Assets {
	pub fn load(tileAtlasPath: impl AsRef<Path>, borderFramePath: impl AsRef<Path>) -> Result<Self, RenderError> {
		Ok(Self {
			tileAtlas: Image::fromPngFile(tileAtlasPath, Asset::TileAtlas)?,
			borderFrame: Image::fromPngFile(borderFramePath, Asset::BorderFrame)?,
		})
	}
}

/// Tunnels use every other code from 64 on; they sit right after the standard tiles in the atlas.
#[must_use]
pub fn atlasIndex(code: u8) -> usize {
	let code = usize::from(code);
	if code >= TUNNEL_FIRST as usize {
		code / 2 - 6
	} else {
		code
	}
}

/// Output has the frame's dimensions. Tiles without a whole patch in the atlas stay transparent.
#[must_use]
pub fn composite(levelMap: &LevelMap, tileAtlas: &Image, borderFrame: &Image) -> Image {
	let canvas = &mut Image::fromWidthHeight(CANVAS_SIZE, CANVAS_SIZE);
	for (row, codes) in levelMap.iter().enumerate() {
		for (col, &code) in codes.iter().enumerate() {
			let srcPoint = [atlasIndex(code) * TILE_SIZE, 0];
			if tileAtlas.contains(srcPoint, TILE_DIMENSIONS) {
				canvas.blitPixelsRectangle([col * TILE_SIZE, row * TILE_SIZE], TILE_DIMENSIONS, tileAtlas, srcPoint);
			} else {
				trace!("no atlas patch for tile code {code} at [{row}, {col}]");
			}
		}
	}
	let mut image = borderFrame.clone();
	image.blitPixelsRectangle(FRAME_OFFSET, canvas.dimensions(), canvas, [0, 0]);
	// keeps image hosts from recompressing it lossily
	image.putPixel([0, 0], FULLY_TRANSPARENT);
	image
}

#[must_use]
pub fn renderLevel(level: &Level, assets: &Assets) -> Image {
	composite(&level.levelMap, &assets.tileAtlas, &assets.borderFrame)
}
