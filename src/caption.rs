use {
	crate::lvl::{Difficulty, Level},
	core::fmt::Write,
	log::debug,
};

/// In chars, not bytes.
pub const MAX_CAPTION_LEN: usize = 280;

/// Name, author, difficulty when set, and the hint when it fits whole.
#[must_use]
pub fn format(level: &Level) -> String {
	let mut caption = String::with_capacity(MAX_CAPTION_LEN);
	_ = write!(caption, "Name: {}\nBy: {}", level.levelName, level.authorName);
	if level.difficulty != Difficulty::Unset {
		_ = write!(caption, "\nDifficulty: {}", level.difficulty);
	}
	if !level.hint.trim().is_empty() {
		let hintLine = ["\n\nHint: \"", level.hint.as_str(), "\""].concat();
		let len = caption.chars().count() + hintLine.chars().count();
		if len <= MAX_CAPTION_LEN {
			caption.push_str(&hintLine);
		} else {
			debug!("hint of {:?} omitted, caption would be {len} chars", level.levelName);
		}
	}
	caption
}
