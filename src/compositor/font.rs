//! Font resolution and measurement.
//!
//! A [`FontSpec`] names a face (built-in, a file, or a face name looked up in
//! font directories). Resolving it yields a [`Face`] that measures and
//! rasterizes text at a pixel size. TrueType/OpenType faces render through
//! ab_glyph; the built-in face is the Spleen bitmap family.
//!
//! Resolution is an explicit `Result`: [`FontSpec::resolve`] reports the
//! failure, [`FontSpec::resolve_or_builtin`] hands back the built-in face
//! together with that failure so the caller decides how to surface it.

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use thiserror::Error;
use tracing::debug;

use super::builtin::BuiltinFace;
use super::raster::CoverageMask;

/// File extensions considered when searching font directories.
const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// Maximum directory depth walked below each search directory.
const MAX_SEARCH_DEPTH: usize = 4;

/// Font files larger than this are refused without reading them.
pub const MAX_FONT_FILE_BYTES: u64 = 64 * 1024 * 1024;

/// Named-face lookups, keyed by lowercased name and search directories.
static NAMED_FONT_CACHE: OnceLock<Mutex<HashMap<(String, Vec<PathBuf>), Option<PathBuf>>>> =
    OnceLock::new();

/// Font resolution failure.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("font not found: {0}")]
    NotFound(String),

    #[error("failed to read font {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

/// Where a face comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FontSource {
    /// The Spleen bitmap face compiled into the binary.
    #[default]
    Builtin,
    /// A font file at an explicit path.
    File(PathBuf),
    /// A face name such as `arial` or `DejaVuSans.ttf`, searched by file stem.
    Named(String),
}

impl FontSource {
    /// Interpret user input: `builtin`/`default`/empty, a path, or a face name.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty()
            || value.eq_ignore_ascii_case("builtin")
            || value.eq_ignore_ascii_case("default")
        {
            FontSource::Builtin
        } else if value.contains('/') || value.contains('\\') {
            FontSource::File(PathBuf::from(value))
        } else {
            FontSource::Named(value.to_string())
        }
    }

    fn describe(&self) -> String {
        match self {
            FontSource::Builtin => "builtin".to_string(),
            FontSource::File(path) => path.display().to_string(),
            FontSource::Named(name) => name.clone(),
        }
    }
}

/// Typeface selection: a primary source plus ordered fallbacks.
#[derive(Debug, Clone, Default)]
pub struct FontSpec {
    pub source: FontSource,
    pub fallbacks: Vec<FontSource>,
    /// Directories searched for [`FontSource::Named`] faces.
    pub search_dirs: Vec<PathBuf>,
}

impl FontSpec {
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            source: FontSource::Named(name.into()),
            ..Default::default()
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: FontSource::File(path.into()),
            ..Default::default()
        }
    }

    pub fn with_fallback(mut self, source: FontSource) -> Self {
        self.fallbacks.push(source);
        self
    }

    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    /// Resolve the primary source, then each fallback in order.
    ///
    /// Returns the first error when nothing resolves.
    pub fn resolve(&self, pixel_size: u32) -> Result<Face, FontError> {
        let mut first_error = None;
        for source in std::iter::once(&self.source).chain(&self.fallbacks) {
            match self.resolve_source(source, pixel_size) {
                Ok(face) => return Ok(face),
                Err(e) => {
                    debug!(source = %source.describe(), error = %e, "font source failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error.unwrap_or_else(|| FontError::NotFound(self.source.describe())))
    }

    /// Resolve, falling back to the built-in face when every source fails.
    pub fn resolve_or_builtin(&self, pixel_size: u32) -> (Face, Option<FontError>) {
        match self.resolve(pixel_size) {
            Ok(face) => (face, None),
            Err(e) => (Face::Builtin(BuiltinFace::new(pixel_size)), Some(e)),
        }
    }

    fn resolve_source(&self, source: &FontSource, pixel_size: u32) -> Result<Face, FontError> {
        match source {
            FontSource::Builtin => Ok(Face::Builtin(BuiltinFace::new(pixel_size))),
            FontSource::File(path) => OutlineFace::load(path, pixel_size).map(Face::Outline),
            FontSource::Named(name) => {
                let path = cached_named_font(name, &self.search_dirs)
                    .ok_or_else(|| FontError::NotFound(name.clone()))?;
                OutlineFace::load(&path, pixel_size).map(Face::Outline)
            }
        }
    }
}

/// A resolved face at a fixed pixel size.
#[derive(Clone)]
pub enum Face {
    Outline(OutlineFace),
    Builtin(BuiltinFace),
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Face::Outline(face) => f.debug_tuple("Outline").field(&face.path).finish(),
            Face::Builtin(face) => f.debug_tuple("Builtin").field(face).finish(),
        }
    }
}

impl Face {
    pub fn is_builtin(&self) -> bool {
        matches!(self, Face::Builtin(_))
    }

    /// Distance from the top of a line to the baseline.
    pub fn ascent(&self) -> f32 {
        match self {
            Face::Outline(face) => face.font.as_scaled(face.scale).ascent(),
            Face::Builtin(face) => face.cell_height() as f32,
        }
    }

    /// Distance below the baseline (zero or negative).
    pub fn descent(&self) -> f32 {
        match self {
            Face::Outline(face) => face.font.as_scaled(face.scale).descent(),
            Face::Builtin(_) => 0.0,
        }
    }

    /// Glyph box height: ascent minus descent.
    pub fn height(&self) -> f32 {
        (self.ascent() - self.descent()).ceil()
    }

    /// Rendered width of `text` in pixels.
    pub fn measure(&self, text: &str) -> f32 {
        match self {
            Face::Outline(face) => face.measure(text),
            Face::Builtin(face) => face.measure(text),
        }
    }

    /// Rasterize `text` into a mask whose top edge is the line top.
    pub fn rasterize(&self, text: &str) -> CoverageMask {
        match self {
            Face::Outline(face) => face.rasterize(text),
            Face::Builtin(face) => face.rasterize(text),
        }
    }
}

/// A TrueType/OpenType face loaded through ab_glyph.
#[derive(Clone)]
pub struct OutlineFace {
    font: FontArc,
    scale: PxScale,
    path: PathBuf,
}

impl OutlineFace {
    /// Load a face from a regular file no larger than [`MAX_FONT_FILE_BYTES`].
    pub fn load(path: &Path, pixel_size: u32) -> Result<Self, FontError> {
        let read_error = |source: io::Error| FontError::Read {
            path: path.to_path_buf(),
            source,
        };
        let too_large = || io::Error::other(format!("larger than {} bytes", MAX_FONT_FILE_BYTES));

        // Only regular files; devices and pipes have no usable length
        let metadata = fs::metadata(path).map_err(read_error)?;
        if !metadata.is_file() {
            return Err(read_error(io::Error::other("not a regular file")));
        }
        if metadata.len() > MAX_FONT_FILE_BYTES {
            return Err(read_error(too_large()));
        }

        let mut data = Vec::with_capacity(metadata.len() as usize);
        fs::File::open(path)
            .and_then(|file| file.take(MAX_FONT_FILE_BYTES + 1).read_to_end(&mut data))
            .map_err(read_error)?;
        if data.len() as u64 > MAX_FONT_FILE_BYTES {
            return Err(read_error(too_large()));
        }

        let font = FontArc::try_from_vec(data).map_err(|e| FontError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            font,
            scale: PxScale::from(pixel_size as f32),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Caret positions for each glyph, kerning applied. Returns the total advance.
    fn layout(&self, text: &str) -> (Vec<(GlyphId, f32)>, f32) {
        let scaled = self.font.as_scaled(self.scale);
        let mut glyphs = Vec::new();
        let mut caret_x = 0.0f32;
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars() {
            let glyph_id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret_x += scaled.kern(prev, glyph_id);
            }
            glyphs.push((glyph_id, caret_x));
            caret_x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }

        (glyphs, caret_x)
    }

    fn measure(&self, text: &str) -> f32 {
        self.layout(text).1
    }

    fn rasterize(&self, text: &str) -> CoverageMask {
        let scaled = self.font.as_scaled(self.scale);
        let (glyphs, advance) = self.layout(text);

        let ascent = scaled.ascent();
        let outlined: Vec<_> = glyphs
            .into_iter()
            .filter_map(|(glyph_id, glyph_x)| {
                let glyph = glyph_id.with_scale_and_position(self.scale, point(glyph_x, ascent));
                self.font.outline_glyph(glyph)
            })
            .collect();

        // Grow the line box to cover ink past the advance or below the descent
        let (mut left, mut top) = (0i32, 0i32);
        let mut right = advance.ceil() as i32;
        let mut bottom = (ascent - scaled.descent()).ceil() as i32;
        for glyph in &outlined {
            let bounds = glyph.px_bounds();
            left = left.min(bounds.min.x.floor() as i32);
            top = top.min(bounds.min.y.floor() as i32);
            right = right.max(bounds.max.x.ceil() as i32);
            bottom = bottom.max(bounds.max.y.ceil() as i32);
        }

        let width = (right - left) as usize;
        let mut mask = CoverageMask::with_origin(width, (bottom - top) as usize, left, top);
        for glyph in outlined {
            let bounds = glyph.px_bounds();
            let ox = bounds.min.x as i32 - left;
            let oy = bounds.min.y as i32 - top;
            glyph.draw(|px, py, coverage| mask.add(px as i32 + ox, py as i32 + oy, coverage));
        }

        mask
    }
}

/// Platform font directories searched for named faces.
pub fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from(r"C:\Windows\Fonts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join("Library/Fonts"));
    }
    dirs
}

/// Find a font file whose stem matches `name` case-insensitively.
///
/// `name` may carry a font extension (`arial.ttf`), which is ignored for the match.
pub fn find_named_font(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let wanted = match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some(ext) if is_font_extension(ext) => Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name),
        _ => name,
    };

    dirs.iter().find_map(|dir| search_dir(dir, wanted, 0))
}

/// [`find_named_font`] memoized for the life of the process.
fn cached_named_font(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let cache = NAMED_FONT_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let key = (name.to_lowercase(), dirs.to_vec());
    if let Some(found) = cache.lock().ok().and_then(|c| c.get(&key).cloned()) {
        return found;
    }
    let found = find_named_font(name, dirs);
    if let Ok(mut c) = cache.lock() {
        c.insert(key, found.clone());
    }
    found
}

fn search_dir(dir: &Path, wanted: &str, depth: usize) -> Option<PathBuf> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }
    let entries = fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
            continue;
        }
        let stem_matches = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.eq_ignore_ascii_case(wanted));
        let ext_matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(is_font_extension);
        if stem_matches && ext_matches {
            return Some(path);
        }
    }

    subdirs.sort();
    subdirs
        .iter()
        .find_map(|sub| search_dir(sub, wanted, depth + 1))
}

fn is_font_extension(ext: &str) -> bool {
    FONT_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}
