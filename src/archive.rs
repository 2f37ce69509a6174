//! Zip packaging of labelled images for single-action download.

use image::DynamicImage;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::canvas::encode_png;
use crate::error::PixelError;

/// Download name offered for bundles.
pub const ARCHIVE_NAME: &str = "pixelgenius_images.zip";

/// Filesystem-safe PNG name for a label.
///
/// Whitespace runs and reserved characters become `_`; an empty result is `image`.
pub fn entry_name(label: &str) -> String {
    let mut name = String::with_capacity(label.len());
    let mut last_underscore = false;
    for ch in label.trim().chars() {
        let safe = if ch.is_whitespace()
            || matches!(ch, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            || ch.is_control()
        {
            '_'
        } else {
            ch
        };
        if safe == '_' && last_underscore && ch.is_whitespace() {
            continue;
        }
        last_underscore = safe == '_';
        name.push(safe);
    }
    if name.is_empty() || name.chars().all(|c| c == '.') {
        name = "image".to_string();
    }
    format!("{}.png", name)
}

/// Entry names for a list of labels, suffixing duplicates `_2`, `_3`, ...
pub fn entry_names<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .map(|label| {
            let base = entry_name(label);
            let mut name = base.clone();
            let mut n = 2;
            while !seen.insert(name.clone()) {
                let stem = base.trim_end_matches(".png");
                name = format!("{}_{}.png", stem, n);
                n += 1;
            }
            name
        })
        .collect()
}

/// Bundle images as PNG entries in a zip archive, in order.
pub fn package(items: &[(String, DynamicImage)]) -> Result<Vec<u8>, PixelError> {
    let names = entry_names(items.iter().map(|(label, _)| label.as_str()));
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for ((_, img), name) in items.iter().zip(names) {
        let png = encode_png(img)?;
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| PixelError::Archive(format!("Failed to add {}: {}", name, e)))?;
        writer.write_all(&png)?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| PixelError::Archive(format!("Failed to finish archive: {}", e)))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name_replaces_whitespace() {
        assert_eq!(entry_name("Anime Image 1"), "Anime_Image_1.png");
        assert_eq!(entry_name("  a \t b "), "a_b.png");
    }

    #[test]
    fn test_entry_name_strips_path_characters() {
        assert_eq!(entry_name("../etc/passwd"), ".._etc_passwd.png");
        assert_eq!(entry_name("a:b*c"), "a_b_c.png");
        assert_eq!(entry_name(""), "image.png");
        assert_eq!(entry_name(".."), "image.png");
    }

    #[test]
    fn test_duplicate_names_get_suffixes() {
        let names = entry_names(["x", "x", "y", "x"]);
        assert_eq!(names, vec!["x.png", "x_2.png", "y.png", "x_3.png"]);
    }

    #[test]
    fn test_empty_package_is_valid_zip() {
        let bytes = package(&[]).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
