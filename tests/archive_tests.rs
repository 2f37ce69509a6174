//! Zip packaging tests.

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use pixelgenius::archive;
use pretty_assertions::assert_eq;
use std::io::{Cursor, Read};
use zip::ZipArchive;

fn gradient(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
    }))
}

fn read_entry(zip: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> DynamicImage {
    let mut file = zip.by_name(name).unwrap();
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).unwrap();
    image::load_from_memory(&bytes).unwrap()
}

#[test]
fn test_two_images_round_trip() {
    let first = gradient(32, 24);
    let second = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([1, 2, 3, 200])));
    let items = vec![
        ("Realistic Image 1".to_string(), first.clone()),
        ("Anime Image 1".to_string(), second.clone()),
    ];

    let bytes = archive::package(&items).unwrap();
    let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();

    let names: Vec<String> = zip.file_names().map(str::to_string).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(sorted, vec!["Anime_Image_1.png", "Realistic_Image_1.png"]);

    assert_eq!(read_entry(&mut zip, "Realistic_Image_1.png").to_rgb8(), first.to_rgb8());
    assert_eq!(read_entry(&mut zip, "Anime_Image_1.png").to_rgba8(), second.to_rgba8());
}

#[test]
fn test_entries_keep_batch_order() {
    let labels = ["Sketch Image 1", "Sketch Image 2", "Cyberpunk Image 1"];
    let items: Vec<(String, DynamicImage)> = labels
        .iter()
        .map(|label| (label.to_string(), gradient(4, 4)))
        .collect();

    let bytes = archive::package(&items).unwrap();
    let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let ordered: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(
        ordered,
        vec!["Sketch_Image_1.png", "Sketch_Image_2.png", "Cyberpunk_Image_1.png"]
    );
}

#[test]
fn test_duplicate_labels_do_not_collide() {
    let items = vec![
        ("same".to_string(), gradient(4, 4)),
        ("same".to_string(), gradient(8, 8)),
    ];
    let bytes = archive::package(&items).unwrap();
    let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(zip.len(), 2);
    assert_eq!(read_entry(&mut zip, "same_2.png").to_rgb8(), gradient(8, 8).to_rgb8());
}

#[test]
fn test_empty_batch_is_valid_archive() {
    let bytes = archive::package(&[]).unwrap();
    let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(zip.len(), 0);
}
