//! End-to-end tests for the render pipeline
//!
//! These tests drive `Mfen::render` against a temporary cache directory and
//! inspect the returned images and the files left on disk.

use std::cell::Cell;
use std::fs;
use std::path::Path;

use image::{Rgba, RgbaImage};
use mfen::sprites::SpriteError;
use mfen::{
    BuiltinSprites, ImageSource, Mfen, MfenConfig, MimeKind, Piece, RenderMode, RenderState,
    SpriteSource,
};
use tempfile::TempDir;

const LIGHT: [u8; 3] = [0xDF, 0xE3, 0xE8];
const DARK: [u8; 3] = [0x9D, 0xA8, 0xBD];

/// Built-in sprites that count how often they are asked for a bitmap
#[derive(Default)]
struct CountingSprites {
    calls: Cell<usize>,
}

impl SpriteSource for CountingSprites {
    fn sprite(&self, piece: Piece) -> Result<RgbaImage, SpriteError> {
        self.calls.set(self.calls.get() + 1);
        BuiltinSprites.sprite(piece)
    }
}

fn config_in(temp: &TempDir) -> MfenConfig {
    let mut config = MfenConfig::default();
    config.cache.dir = temp.path().join("cache");
    config
}

fn cache_files(dir: &Path) -> Vec<String> {
    match fs::read_dir(dir) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .map(|e| e.expect("should read entry").file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
        Err(_) => Vec::new(),
    }
}

fn assert_close(pixel: &Rgba<u8>, expected: [u8; 3]) {
    for channel in 0..3 {
        let diff = (pixel[channel] as i16 - expected[channel] as i16).abs();
        assert!(diff <= 2, "pixel {:?} is not close to {:?}", pixel, expected);
    }
}

#[test]
fn test_starting_position_tiny() {
    let temp = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp);
    config.board.size = "tiny".to_string();

    let result = Mfen::builtin().render(&config, RenderMode::Image);
    assert!(!result.has_errored(), "{:?}", result.last_error());

    let image = result.image().expect("should hold an image");
    assert_eq!(image.dimensions(), (128, 128));

    // Rank 6 (third from the top) is empty; its first square is light
    assert_close(image.get_pixel(8, 40), LIGHT);
    assert_close(image.get_pixel(24, 40), DARK);

    // a8 holds a black rook, so its center is not the square color
    let center = image.get_pixel(8, 8);
    assert!(center[0] < 128, "expected a dark piece, got {:?}", center);

    let files = cache_files(&config.cache.dir);
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with(".png"));
    assert_eq!(files[0].len(), 64 + 4);
}

#[test]
fn test_empty_board_needs_no_sprites() {
    let temp = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp);
    config.board.position = "8/8/8/8/8/8/8/8".to_string();
    config.board.size = "small".to_string();

    let sprites = CountingSprites::default();
    let result = Mfen::new(&sprites).render(&config, RenderMode::Image);
    assert!(!result.has_errored());
    assert_eq!(sprites.calls.get(), 0);

    let image = result.image().unwrap();
    assert_eq!(image.dimensions(), (256, 256));
    assert_close(image.get_pixel(16, 16), LIGHT);
    assert_close(image.get_pixel(48, 16), DARK);
    assert_close(image.get_pixel(16, 48), DARK);
    assert_close(image.get_pixel(240, 240), LIGHT);
}

#[test]
fn test_bare_separators_render_empty_board() {
    let temp = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp);
    config.board.position = "////////".to_string();

    let empty = {
        let mut config = config.clone();
        config.board.position = "8/8/8/8/8/8/8/8".to_string();
        config.cache.enabled = false;
        Mfen::builtin().render(&config, RenderMode::Image)
    };
    let result = Mfen::builtin().render(&config, RenderMode::Image);
    assert!(!result.has_errored());
    assert_eq!(result.image(), empty.image());
}

#[test]
fn test_invalid_characters_produce_uncached_error_image() {
    let temp = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp);
    config.board.position = "xxxxxxxx/8/8/8/8/8/8/8".to_string();

    let result = Mfen::builtin().render(&config, RenderMode::Image);
    assert!(result.has_errored());
    let (code, message) = result.last_error().unwrap();
    assert_eq!(code, 2);
    assert!(message.contains('x'));

    let image = result.image().expect("should hold the error image");
    assert!(image.height() < 100);
    assert!(result.location().is_none());
    assert!(cache_files(&config.cache.dir).is_empty());
}

#[test]
fn test_size_resolution() {
    let temp = TempDir::new().expect("should create temp dir");
    let mfen = Mfen::builtin();
    let cases = [
        ("", 384),
        ("0", 384),
        ("-5", 384),
        ("medium", 384),
        ("HUGE", 1024),
        ("100", 100),
        ("2000", 1024),
    ];

    for (size, edge) in cases {
        let mut config = config_in(&temp);
        config.board.size = size.to_string();
        config.cache.enabled = false;
        let result = mfen.render(&config, RenderMode::Image);
        assert_eq!(result.image().map(|i| i.dimensions()), Some((edge, edge)), "size {:?}", size);
    }

    let mut config = config_in(&temp);
    config.board.size = "bogus".to_string();
    let result = mfen.render(&config, RenderMode::Image);
    assert_eq!(result.last_error().map(|(code, _)| code), Some(1));
}

#[test]
fn test_second_render_is_served_from_cache() {
    let temp = TempDir::new().expect("should create temp dir");
    let config = config_in(&temp);
    let sprites = CountingSprites::default();
    let mfen = Mfen::new(&sprites);

    let first = mfen.render(&config, RenderMode::Image);
    let composed_calls = sprites.calls.get();
    assert!(composed_calls > 0);
    assert_eq!(first.rendered().unwrap().source, ImageSource::Composed);

    let second = mfen.render(&config, RenderMode::Image);
    assert_eq!(sprites.calls.get(), composed_calls, "cache hit must not compose");
    let rendered = second.rendered().unwrap();
    assert_eq!(rendered.source, ImageSource::Cache);
    assert_eq!(rendered.bytes, first.rendered().unwrap().bytes);
    assert_eq!(second.location(), first.location());
}

#[test]
fn test_equivalent_requests_share_an_entry() {
    let temp = TempDir::new().expect("should create temp dir");
    let mfen = Mfen::builtin();

    let mut a = config_in(&temp);
    a.board.size = "huge".to_string();
    a.board.light = "#FFF".to_string();
    a.board.position = "8/8/8/8/8/8/8/8 w - - 0 1".to_string();

    let mut b = config_in(&temp);
    b.board.size = "1024".to_string();
    b.board.light = "ffffff".to_string();
    b.board.position = "8/8/8/8/8/8/8/8".to_string();

    let first = mfen.render(&a, RenderMode::Image);
    let second = mfen.render(&b, RenderMode::Image);
    assert_eq!(second.rendered().unwrap().source, ImageSource::Cache);
    assert_eq!(first.location(), second.location());
    assert_eq!(cache_files(&a.cache.dir).len(), 1);
}

#[test]
fn test_different_parameters_use_different_entries() {
    let temp = TempDir::new().expect("should create temp dir");
    let mfen = Mfen::builtin();
    let base = config_in(&temp);

    let mut swapped = base.clone();
    swapped.board.light = base.board.dark.clone();
    swapped.board.dark = base.board.light.clone();

    let mut jpeg = base.clone();
    jpeg.output.mime = "jpeg".to_string();
    jpeg.output.quality = 80;

    for config in [&base, &swapped, &jpeg] {
        assert!(!mfen.render(config, RenderMode::Image).has_errored());
    }
    let files = cache_files(&base.cache.dir);
    assert_eq!(files.len(), 3);
    assert_eq!(files.iter().filter(|f| f.ends_with(".jpg")).count(), 1);
}

#[test]
fn test_purge_recomposes_and_overwrites() {
    let temp = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp);
    let sprites = CountingSprites::default();
    let mfen = Mfen::new(&sprites);

    let first = mfen.render(&config, RenderMode::Image);
    let path = first.location().unwrap().path.clone();
    fs::write(&path, b"stale").unwrap();

    config.cache.purge = true;
    let calls = sprites.calls.get();
    let purged = mfen.render(&config, RenderMode::Image);
    assert!(sprites.calls.get() > calls);
    assert_eq!(purged.rendered().unwrap().source, ImageSource::Composed);
    assert_eq!(fs::read(&path).unwrap(), purged.rendered().unwrap().bytes);
}

#[test]
fn test_caching_disabled_leaves_no_files() {
    let temp = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp);
    config.cache.enabled = false;

    let result = Mfen::builtin().render(&config, RenderMode::Image);
    assert!(!result.has_errored());
    assert!(result.location().is_none());
    assert!(!config.cache.dir.exists());
}

#[test]
fn test_location_only_fast_path() {
    let temp = TempDir::new().expect("should create temp dir");
    let config = config_in(&temp);
    let sprites = CountingSprites::default();
    let mfen = Mfen::new(&sprites);

    let first = mfen.render(&config, RenderMode::LocationOnly);
    assert!(first.image().is_some());
    let calls = sprites.calls.get();

    let second = mfen.render(&config, RenderMode::LocationOnly);
    assert_eq!(sprites.calls.get(), calls);
    match second.state() {
        RenderState::Located(location) => {
            assert_eq!(Some(location), first.location());
            assert!(location.public.starts_with("/cache/"));
        }
        other => panic!("expected a located result, got {:?}", other),
    }
}

#[test]
fn test_corrupt_cache_entry_self_heals() {
    let temp = TempDir::new().expect("should create temp dir");
    let config = config_in(&temp);
    let mfen = Mfen::builtin();

    let first = mfen.render(&config, RenderMode::Image);
    let path = first.location().unwrap().path.clone();
    let good = fs::read(&path).unwrap();
    fs::write(&path, &good[..good.len() / 2]).unwrap();

    let healed = mfen.render(&config, RenderMode::Image);
    assert!(!healed.has_errored());
    assert_eq!(healed.rendered().unwrap().source, ImageSource::Composed);
    assert_eq!(fs::read(&path).unwrap(), good);
}

#[test]
fn test_unavailable_cache_directory() {
    let temp = TempDir::new().expect("should create temp dir");
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, b"a file, not a directory").unwrap();

    let mut config = config_in(&temp);
    config.cache.dir = blocker.join("cache");

    let result = Mfen::builtin().render(&config, RenderMode::Image);
    assert_eq!(result.last_error().map(|(code, _)| code), Some(5));
    assert!(result.image().is_some());
}

#[test]
fn test_jpeg_output() {
    let temp = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp);
    config.output.mime = "image/jpeg".to_string();
    config.output.quality = 85;
    config.board.size = "tiny".to_string();

    let result = Mfen::builtin().render(&config, RenderMode::Image);
    assert_eq!(result.encoding().mime, MimeKind::Jpeg);
    let bytes = &result.rendered().unwrap().bytes;
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    assert!(result.location().unwrap().path.extension().is_some_and(|e| e == "jpg"));
}

#[test]
fn test_output_to_file_and_destroy() {
    let temp = TempDir::new().expect("should create temp dir");
    let config = config_in(&temp);
    let out = temp.path().join("out").join("board.png");

    let mut result = Mfen::builtin().render(&config, RenderMode::Image);
    result.output(Some(&out)).expect("should write output");
    let written = image::open(&out).expect("should decode output").to_rgba8();
    assert_eq!(written.dimensions(), (384, 384));

    result.destroy();
    result.destroy();
    assert!(result.image().is_none());
    assert!(!result.has_errored());

    // Output after destroy does nothing
    fs::remove_file(&out).unwrap();
    result.output(Some(&out)).unwrap();
    assert!(!out.exists());
}

#[test]
fn test_error_image_output_uses_requested_format() {
    let temp = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp);
    config.board.position = "8/8/8/8/8/8/8/7!".to_string();
    config.output.mime = "jpeg".to_string();
    config.output.quality = 90;

    let result = Mfen::builtin().render(&config, RenderMode::Image);
    let mut buffer = Vec::new();
    result.write_to(&mut buffer).unwrap();
    assert_eq!(&buffer[..2], &[0xFF, 0xD8]);
}

#[test]
fn test_directory_sprites() {
    let temp = TempDir::new().expect("should create temp dir");
    let sprite_dir = temp.path().join("pieces");
    fs::create_dir_all(&sprite_dir).unwrap();
    let red = RgbaImage::from_pixel(128, 128, Rgba([255, 0, 0, 255]));
    red.save(sprite_dir.join("wk.png")).unwrap();

    let mut config = config_in(&temp);
    config.board.position = "K7/8/8/8/8/8/8/8".to_string();
    config.board.size = "huge".to_string();
    config.sprites.dir = Some(sprite_dir);

    let result = Mfen::from_config(&config).render(&config, RenderMode::Image);
    assert!(!result.has_errored(), "{:?}", result.last_error());
    let image = result.image().unwrap();
    assert_eq!(image.get_pixel(64, 64), &Rgba([255, 0, 0, 255]));
    assert_close(image.get_pixel(192, 64), DARK);
}

#[test]
fn test_long_invalid_position_still_yields_an_image() {
    let temp = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp);
    config.board.position = format!("x{}", "8".repeat(4200));
    config.output.mime = "jpeg".to_string();

    let result = Mfen::builtin().render(&config, RenderMode::Image);
    assert_eq!(result.last_error().map(|(code, _)| code), Some(2));
    let (_, message) = result.last_error().unwrap();
    assert!(message.len() < 200, "message should not echo the whole input: {}", message.len());

    let image = result.image().expect("should hold the error image");
    assert!(image.width() <= 1024);

    let mut buffer = Vec::new();
    result.write_to(&mut buffer).expect("error image should encode as JPEG");
    let decoded = image::load_from_memory_with_format(&buffer, image::ImageFormat::Jpeg)
        .expect("should decode the error image");
    assert_eq!((decoded.width(), decoded.height()), image.dimensions());
}

#[test]
fn test_concurrent_purged_renders_of_one_board() {
    let temp = TempDir::new().expect("should create temp dir");
    let mut config = config_in(&temp);
    config.board.size = "tiny".to_string();
    config.cache.purge = true;
    let mfen = Mfen::builtin();

    for _ in 0..5 {
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| mfen.render(&config, RenderMode::Image).last_error()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().expect("render should not panic"), None);
            }
        });
    }

    let entries: Vec<_> = fs::read_dir(&config.cache.dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
}
