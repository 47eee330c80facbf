//! Integration tests: full decode → canvas → composite → encode round
//! trips through real files in a scratch directory.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use tessel_canvas::{Canvas, Geometry, Offset};
use tessel_codec::{CodecError, CodecRegistry, RawCodec, read_canvas, write_canvas};

/// Deterministic RGB test pattern.
fn patterned_rgb_canvas(width: u32, height: u32) -> Canvas {
    let mut canvas = Canvas::new_rgb(width, height);
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for j in 0..height {
        for i in 0..width {
            let r = (i * 37) % 256;
            let g = (j * 53) % 256;
            let b = (i * j + 11) % 256;
            pixels.push((r << 16) | (g << 8) | b);
        }
    }
    canvas.set_pixels(&pixels).unwrap();
    canvas
}

#[test]
fn png_rgb_round_trip_preserves_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pattern.png");

    let registry = CodecRegistry::with_defaults();
    let codec = registry.get("png").expect("png codec registered");

    let original = patterned_rgb_canvas(8, 6);
    write_canvas(codec, &original, &path).unwrap();

    let restored = read_canvas(codec, &path).unwrap();
    assert_eq!(restored.width(), 8);
    assert_eq!(restored.height(), 6);
    assert_eq!(restored.geometry().samples_per_pixel, 3);
    assert_eq!(restored.to_packed(), original.to_packed());
}

#[test]
fn png_grayscale_round_trip_preserves_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray.png");

    let registry = CodecRegistry::with_defaults();
    let codec = registry.get("png").unwrap();

    let packed: Vec<u8> = (0u32..7 * 5).map(|v| (v * 11 % 256) as u8).collect();
    let original = Canvas::from_packed(Geometry::grayscale(7, 5), &packed).unwrap();
    write_canvas(codec, &original, &path).unwrap();

    let restored = read_canvas(codec, &path).unwrap();
    assert_eq!(restored.geometry().samples_per_pixel, 1);
    assert_eq!(restored.to_packed(), packed);
}

#[test]
fn bmp_round_trip_preserves_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pattern.bmp");

    let registry = CodecRegistry::with_defaults();
    let codec = registry.get("bmp").unwrap();

    let original = patterned_rgb_canvas(5, 4);
    write_canvas(codec, &original, &path).unwrap();
    let restored = read_canvas(codec, &path).unwrap();
    assert_eq!(restored.to_packed(), original.to_packed());
}

#[test]
fn raw_codec_round_trips_packed_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.rgb");

    let geometry = Geometry::rgb(4, 3);
    let codec = RawCodec::new(geometry.clone());

    let packed: Vec<u8> = (0..36).collect();
    let original = Canvas::from_packed(geometry, &packed).unwrap();
    write_canvas(&codec, &original, &path).unwrap();

    let restored = read_canvas(&codec, &path).unwrap();
    assert_eq!(restored.width(), 4);
    assert_eq!(restored.height(), 3);
    assert_eq!(restored.to_packed(), packed);
}

#[test]
fn raw_codec_rejects_a_length_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.rgb");
    std::fs::write(&path, [0u8; 10]).unwrap();

    let codec = RawCodec::new(Geometry::rgb(4, 3));
    let result = read_canvas(&codec, &path);
    assert!(matches!(result, Err(CodecError::Decode { .. })));
}

#[test]
fn garbage_bytes_fail_to_decode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.png");
    std::fs::write(&path, [0xFFu8, 0x00, 0xAB, 0xCD]).unwrap();

    let registry = CodecRegistry::with_defaults();
    let codec = registry.get("png").unwrap();
    let result = read_canvas(codec, &path);
    assert!(matches!(result, Err(CodecError::Decode { .. })));
}

#[test]
fn decode_composite_crop_encode_flow() {
    let dir = tempfile::tempdir().unwrap();
    let frame_path = dir.path().join("frame.png");
    let mosaic_path = dir.path().join("mosaic.png");

    let registry = CodecRegistry::with_defaults();
    let codec = registry.get("png").unwrap();

    // A frame with a uniform border and textured content inside.
    let mut frame = Canvas::new_rgb(20, 20);
    let pixels: Vec<u32> = (0..400u32)
        .map(|k| {
            let (i, j) = (k % 20, k / 20);
            if (5..15).contains(&i) && (5..15).contains(&j) {
                (i * 12) << 16 | (j * 12) << 8 | 0x40
            } else {
                0x00C8_C8C8
            }
        })
        .collect();
    frame.set_pixels(&pixels).unwrap();
    write_canvas(codec, &frame, &frame_path).unwrap();

    // Decode, crop the background frame, composite into a mosaic.
    let mut decoded = read_canvas(codec, &frame_path).unwrap();
    assert!(tessel_canvas::crop_background(&mut decoded).unwrap());
    assert_eq!(decoded.width(), 10);
    assert_eq!(decoded.height(), 10);

    let mut mosaic = Canvas::new_rgb(16, 16);
    let mut session = tessel_canvas::InsertSession::new();
    let used =
        tessel_canvas::insert(&mut mosaic, &decoded, Offset::new(-3, -3), 0, &mut session)
            .unwrap();
    assert!(used.dx >= 0 && used.dy >= 0);

    // Encode the grown mosaic and read it back intact.
    write_canvas(codec, &mosaic, &mosaic_path).unwrap();
    let restored = read_canvas(codec, &mosaic_path).unwrap();
    assert_eq!(restored.width(), mosaic.width());
    assert_eq!(restored.height(), mosaic.height());
    assert_eq!(restored.to_packed(), mosaic.to_packed());
}
