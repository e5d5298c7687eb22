/// End-to-end tests for the recognition pipeline with injected backends
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use ndarray::Array2;
use plate_core::{
    Alphabet, FnBackend, HeightFit, NormalizedTensor, PlateRecognizer, ProbabilityGrid,
    RecognitionError, RecognizerConfig, SequenceDecoder,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Grid whose arg-max at step t is `indices[t]`
fn one_hot(indices: &[usize], classes: usize) -> ProbabilityGrid {
    let mut values = Array2::<f32>::zeros((indices.len(), classes));
    for (t, &idx) in indices.iter().enumerate() {
        values[[t, idx]] = 1.0;
    }
    ProbabilityGrid::new(values)
}

/// Spell `text` over 32 steps, holding the last character
fn spell(text: &str) -> ProbabilityGrid {
    let alphabet = Alphabet::plates();
    let symbols: Vec<usize> = text
        .chars()
        .map(|ch| alphabet.index_of(ch).unwrap())
        .collect();
    let indices: Vec<usize> = (0..32).map(|t| symbols[t.min(symbols.len() - 1)]).collect();
    one_hot(&indices, alphabet.len())
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

#[test]
fn test_recognize_with_injected_backend() {
    let recognizer = PlateRecognizer::new(
        RecognizerConfig::default(),
        FnBackend::new(|tensor: NormalizedTensor| {
            assert_eq!(tensor.shape(), [1, 128, 64, 1]);
            Ok(spell("B MW 2024"))
        }),
    )
    .unwrap();

    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(520, 110, Rgb([240, 240, 240])));
    assert_eq!(recognizer.recognize(&img).unwrap(), "B MW 2024");
}

#[test]
fn test_backend_sees_padded_plate() {
    // 256x64 white -> 128x32, padded by 16 rows on each side
    let recognizer = PlateRecognizer::new(
        RecognizerConfig::default(),
        FnBackend::new(|tensor: NormalizedTensor| {
            for x in [0, 64, 127] {
                assert_eq!(tensor.get(x, 0), Some(0.0));
                assert_eq!(tensor.get(x, 15), Some(0.0));
                assert_eq!(tensor.get(x, 16), Some(1.0));
                assert_eq!(tensor.get(x, 47), Some(1.0));
                assert_eq!(tensor.get(x, 48), Some(0.0));
            }
            Ok(spell("K"))
        }),
    )
    .unwrap();

    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(256, 64, Luma([255])));
    assert_eq!(recognizer.recognize(&img).unwrap(), "K");
    assert_eq!(HeightFit::for_heights(32, 64), HeightFit::Pad { top: 16, bottom: 16 });
}

#[test]
fn test_exact_size_input_is_transposed() {
    let img = GrayImage::from_fn(128, 64, |x, y| Luma([((x * 2 + y) % 256) as u8]));
    let tensor = plate_core::normalize(&DynamicImage::ImageLuma8(img), 128, 64).unwrap();

    assert_eq!(tensor.as_slice().len(), 128 * 64);
    for (x, y) in [(0, 0), (1, 0), (0, 1), (100, 37), (127, 63)] {
        let expected = ((x * 2 + y) % 256) as f32 / 255.0;
        assert_eq!(tensor.as_slice()[x * 64 + y], expected);
    }
}

#[test]
fn test_recognize_encoded_images() {
    let recognizer = PlateRecognizer::new(
        RecognizerConfig::default(),
        FnBackend::new(|_tensor: NormalizedTensor| Ok(spell("HH-ÖÄ 99"))),
    )
    .unwrap();
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 70, Rgb([20, 30, 40])));

    for format in [ImageFormat::Png, ImageFormat::Jpeg] {
        let decoded = recognizer.recognize_bytes(&encode(&img, format)).unwrap();
        // adjacent repeats collapse: "HH" and "99" each read once
        assert_eq!(decoded.text, "H-ÖÄ 9");
        assert_eq!(decoded.confidence, 1.0);
    }
}

#[test]
fn test_invalid_image_skips_backend() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let recognizer = PlateRecognizer::new(
        RecognizerConfig::default(),
        FnBackend::new(move |_tensor: NormalizedTensor| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(spell("A"))
        }),
    )
    .unwrap();

    let err = recognizer.recognize_bytes(b"definitely not an image").unwrap_err();
    assert!(matches!(err, RecognitionError::InvalidImage(_)));

    let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 40));
    let err = recognizer.recognize(&empty).unwrap_err();
    assert!(matches!(err, RecognitionError::InvalidImage(_)));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_backend_shape_is_checked() {
    let recognizer = PlateRecognizer::new(
        RecognizerConfig::default(),
        FnBackend::new(|_tensor: NormalizedTensor| Ok(one_hot(&[0; 32], 41))),
    )
    .unwrap();

    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(128, 64, Rgb([0, 0, 0])));
    let err = recognizer.recognize(&img).unwrap_err();
    assert!(matches!(err, RecognitionError::ShapeMismatch { .. }));
}

#[test]
fn test_backend_failure_is_inference_error() {
    let recognizer = PlateRecognizer::new(
        RecognizerConfig::default(),
        FnBackend::new(|_tensor: NormalizedTensor| Err(anyhow::anyhow!("model unavailable"))),
    )
    .unwrap();

    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(128, 64, Rgb([0, 0, 0])));
    match recognizer.recognize(&img).unwrap_err() {
        RecognitionError::Inference(e) => assert_eq!(e.to_string(), "model unavailable"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_small_alphabet_decoding() {
    let alphabet = Alphabet::from("AB ");
    let decoder = SequenceDecoder::new(alphabet.clone());

    assert_eq!(decoder.decode(&one_hot(&[0, 0, 1, 2], 3)).unwrap(), "AB ");
    assert_eq!(decoder.decode(&one_hot(&[1, 1, 1, 1], 3)).unwrap(), "B");
    assert_eq!(plate_core::decode(&one_hot(&[2, 0, 2], 3), &alphabet).unwrap(), " A ");

    // ties go to the lower index
    let tied = ProbabilityGrid::new(Array2::from_elem((2, 3), 0.5));
    assert_eq!(decoder.decode(&tied).unwrap(), "A");

    // second dimension must match the alphabet
    assert!(matches!(
        decoder.decode(&one_hot(&[0, 1], 4)),
        Err(RecognitionError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_batched_model_output() {
    let data: Vec<f32> = (0..32 * 42)
        .map(|i| if i % 42 == 5 { 0.8 } else { 0.01 })
        .collect();
    let grid = ProbabilityGrid::from_shape_vec(&[1, 32, 42], data).unwrap();

    let decoder = SequenceDecoder::new(Alphabet::plates());
    assert_eq!(decoder.decode(&grid).unwrap(), "F");
}
