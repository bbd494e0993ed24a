use crate::core::codec::*;
use crate::core::error::PipelineError;

#[test]
fn test_encode_empty_text_fails() {
    let codec = TextCodec::new(5);
    assert!(matches!(codec.encode(""), Err(PipelineError::EmptyInput)));
}

#[test]
fn test_encode_pads_to_width() {
    let codec = TextCodec::new(5);
    let vector = codec.encode("AI").unwrap();
    assert_eq!(vector.len(), 5);
    assert_eq!(&vector[..2], &[65.0, 73.0]);
    assert!(vector[2..].iter().all(|&v| v == PAD_VALUE));
}

#[test]
fn test_encode_truncates_to_width() {
    let codec = TextCodec::new(3);
    assert_eq!(codec.encode("hello").unwrap(), vec![104.0, 101.0, 108.0]);
}

#[test]
fn test_encode_uses_code_points_not_bytes() {
    let codec = TextCodec::new(4);
    let vector = codec.encode("안녕").unwrap();
    assert_eq!(vector, vec!['안' as u32 as f64, '녕' as u32 as f64, 0.0, 0.0]);
}

#[test]
fn test_decode_rounds_and_truncates() {
    let codec = TextCodec::new(5);
    assert_eq!(codec.decode(&[72.4, 104.6, 33.0, 0.0, 0.0], 2), "Hi");
    assert_eq!(codec.decode(&[72.0, 105.0], 10), "Hi");
}

#[test]
fn test_decode_clamps_out_of_range_values() {
    let codec = TextCodec::new(4);
    let text = codec.decode(&[-50.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN], 4);
    let chars: Vec<char> = text.chars().collect();
    assert_eq!(chars, vec!['\0', char::MAX, '\0', '\0']);
}

#[test]
fn test_decode_replaces_surrogates() {
    let codec = TextCodec::new(1);
    assert_eq!(codec.decode(&[0xD800 as f64], 1), "\u{FFFD}");
}

#[test]
fn test_encode_decode_is_lossy_but_close_for_clean_values() {
    let codec = TextCodec::new(8);
    let text = "quit";
    let vector = codec.encode(text).unwrap();
    assert_eq!(codec.decode(&vector, text.chars().count()), text);
}
