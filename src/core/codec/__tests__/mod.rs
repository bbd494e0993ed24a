pub mod text_codec_test;
