pub mod pcm;
pub mod ring_buffer;
pub mod sample_buffer;
pub mod wav_format;
pub mod wave_file;
