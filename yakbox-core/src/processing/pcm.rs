//! Sample format helpers for device backends that deliver float or
//! multi-channel audio.

/// Convert an f32 sample in `[-1.0, 1.0]` to 16-bit PCM. Out-of-range values
/// are clamped.
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * i16::MAX as f32) as i16
}

/// Downmix interleaved multi-channel i16 audio to mono by averaging channels
/// per frame. A trailing partial frame is dropped.
pub fn downmix_to_mono(samples: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Downmix interleaved f32 audio to mono 16-bit PCM.
pub fn downmix_f32_to_mono_i16(samples: &[f32], channels: usize) -> Vec<i16> {
    let channels = channels.max(1);
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| f32_to_i16(frame.iter().sum::<f32>() * scale))
        .collect()
}
