//! Audio decoding for speech pipelines.

use std::path::Path;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use tracing::debug;

use crate::{Error, Result};

/// Read a WAV file as mono `f32` samples at `sampling_rate`.
///
/// Integer samples are normalized to `[-1, 1)`: 8-bit as `(u - 128) / 128`,
/// 16-bit by `2^15`, 24-bit by `2^23`, 32-bit by `2^31`. Float samples are
/// kept as they are. If the file's rate differs, every channel is resampled
/// with the Fourier method to `round(len * sampling_rate / file_rate)`
/// samples. Two or more channels are merged by [`downmix`].
pub fn read_audio(path: impl AsRef<Path>, sampling_rate: u32) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channel_count = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = match spec.bits_per_sample {
                // hound already recenters unsigned 8-bit data around zero
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                bits => {
                    return Err(Error::precondition(format!(
                        "unsupported WAV sample width: {} bits",
                        bits
                    )))
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| (s as f64 / scale) as f32))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    debug!(
        path = %path.display(),
        rate = spec.sample_rate,
        channels = channel_count,
        bits = spec.bits_per_sample,
        "Decoded WAV"
    );

    let frames = interleaved.len() / channel_count;
    let mut channels: Vec<Vec<f32>> = (0..channel_count)
        .map(|c| {
            interleaved
                .iter()
                .skip(c)
                .step_by(channel_count)
                .take(frames)
                .copied()
                .collect()
        })
        .collect();

    if spec.sample_rate != sampling_rate && spec.sample_rate > 0 {
        let target =
            (frames as f64 * sampling_rate as f64 / spec.sample_rate as f64).round() as usize;
        debug!(
            from = spec.sample_rate,
            to = sampling_rate,
            frames,
            target,
            "Resampling"
        );
        channels = channels.iter().map(|c| resample(c, target)).collect();
    }

    Ok(downmix(&channels))
}

/// Merge channels to mono.
///
/// A single channel is returned as is. Otherwise the first two channels are
/// combined as `√2 · (left + right) / 2`; further channels are ignored.
pub fn downmix(channels: &[Vec<f32>]) -> Vec<f32> {
    match channels {
        [] => Vec::new(),
        [mono] => mono.clone(),
        [left, right, ..] => left
            .iter()
            .zip(right)
            .map(|(l, r)| std::f32::consts::SQRT_2 * (l + r) / 2.0)
            .collect(),
    }
}

/// Resample `samples` to `num` samples with the Fourier method.
///
/// The signal is treated as periodic: the spectrum is truncated or
/// zero-padded to the new length, splitting or joining the Nyquist bin when
/// the shorter length is even, and transformed back.
pub fn resample(samples: &[f32], num: usize) -> Vec<f32> {
    let nx = samples.len();
    if num == nx {
        return samples.to_vec();
    }
    if nx == 0 || num == 0 {
        return vec![0.0; num];
    }

    let mut planner = FftPlanner::<f64>::new();

    let mut spectrum: Vec<Complex<f64>> = samples
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    planner.plan_fft_forward(nx).process(&mut spectrum);

    // Half spectrum of the output, as a real FFT would hold it.
    let mut half = vec![Complex::new(0.0, 0.0); num / 2 + 1];
    let n = num.min(nx);
    let nyq = n / 2 + 1;
    half[..nyq].copy_from_slice(&spectrum[..nyq]);
    if n % 2 == 0 {
        if num < nx {
            half[n / 2] *= 2.0;
        } else {
            half[n / 2] *= 0.5;
        }
    }

    // Expand to the Hermitian full spectrum and invert.
    let mut full = vec![Complex::new(0.0, 0.0); num];
    full[0] = Complex::new(half[0].re, 0.0);
    for k in 1..=(num - 1) / 2 {
        full[k] = half[k];
        full[num - k] = half[k].conj();
    }
    if num % 2 == 0 {
        full[num / 2] = Complex::new(half[num / 2].re, 0.0);
    }
    planner.plan_fft_inverse(num).process(&mut full);

    full.iter().map(|c| (c.re / nx as f64) as f32).collect()
}
