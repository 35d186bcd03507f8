#[derive(Debug, Clone)]
pub struct ImageMetrics {
    pub psnr: f64,
    pub mse: f64,
    /// Per channel PSNR in RGBA order.
    pub channel_psnr: [f64; 4],
}

fn psnr(mse: f64, peak: f64) -> f64 {
    if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (peak * peak / mse).log10()
    }
}

/// Compares two RGBA8 images in the 8-bit domain. Only the first `channels` channels take
/// part in the overall value.
pub fn rgba8_metrics(original: &[u8], decoded: &[u8], channels: usize) -> ImageMetrics {
    assert_eq!(original.len(), decoded.len(), "image buffers must have the same length");
    assert_eq!(original.len() % 4, 0);

    let pixel_count = (original.len() / 4) as f64;
    let mut channel_mse = [0.0f64; 4];

    for (a, b) in original.chunks_exact(4).zip(decoded.chunks_exact(4)) {
        for channel in 0..4 {
            let diff = a[channel] as f64 - b[channel] as f64;
            channel_mse[channel] += diff * diff;
        }
    }
    channel_mse.iter_mut().for_each(|mse| *mse /= pixel_count);

    let mse = channel_mse[..channels].iter().sum::<f64>() / channels as f64;

    ImageMetrics {
        psnr: psnr(mse, 255.0),
        mse,
        channel_psnr: channel_mse.map(|mse| psnr(mse, 255.0)),
    }
}

/// Compares linear RGB values against decoded half floats, peak value 1.0. Alpha is skipped.
pub fn rgb_f32_metrics(original: &[f32], decoded: &[bptc_compression::half::f16]) -> ImageMetrics {
    assert_eq!(original.len(), decoded.len(), "image buffers must have the same length");

    let pixel_count = (original.len() / 4) as f64;
    let mut channel_mse = [0.0f64; 4];

    for (a, b) in original.chunks_exact(4).zip(decoded.chunks_exact(4)) {
        for channel in 0..3 {
            let diff = a[channel] as f64 - b[channel].to_f64();
            channel_mse[channel] += diff * diff;
        }
    }
    channel_mse.iter_mut().for_each(|mse| *mse /= pixel_count);

    let mse = channel_mse[..3].iter().sum::<f64>() / 3.0;

    ImageMetrics {
        psnr: psnr(mse, 1.0),
        mse,
        channel_psnr: channel_mse.map(|mse| psnr(mse, 1.0)),
    }
}
