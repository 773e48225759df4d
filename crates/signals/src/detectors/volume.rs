use common::VolumeLabel;

/// `Anomaly` when volume exceeds `ratio` times the rolling mean of the last
/// `window` volumes (current bar included). The mean starts from the first
/// bar using however many observations exist.
pub fn volume_anomaly(volume: &[f64], window: usize, ratio: f64) -> Vec<VolumeLabel> {
    let window = window.max(1);
    (0..volume.len())
        .map(|t| {
            let start = (t + 1).saturating_sub(window);
            let slice = &volume[start..=t];
            let mean = slice.iter().sum::<f64>() / slice.len() as f64;
            if volume[t] > mean * ratio {
                VolumeLabel::Anomaly
            } else {
                VolumeLabel::None
            }
        })
        .collect()
}
