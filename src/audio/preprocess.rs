//! Clip shaping and score post-processing for the audio classifier.

/// Fit samples to exactly `len`, truncating long input and zero-padding short input.
pub fn fit_to_length(mut samples: Vec<f32>, len: usize) -> Vec<f32> {
    samples.resize(len, 0.0);
    samples
}

/// Numerically stable softmax.
///
/// Non-finite inputs are treated as negative infinity so they receive zero
/// probability.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; logits.len()];
    }

    let exps: Vec<f32> = logits
        .iter()
        .map(|&v| if v.is_finite() { (v - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Indices of the `n` highest scores, best first.
///
/// Equal scores keep their original order. Non-finite scores sort last.
pub fn top_n_indices(scores: &[f32], n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| rank_key(scores[b]).total_cmp(&rank_key(scores[a])));
    indices.truncate(n);
    indices
}

fn rank_key(score: f32) -> f32 {
    if score.is_finite() {
        score
    } else {
        f32::NEG_INFINITY
    }
}
