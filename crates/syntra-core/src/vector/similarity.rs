use crate::error::{Result, SyntraError};

/// Cosine similarity between two embeddings.
///
/// Returns `0.0` when either side is empty or has zero magnitude. Two
/// non-empty vectors of different lengths mean the embeddings came from
/// different models, which is reported as [`SyntraError::DimensionMismatch`].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.is_empty() || b.is_empty() {
        return Ok(0.0);
    }

    if a.len() != b.len() {
        return Err(SyntraError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}
