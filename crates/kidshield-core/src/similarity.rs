//! Vector similarity helpers shared by the analyzer and the assistant.

/// Cosine similarity between two vectors, clamped to `[-1, 1]`.
///
/// Sums are accumulated in `f64` so large embeddings cannot overflow. Returns
/// 0.0 when either vector has zero length or the result is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !sim.is_finite() {
        return 0.0;
    }
    sim.clamp(-1.0, 1.0) as f32
}

/// Find the row with highest cosine similarity to `query`.
///
/// Ties keep the earliest row. Non-finite scores never win. Returns `None`
/// for an empty matrix.
pub fn nearest<R: AsRef<[f32]>>(query: &[f32], rows: &[R]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;

    for (idx, row) in rows.iter().enumerate() {
        let sim = cosine_similarity(query, row.as_ref());
        if !sim.is_finite() {
            continue;
        }
        match best {
            Some((_, best_sim)) if sim <= best_sim => {}
            _ => best = Some((idx, sim)),
        }
    }

    best
}

/// Highest cosine similarity of `query` against any row, or `None` if empty.
pub fn max_similarity<R: AsRef<[f32]>>(query: &[f32], rows: &[R]) -> Option<f32> {
    nearest(query, rows).map(|(_, sim)| sim)
}

/// L2-normalize a vector in place.
pub fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
