use crate::error::Result;
use crate::types::Node;
use crate::vector::cosine_similarity;
use rayon::prelude::*;

/// Score every node that has an embedding against `query`.
///
/// Nodes without an embedding are dropped, not scored as zero. The output
/// keeps the input order. Comparisons are independent, so they run on the
/// rayon pool.
pub fn score_nodes(query: &[f32], nodes: Vec<Node>) -> Result<Vec<(Node, f32)>> {
    nodes
        .into_par_iter()
        .filter(|node| node.has_embedding())
        .map(|node| {
            let score = cosine_similarity(query, &node.embedding)?;
            Ok((node, score))
        })
        .collect()
}

/// Sort scored nodes by score, highest first. Ties keep their input order.
pub fn rank_descending<T>(scored: &mut [(T, f32)]) {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
}
