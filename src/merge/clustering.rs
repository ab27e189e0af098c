use crate::dsp::std_dev;
use crate::merge::combine_group;
use crate::types::StepRecord;

/// Merge steps by density-clustering their levels.
///
/// Levels are grouped with a one-dimensional DBSCAN equivalent
/// (`eps = eps_factor * std(levels)`, single points form clusters).
/// Only index-contiguous runs inside a cluster merge: a cluster whose
/// members are separated in index order contributes one record per
/// run, so repeats of a level never bridge the steps between them.
/// One distinct cluster or fewer leaves the input unchanged.
pub fn merge_clustering(steps: &[StepRecord], eps_factor: f64) -> Vec<StepRecord> {
    if steps.len() < 2 {
        return steps.to_vec();
    }

    let levels: Vec<f64> = steps.iter().map(|s| s.level).collect();
    let eps = eps_factor * std_dev(&levels);
    let labels = cluster_levels(&levels, eps);
    let cluster_count = labels.iter().max().map_or(0, |m| m + 1);
    log::debug!("level clustering produced {} clusters", cluster_count);
    if cluster_count <= 1 {
        return steps.to_vec();
    }

    let mut merged: Vec<StepRecord> = Vec::new();
    for label in 0..cluster_count {
        let indices: Vec<usize> = (0..steps.len()).filter(|&i| labels[i] == label).collect();
        let mut i = 0;
        while i < indices.len() {
            let run_start = i;
            while i + 1 < indices.len() && indices[i + 1] == indices[i] + 1 {
                i += 1;
            }
            if run_start == i {
                merged.push(steps[indices[i]].clone());
            } else {
                let group: Vec<&StepRecord> =
                    indices[run_start..=i].iter().map(|&k| &steps[k]).collect();
                merged.push(combine_group(&group));
            }
            i += 1;
        }
    }
    merged.sort_by_key(|s| s.start);
    merged
}

/// Chain-cluster 1-D values: sorted neighbors within `eps` share a
/// cluster. This matches DBSCAN with `min_samples = 1`, where every
/// point is a core point and clusters are the eps-connected components.
fn cluster_levels(levels: &[f64], eps: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..levels.len()).collect();
    order.sort_by(|&a, &b| {
        levels[a]
            .partial_cmp(&levels[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut labels = vec![0usize; levels.len()];
    let mut label = 0;
    for pair in order.windows(2) {
        if levels[pair[1]] - levels[pair[0]] > eps {
            label += 1;
        }
        labels[pair[1]] = label;
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::test_support::flat_step;

    #[test]
    fn contiguous_runs_merge() {
        let steps = vec![
            flat_step(0, 50, 1.0, 5),
            flat_step(50, 100, 1.1, 5),
            flat_step(100, 150, 5.0, 5),
        ];
        let merged = merge_clustering(&steps, 0.5);
        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].start, merged[0].end), (0, 100));
        assert!((merged[0].level - 1.05).abs() < 1e-12);
        assert_eq!(merged[0].stable_data.len(), 100);
        assert_eq!(merged[1].start, 100);
    }

    #[test]
    fn separated_repeats_never_bridge() {
        // Levels alternate 0/5/0/5: clustering pairs them up, but the
        // pairs are not index-contiguous, so all four records survive.
        let steps = vec![
            flat_step(0, 50, 0.0, 5),
            flat_step(50, 100, 5.0, 5),
            flat_step(100, 150, 0.0, 5),
            flat_step(150, 200, 5.0, 5),
        ];
        let merged = merge_clustering(&steps, 0.5);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged, steps);
    }

    #[test]
    fn single_cluster_returns_input() {
        let steps = vec![
            flat_step(0, 50, 1.0, 5),
            flat_step(50, 100, 1.01, 5),
            flat_step(100, 150, 1.02, 5),
        ];
        let merged = merge_clustering(&steps, 5.0);
        assert_eq!(merged, steps);
    }

    #[test]
    fn identical_levels_are_degenerate() {
        // Zero level spread collapses eps to zero; everything lands in
        // one cluster and the input comes back unchanged.
        let steps = vec![flat_step(0, 50, 2.0, 5), flat_step(50, 100, 2.0, 5)];
        let merged = merge_clustering(&steps, 0.5);
        assert_eq!(merged, steps);
    }

    #[test]
    fn result_ordered_by_start() {
        let steps = vec![
            flat_step(0, 50, 5.0, 5),
            flat_step(50, 100, 0.0, 5),
            flat_step(100, 150, 0.1, 5),
            flat_step(150, 200, 5.1, 5),
        ];
        let merged = merge_clustering(&steps, 0.3);
        for pair in merged.windows(2) {
            assert!(pair[0].start < pair[1].start);
        }
        assert_eq!(merged.len(), 3);
        assert_eq!((merged[1].start, merged[1].end), (50, 150));
    }
}
