extern crate rrcflib;

use rrcflib::{score_stream, Forest, ForestBuilder, NoisySine, ScoreRecord};

#[test]
fn anomalous_segment_scores_higher() {
    let shingle_size = 4;
    let signal = NoisySine::new(7);
    let mut forest: Forest<f64> = ForestBuilder::new(50, 128)
        .random_seed(17)
        .parallel_enabled(true)
        .build()
        .unwrap();

    let values = signal.data.iter().copied();
    let records: Vec<ScoreRecord<f64>> = score_stream(values, &mut forest, shingle_size)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), signal.data.len() - shingle_size + 1);

    let mean_over = |lo: usize, hi: usize| -> f64 {
        let scores: Vec<f64> = records
            .iter()
            .filter(|r| (lo..hi).contains(&(r.index + shingle_size - 1)))
            .map(|r| r.score)
            .collect();
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    let first = signal.anomalous_indices[0];
    let last = *signal.anomalous_indices.last().unwrap();
    let anomalous = mean_over(first, last + 1);
    let normal = mean_over(150, 300);
    assert!(anomalous > normal, "anomalous {} normal {}", anomalous, normal);
}
