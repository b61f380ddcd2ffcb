extern crate rrcflib;

use rrcflib::{score_stream, Forest, ForestBuilder, RcfError, ScoreRecord};

fn single_tree_scores(values: Vec<f64>) -> Vec<f64> {
    let mut forest: Forest<f64> = ForestBuilder::new(1, 5).random_seed(0).build().unwrap();
    score_stream(values, &mut forest, 1)
        .unwrap()
        .map(|record| record.unwrap().score)
        .collect()
}

#[test]
fn spike_stands_out_from_neighbours() {
    let scores = single_tree_scores(vec![0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(scores.len(), 10);

    // five copies of zero share one leaf
    assert!(scores[..5].iter().all(|&score| score == 0.0));
    // the spike is cut off from the four remaining zeros
    assert!((scores[5] - 0.8).abs() < 1e-12);
    // a zero joining the window is scored against the single spike
    for &score in &scores[6..] {
        assert!((score - 0.2).abs() < 1e-12);
    }
    assert!(scores[5] > scores[4] && scores[5] > scores[6]);
}

#[test]
fn spike_leaves_window_after_capacity() {
    let mut values = vec![0.0; 5];
    values.push(10.0);
    values.extend(vec![0.0; 6]);
    let scores = single_tree_scores(values);

    // index 10 evicts the spike and the window is uniform again
    assert_eq!(scores[10], 0.0);
    assert_eq!(scores[11], 0.0);
}

#[test]
fn rejected_point_does_not_consume_an_index() {
    let mut forest: Forest<f64> = ForestBuilder::new(3, 5).random_seed(0).build().unwrap();
    forest.process(&[0.0, 0.0], 0).unwrap();
    assert_eq!(
        forest.process(&[0.0], 1),
        Err(RcfError::InvalidDimension { expected: 2, found: 1 })
    );

    let record: ScoreRecord<f64> = score_stream(vec![1.0, 2.0], &mut forest, 2)
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(record.index, 1);
    assert_eq!(record.value, 2.0);
}
