//! Integration tests for detection history compression

use ndarray::{arr2, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use secrfit_rs::data::{compress_histories, CaptureData, Channel};

fn random_bincapt(rng: &mut ChaCha8Rng, n: usize, k: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, k), |_| if rng.gen_bool(0.3) { 1.0 } else { 0.0 })
}

fn sorted_rows(m: &Array2<f64>) -> Vec<Vec<u8>> {
    let mut rows: Vec<Vec<u8>> = m
        .outer_iter()
        .map(|row| row.iter().map(|&v| v as u8).collect())
        .collect();
    rows.sort();
    rows
}

#[test]
fn test_frequencies_sum_and_reexpansion() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for trial in 0..50 {
        let n = rng.gen_range(1..40);
        let k = rng.gen_range(1..6);
        let bincapt = random_bincapt(&mut rng, n, k);
        let compressed = compress_histories(&CaptureData::new(bincapt.clone()));

        assert_eq!(compressed.n_detections(), n, "trial {}", trial);
        assert!(compressed.freqs.iter().all(|&f| f >= 1));
        assert_eq!(
            sorted_rows(&compressed.expand_binary()),
            sorted_rows(&bincapt),
            "trial {}",
            trial
        );

        // Unique histories are distinct.
        let unique = sorted_rows(compressed.data.bincapt());
        let mut deduped = unique.clone();
        deduped.dedup();
        assert_eq!(unique, deduped);
    }
}

#[test]
fn test_identical_rows_collapse() {
    let capt = CaptureData::new(arr2(&[
        [1.0, 0.0, 1.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [1.0, 0.0, 1.0, 0.0],
    ]));
    let compressed = compress_histories(&capt);

    assert_eq!(compressed.n_unique(), 2);
    let mut freqs = compressed.freqs.clone();
    freqs.sort_unstable();
    assert_eq!(freqs, vec![1, 2]);

    // Both copies of the repeated row map to the same unique history.
    assert_eq!(compressed.group_of[0], compressed.group_of[2]);
    assert_ne!(compressed.group_of[0], compressed.group_of[1]);
    assert_eq!(compressed.freqs[compressed.group_of[0]], 2);
}

#[test]
fn test_single_group_and_singletons() {
    let all_same = CaptureData::new(arr2(&[[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]]));
    let compressed = compress_histories(&all_same);
    assert_eq!(compressed.freqs, vec![3]);

    let all_distinct = CaptureData::new(arr2(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]));
    let compressed = compress_histories(&all_distinct);
    assert_eq!(compressed.freqs, vec![1, 1, 1]);
}

#[test]
fn test_auxiliary_channels_keep_first_row_of_run() {
    let bincapt = arr2(&[[1.0, 1.0], [0.0, 1.0], [1.0, 1.0]]);
    let bearings = arr2(&[[0.1, 0.2], [0.0, 0.5], [0.3, 0.4]]);
    let capt = CaptureData::new(bincapt)
        .with_channel(Channel::Bearing, bearings)
        .unwrap();
    let compressed = compress_histories(&capt);

    let group = compressed.group_of[0];
    let representative = compressed.data.channel(Channel::Bearing).unwrap().row(group).to_owned();
    // Row 0 precedes row 2 in the stable sort, so its measurements represent the run.
    assert_eq!(representative.to_vec(), vec![0.1, 0.2]);
    assert_eq!(
        compressed.data.channel(Channel::Bearing).unwrap().nrows(),
        compressed.n_unique()
    );
}
