mod support;

use serial_neighbor::validation::{brute_force_neighbors, recall};
use serial_neighbor::{serial_neighbor, SerialNeighborError, NEIGHBOR_SENTINEL};
use support::points::{clustered_points, random_cube_points};

#[test]
fn test_recall_of_exact_table_is_perfect() {
    let points = random_cube_points(500, 0);
    let queries = random_cube_points(50, 1);
    let exact = brute_force_neighbors(&points, &queries, 6, None).unwrap();
    let report = recall(&exact, &exact).unwrap();

    assert!(report.is_exact(), "Expected exact recall: {}", report);
    assert_eq!(report.overall_recall(), 1.0);
    assert_eq!(report.perfect_queries, 50);
    assert_eq!(report.substitutions, 0);
    assert_eq!(report.expected, 300);
}

#[test]
fn test_recall_report_bounds() {
    let points = clustered_points(2000, 8, 0.02, 2);
    let queries = random_cube_points(200, 3);
    let approx = serial_neighbor(&points, &queries, &["z"], 10, 0.01, None).unwrap();
    let exact = brute_force_neighbors(&points, &queries, 10, None).unwrap();
    let report = recall(&approx, &exact).unwrap();

    assert!((0.0..=1.0).contains(&report.mean_recall), "{}", report);
    assert!((0.0..=1.0).contains(&report.min_recall), "{}", report);
    assert!(report.min_recall <= report.mean_recall);
    assert!(report.found <= report.expected);
    // Every miss is replaced by some further point since nothing is masked.
    assert_eq!(report.expected - report.found, report.substitutions);
}

#[test]
fn test_brute_force_mask_and_padding() {
    let points = [[0.0f32, 0.0, 0.0], [0.5, 0.0, 0.0], [3.0, 0.0, 0.0]];
    let table = brute_force_neighbors(&points, &[[0.1f32, 0.0, 0.0]], 4, Some(1.0)).unwrap();
    let (indices, distances) = table.row(0);
    assert_eq!(indices, &[0, 1, NEIGHBOR_SENTINEL, NEIGHBOR_SENTINEL]);
    assert!((distances[0] - 0.1).abs() < 1e-6);
    assert!((distances[1] - 0.4).abs() < 1e-6);
}

#[test]
fn test_brute_force_validates_inputs() {
    let empty: [[f32; 3]; 0] = [];
    assert!(matches!(
        brute_force_neighbors(&empty, &[[0.0f32; 3]], 1, None),
        Err(SerialNeighborError::InvalidParameter { name: "points", .. })
    ));
    assert!(matches!(
        brute_force_neighbors(&[[0.0f32; 3]], &[[f32::NAN, 0.0, 0.0]], 1, None),
        Err(SerialNeighborError::NumericError { .. })
    ));
}
