use cellkern::cell::polygon::{point_in_polygon, query_rng, PolygonLocation};
use cellkern::{BoundingBox, Polygon};
use rand::rngs::StdRng;
use rand::SeedableRng;

const Z: [f64; 3] = [0.0, 0.0, 1.0];

fn hexagon() -> Vec<[f64; 3]> {
    (0..6)
        .map(|k| {
            let angle = (60.0 * k as f64 + 15.0).to_radians();
            [2.0 + angle.cos(), -1.0 + angle.sin(), 0.0]
        })
        .collect()
}

#[test]
fn test_centroid_is_stable_across_trials() {
    let points = hexagon();
    let bounds = BoundingBox::from_points(&points);
    let centroid = [2.0, -1.0, 0.0];
    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        assert_eq!(
            point_in_polygon(&centroid, &points, &bounds, &Z, &mut rng),
            PolygonLocation::Inside,
            "seed {}",
            seed
        );
    }
}

#[test]
fn test_outside_points() {
    let points = hexagon();
    let bounds = BoundingBox::from_points(&points);
    let mut rng = StdRng::seed_from_u64(3);
    // Beyond the bounding box.
    assert_eq!(point_in_polygon(&[5.0, 0.0, 0.0], &points, &bounds, &Z, &mut rng), PolygonLocation::Outside);
    // Inside the bounding box, outside a corner of the hexagon.
    let corner = [bounds.max[0] - 0.01, bounds.max[1] - 0.01, 0.0];
    assert_eq!(point_in_polygon(&corner, &points, &bounds, &Z, &mut rng), PolygonLocation::Outside);
}

#[test]
fn test_concave_polygon() {
    // U shape opening upwards.
    let points = vec![
        [0.0, 0.0, 0.0],
        [3.0, 0.0, 0.0],
        [3.0, 3.0, 0.0],
        [2.0, 3.0, 0.0],
        [2.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 3.0, 0.0],
        [0.0, 3.0, 0.0],
    ];
    let bounds = BoundingBox::from_points(&points);
    for seed in 0..20 {
        let mut rng = query_rng(seed, &[0.0; 3]);
        assert_eq!(point_in_polygon(&[1.5, 2.0, 0.0], &points, &bounds, &Z, &mut rng), PolygonLocation::Outside);
        assert_eq!(point_in_polygon(&[0.5, 2.5, 0.0], &points, &bounds, &Z, &mut rng), PolygonLocation::Inside);
        assert_eq!(point_in_polygon(&[2.5, 0.5, 0.0], &points, &bounds, &Z, &mut rng), PolygonLocation::Inside);
    }
}

#[test]
fn test_tilted_plane() {
    // Square in the plane x = y, classified along its own normal.
    let s = std::f64::consts::FRAC_1_SQRT_2;
    let points = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [0.0, 0.0, 1.0]];
    let bounds = BoundingBox::from_points(&points);
    let normal = [s, -s, 0.0];
    let mut rng = StdRng::seed_from_u64(11);
    assert_eq!(point_in_polygon(&[0.5, 0.5, 0.5], &points, &bounds, &normal, &mut rng), PolygonLocation::Inside);
    assert_eq!(point_in_polygon(&[0.5, 0.5, 1.5], &points, &bounds, &normal, &mut rng), PolygonLocation::Outside);
}

#[test]
fn test_degenerate_polygon_fails() {
    let points = vec![[1.0, 1.0, 0.0]; 4];
    let bounds = BoundingBox::from_points(&points);
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(point_in_polygon(&[1.0, 1.0, 0.0], &points, &bounds, &Z, &mut rng), PolygonLocation::Failure);
}

#[test]
fn test_polygon_seed_makes_queries_repeatable() {
    let polygon = Polygon::from_points(hexagon()).unwrap().with_seed(1234);
    let x = [2.3, -0.8, 0.0];
    let first = polygon.point_location(&x);
    assert_eq!(first, PolygonLocation::Inside);
    for _ in 0..10 {
        assert_eq!(polygon.point_location(&x), first);
    }
}
