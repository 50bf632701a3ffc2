use vidgen_core::{stage_index, sub_progress, StageTable};

fn thresholds() -> Vec<f64> {
    StageTable::generation().thresholds()
}

#[test]
fn stage_index_is_non_decreasing_over_full_range() {
    let thresholds = thresholds();
    let mut previous = 0;
    for step in 0..=1000 {
        let p = step as f64 / 10.0;
        let index = stage_index(p, &thresholds);
        assert!(index >= previous, "index dropped at p={p}");
        previous = index;
    }
    assert_eq!(stage_index(100.0, &thresholds), thresholds.len() - 1);
}

#[test]
fn sub_progress_stays_in_bounds() {
    let thresholds = thresholds();
    for step in 0..=1000 {
        let p = step as f64 / 10.0;
        let sub = sub_progress(p, &thresholds);
        assert!((0.0..=100.0).contains(&sub), "sub-progress {sub} at p={p}");
    }
}

#[test]
fn every_boundary_opens_the_next_stage() {
    let thresholds = thresholds();
    for (index, threshold) in thresholds.iter().enumerate().take(thresholds.len() - 1) {
        assert_eq!(stage_index(*threshold, &thresholds), index + 1);
        assert_eq!(sub_progress(*threshold, &thresholds), 0.0);
    }
}

#[test]
fn documented_examples() {
    let table = StageTable::generation();

    let at_17 = table.position(17.0);
    assert_eq!((at_17.index, at_17.label.as_str()), (1, "Loading Model"));
    assert!((at_17.sub_progress - 40.0).abs() < 1e-9);

    let at_92 = table.position(92.0);
    assert_eq!((at_92.index, at_92.label.as_str()), (5, "Rendering Frames"));
    assert!((at_92.sub_progress - 40.0).abs() < 1e-9);
}
