use approx::assert_relative_eq;
use gauge::{Gauge, GaugeError, Outbound};

fn points(g: &Gauge) -> Vec<(f64, f64)> {
    g.determination().points().to_vec()
}

fn assert_points_close(actual: &[(f64, f64)], expected: &[(f64, f64)]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert_relative_eq!(a.0, e.0, epsilon = 1e-9);
        assert_relative_eq!(a.1, e.1, epsilon = 1e-9);
    }
}

#[test]
fn scenario_1_overlapping_momenta_net_to_zero() {
    let g = Gauge::bounded(12.0, 100.0, Some(0.0));
    g.add_momentum((1.0, 1.0, 6.0)).unwrap();
    g.add_momentum((-1.0, 3.0, 8.0)).unwrap();
    assert_points_close(&points(&g), &[(0.0, 12.0), (1.0, 12.0), (3.0, 14.0), (6.0, 14.0), (8.0, 12.0)]);
}

#[test]
fn scenario_2_clamped_at_the_ceiling() {
    let g = Gauge::bounded(8.0, 10.0, Some(0.0));
    g.add_momentum((1.0, 0.0, 4.0)).unwrap();
    assert_points_close(&points(&g), &[(0.0, 8.0), (2.0, 10.0), (4.0, 10.0)]);
}

#[test]
fn scenario_3_enters_range_then_descends() {
    let g = Gauge::bounded(12.0, 10.0, Some(0.0));
    g.add_momentum((-1.0, 0.0, f64::INFINITY)).unwrap();
    assert_points_close(&points(&g), &[(0.0, 12.0), (2.0, 10.0), (12.0, 0.0)]);
}

#[test]
fn scenario_3_reports_out_of_range_before_it_actually_enters() {
    // The gauge starts above its own ceiling, so it must not be considered
    // in range (nor have its value clamped) until it actually descends to
    // meet it at t=2.
    let g = Gauge::bounded(12.0, 10.0, Some(0.0));
    g.add_momentum((-1.0, 0.0, f64::INFINITY)).unwrap();
    assert!(!g.in_range(Some(0.0)));
    assert!(!g.in_range(Some(1.0)));
    assert_relative_eq!(g.get(Some(1.0)), 11.0);
    assert!(g.in_range(Some(2.0)));
    assert_relative_eq!(g.get(Some(2.0)), 10.0);
}

#[test]
fn stays_out_of_range_while_net_velocity_still_overflows() {
    // Started well above the ceiling by two opposing momenta; only the
    // component pulling back toward the ceiling is tracked while the
    // overflow is unresolved, and the gauge must not be forced onto the
    // ceiling early just because one momentum's own interval ends.
    let g = Gauge::new(20.0, 10.0, 0.0, Some(0.0));
    g.add_momentum((-1.0, 0.0, 5.0)).unwrap();
    g.add_momentum((3.0, 0.0, 5.0)).unwrap();
    assert_points_close(&points(&g), &[(0.0, 20.0), (5.0, 15.0)]);
    assert!(!g.in_range(Some(5.0)));
    assert_relative_eq!(g.get(Some(5.0)), 15.0);
}

#[test]
fn scenario_4_overlapping_momenta_with_a_permanent_rise() {
    let g = Gauge::bounded(0.0, 5.0, Some(0.0));
    g.add_momentum(1.0).unwrap();
    g.add_momentum((-2.0, 1.0, 3.0)).unwrap();
    g.add_momentum((1.0, 5.0, 7.0)).unwrap();
    assert_points_close(
        &points(&g),
        &[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 0.0), (5.0, 2.0), (6.5, 5.0), (7.0, 5.0)],
    );
}

#[test]
fn scenario_5_hyper_gauge_ceiling() {
    let ceiling = Gauge::bounded(15.0, 15.0, Some(0.0));
    ceiling.add_momentum((-1.0, f64::NEG_INFINITY, 5.0)).unwrap();
    let g = Gauge::new(12.0, ceiling, 0.0, Some(0.0));
    g.add_momentum((1.0, 1.0, 6.0)).unwrap();
    g.add_momentum((-1.0, 3.0, 8.0)).unwrap();
    assert_points_close(
        &points(&g),
        &[(0.0, 12.0), (1.0, 12.0), (2.0, 13.0), (3.0, 12.0), (5.0, 10.0), (6.0, 10.0), (8.0, 8.0)],
    );
}

#[test]
fn scenario_6_when_tracks_each_goal_value_in_turn() {
    let g = Gauge::bounded(0.0, 10.0, Some(0.0));
    g.add_momentum(1.0).unwrap();
    g.add_momentum((1.0, 3.0, 5.0)).unwrap();
    g.add_momentum((-2.0, 4.0, 8.0)).unwrap();
    // each `when(v)` below is the earliest time the trajectory reaches `v`,
    // once all three momenta above are in effect.
    let expected = [
        (3.0, 3.0),
        (4.0, 3.5),
        (5.0, 4.0),
        (6.0, 12.0),
        (7.0, 13.0),
        (8.0, 14.0),
        (9.0, 15.0),
        (10.0, 16.0),
    ];
    for (value, at) in expected {
        assert_relative_eq!(g.when(value, 0).unwrap(), at, epsilon = 1e-9);
    }
}

#[test]
fn permanent_momentum_is_a_single_infinite_ray() {
    let g = Gauge::bounded(10.0, 10.0, Some(0.0));
    g.add_momentum(-1.0).unwrap();
    assert_points_close(&points(&g), &[(0.0, 10.0), (10.0, 0.0)]);

    let g = Gauge::bounded(12.0, 10.0, Some(0.0));
    g.add_momentum(-1.0).unwrap();
    assert_points_close(&points(&g), &[(0.0, 12.0), (2.0, 10.0), (12.0, 0.0)]);
}

#[test]
fn set_max_and_set_min_rebase_at_the_call_time() {
    let g = Gauge::bounded(5.0, 10.0, Some(0.0));
    g.add_momentum(1.0).unwrap();
    assert_points_close(&points(&g), &[(0.0, 5.0), (5.0, 10.0)]);

    g.set_max(50.0, Some(0.0)).unwrap();
    assert_points_close(&points(&g), &[(0.0, 5.0), (45.0, 50.0)]);

    g.set_min(40.0, Some(0.0)).unwrap();
    assert_points_close(&points(&g), &[(0.0, 40.0), (10.0, 50.0)]);
}

#[test]
fn clear_momenta_rebases_in_and_out_of_range() {
    let g = Gauge::bounded(0.0, 10.0, Some(0.0));
    g.add_momentum(1.0).unwrap();
    g.clear_momenta(None, Some(5.0));
    assert_relative_eq!(g.get(Some(5.0)), 5.0);
    assert_points_close(&points(&g), &[(5.0, 5.0)]);

    g.add_momentum(1.0).unwrap();
    g.set(15.0, Outbound::Ok, Some(10.0)).unwrap();
    g.clear_momenta(None, Some(10.0));
    assert_relative_eq!(g.get(Some(10.0)), 15.0);
    assert_points_close(&points(&g), &[(10.0, 15.0)]);

    g.clear_momenta(Some(100.0), None);
    assert_relative_eq!(g.get(None), 100.0);
}

#[test]
fn forget_past_drops_expired_momenta_without_changing_the_future() {
    let g = Gauge::bounded(0.0, 50.0, Some(0.0));
    g.add_momentum((1.0, 0.0, 5.0)).unwrap();
    g.add_momentum((0.0, 0.0, f64::INFINITY)).unwrap();
    g.add_momentum((0.0, f64::NEG_INFINITY, 999.0)).unwrap();
    assert_eq!(g.momenta().len(), 3);
    assert_relative_eq!(g.get(Some(5.0)), 5.0);
    assert_relative_eq!(g.get(Some(20.0)), 5.0);

    g.forget_past(None, Some(30.0)).unwrap();
    assert_eq!(g.momenta().len(), 2);
    assert_relative_eq!(g.get(Some(30.0)), 5.0);
}

#[test]
fn remove_momentum_by_handle_and_by_equal_value() {
    let g = Gauge::bounded(0.0, 10.0, Some(0.0));
    let m1 = g.add_momentum(1.0).unwrap();
    let m2 = g.add_momentum(1.0).unwrap();
    g.add_momentum((2.0, 10.0, f64::INFINITY)).unwrap();
    g.add_momentum((-3.0, f64::NEG_INFINITY, 100.0)).unwrap();
    assert_eq!(g.momenta().len(), 4);

    g.remove_momentum(m2).unwrap();
    assert_eq!(g.momenta().len(), 3);
    assert!(g.momenta().contains(&m1));

    assert_eq!(g.remove_momentum(2.0), Err(GaugeError::MomentumNotPresent));
    g.remove_momentum((2.0, 10.0, f64::INFINITY)).unwrap();
    assert_eq!(g.momenta().len(), 2);
}

#[test]
fn a_three_gauge_hyper_gauge_stack() {
    let head = Gauge::bounded(10.0, 10.0, Some(0.0));
    head.add_momentum((-1.0, 0.0, 4.0)).unwrap();
    head.add_momentum((1.0, 6.0, 7.0)).unwrap();

    let foot = Gauge::bounded(0.0, 10.0, Some(0.0));
    foot.add_momentum((1.0, 1.0, 6.0)).unwrap();
    foot.add_momentum((-1.0, 6.0, 8.0)).unwrap();

    let g = Gauge::new(5.0, head, foot, Some(0.0));
    g.add_momentum((1.0, 0.0, 3.0)).unwrap();
    g.add_momentum((-1.0, 3.0, 6.0)).unwrap();
    g.add_momentum((1.0, 6.0, 9.0)).unwrap();
    g.add_momentum((-1.0, 9.0, 12.0)).unwrap();

    assert_points_close(
        &points(&g),
        &[
            (0.0, 5.0),
            (2.5, 7.5),
            (3.0, 7.0),
            (4.0, 6.0),
            (5.5, 4.5),
            (6.0, 5.0),
            (8.0, 7.0),
            (9.0, 7.0),
            (12.0, 4.0),
        ],
    );
}

#[test]
fn invalidation_propagates_through_a_limit_gauge_chain() {
    let ceiling = Gauge::bounded(10.0, 1000.0, Some(0.0));
    let g = Gauge::new(0.0, ceiling.clone(), 0.0, Some(0.0));
    g.add_momentum(5.0).unwrap();
    assert_relative_eq!(g.get(Some(1.0)), 5.0);
    assert_relative_eq!(g.get(Some(3.0)), 10.0);

    ceiling.set(20.0, Outbound::Ok, Some(0.0)).unwrap();
    assert_relative_eq!(g.get(Some(1.0)), 5.0);
    assert_relative_eq!(g.get(Some(4.0)), 20.0);
}
