use super::*;

fn fps30() -> Fps {
    Fps::whole(30).unwrap()
}

#[test]
fn starts_at_rest_and_ignores_negative_time() {
    let s = Spring::new(1.0, 100.0, 15.0);
    assert_eq!(s.sample_secs(0.0), 0.0);
    assert_eq!(s.sample_secs(-1.0), 0.0);
    assert_eq!(s.sample_frame(-12, fps30()), 0.0);
    assert_eq!(s.sample_frame(0, fps30()), 0.0);
}

#[test]
fn settles_at_target_for_every_regime() {
    for damping in [10.0, 15.0, 20.0, 40.0] {
        let s = Spring::new(1.0, 100.0, damping);
        let v = s.sample_secs(10.0);
        assert!((v - 1.0).abs() < 1e-6, "damping {damping}: {v}");
    }
}

#[test]
fn critical_and_overdamped_never_overshoot() {
    for damping in [20.0, 30.0, 60.0] {
        let s = Spring::new(1.0, 100.0, damping);
        let mut prev = 0.0;
        for f in 1..120 {
            let v = s.sample_frame(f, fps30());
            assert!(v <= 1.0 + 1e-12);
            assert!(v >= prev - 1e-12);
            prev = v;
        }
    }
}

#[test]
fn regimes_agree_near_critical() {
    let below = Spring::new(1.0, 100.0, 20.0 - 1e-4).sample_secs(0.2);
    let at = Spring::new(1.0, 100.0, 20.0).sample_secs(0.2);
    let above = Spring::new(1.0, 100.0, 20.0 + 1e-4).sample_secs(0.2);
    assert!((below - at).abs() < 1e-3);
    assert!((above - at).abs() < 1e-3);
}

#[test]
fn never_negative() {
    let s = Spring::new(1.0, 200.0, 10.0);
    for f in 0..300 {
        assert!(s.sample_frame(f, fps30()) >= 0.0);
    }
}

#[test]
fn validate_enforces_minimums() {
    assert!(Spring::default().validate().is_ok());
    assert!(Spring::new(1.0, 99.0, 15.0).validate().is_err());
    assert!(Spring::new(1.0, 100.0, 5.0).validate().is_err());
    assert!(Spring::new(0.0, 100.0, 15.0).validate().is_err());
    assert!(Spring::new(1.0, f64::NAN, 15.0).validate().is_err());
}

#[test]
fn deterministic() {
    let s = Spring::new(1.0, 200.0, 15.0);
    assert_eq!(s.sample_frame(7, fps30()), s.sample_frame(7, fps30()));
}
