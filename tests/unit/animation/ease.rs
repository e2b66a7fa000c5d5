use super::*;

const ALL: [Ease; 7] = [
    Ease::Linear,
    Ease::InQuad,
    Ease::OutQuad,
    Ease::InOutQuad,
    Ease::InCubic,
    Ease::OutCubic,
    Ease::InOutCubic,
];

#[test]
fn endpoints_are_stable() {
    for ease in ALL {
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
    }
}

#[test]
fn monotonic_spot_check() {
    for ease in ALL {
        let a = ease.apply(0.25);
        let b = ease.apply(0.5);
        let c = ease.apply(0.75);
        assert!(a < b);
        assert!(b < c);
    }
}

#[test]
fn ramp_clamps_on_both_sides() {
    let ramp = Ramp::new(10, 20, Ease::Linear);
    assert_eq!(ramp.sample(0), 0.0);
    assert_eq!(ramp.sample(10), 0.0);
    assert_eq!(ramp.sample(20), 0.5);
    assert_eq!(ramp.sample(30), 1.0);
    assert_eq!(ramp.sample(10_000), 1.0);
}

#[test]
fn zero_length_ramp_is_a_step() {
    let ramp = Ramp::new(5, 0, Ease::Linear);
    assert_eq!(ramp.sample(4), 0.0);
    assert_eq!(ramp.sample(5), 1.0);
    assert_eq!(ramp.sample(6), 1.0);
}
