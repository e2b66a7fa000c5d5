use super::*;
use crate::foundation::core::Point;
use crate::script::model::Script;

fn fps30() -> Fps {
    Fps::whole(30).unwrap()
}

fn scene_with(elements: &str, seconds: f64) -> Script {
    Script::parse(&format!(
        r#"{{"scenes": [{{"durationSeconds": {seconds}, "elements": {elements}}}]}}"#
    ))
    .unwrap()
}

const THREE_SHAPES: &str = r#"[
    {"type": "rectangle", "x": 10, "y": 20},
    {"type": "circle", "x": 300, "y": 300, "radius": 40},
    {"type": "text", "x": 0, "y": 0, "content": "hello"}
]"#;

#[test]
fn total_frames_is_exact() {
    let script = scene_with("[]", 5.0);
    let sched = compile_scene(&script.scenes[0], fps30(), &TimelineOptions::default()).unwrap();
    assert_eq!(sched.total_frames(), 150);
    assert_eq!(sched.sample_range().count(), 150);
}

#[test]
fn total_frames_truncates_partial_frames() {
    for (secs, expected) in [(1.0, 30), (1.01, 30), (2.999, 89), (0.02, 0)] {
        let script = scene_with("[]", secs);
        let sched =
            compile_scene(&script.scenes[0], fps30(), &TimelineOptions::default()).unwrap();
        assert_eq!(sched.total_frames(), expected, "{secs}s");
    }
}

#[test]
fn opacity_is_clamped_and_settles_at_one() {
    let script = scene_with(THREE_SHAPES, 5.0);
    let sched = compile_scene(&script.scenes[0], fps30(), &TimelineOptions::default()).unwrap();

    let settled = sched.settled_opacity_frame();
    assert_eq!(settled, 30);
    for state in sched.sample_range() {
        assert!((0.0..=1.0).contains(&state.scene.opacity));
        for el in &state.elements {
            assert!((0.0..=1.0).contains(&el.state.opacity));
            assert!(el.state.scale >= 0.0);
        }
        if state.frame.0 >= settled {
            assert_eq!(state.scene.opacity, 1.0);
            assert!(state.elements.iter().all(|e| e.state.opacity == 1.0));
        }
    }
}

#[test]
fn delayed_element_is_invisible_before_its_delay() {
    let script = scene_with(THREE_SHAPES, 5.0);
    let sched = compile_scene(&script.scenes[0], fps30(), &TimelineOptions::default()).unwrap();

    assert_eq!(sched.element_delay(2), 10);
    for f in 0..=10 {
        let st = sched.element_state(2, FrameIndex(f)).unwrap();
        assert_eq!(st.opacity, 0.0);
        assert_eq!(st.scale, 0.0);
    }
    let after = sched.element_state(2, FrameIndex(11)).unwrap();
    assert!(after.opacity > 0.0);
    assert!(after.scale > 0.0);
}

#[test]
fn transform_uses_floored_scale_about_center() {
    let script = scene_with(THREE_SHAPES, 5.0);
    let sched = compile_scene(&script.scenes[0], fps30(), &TimelineOptions::default()).unwrap();

    // Rectangle at (10, 20) with default 150x100 has its center at (85, 70).
    let a = sched.element_transform(0, FrameIndex(0)).unwrap();
    let c = a.as_coeffs();
    assert!((c[0] - 0.1).abs() < 1e-12);
    assert!((c[3] - 0.1).abs() < 1e-12);
    let center = a * Point::new(85.0, 70.0);
    assert!((center.x - 85.0).abs() < 1e-9);
    assert!((center.y - 70.0).abs() < 1e-9);
}

#[test]
fn unknown_elements_animate_but_have_no_transform() {
    let script = scene_with(r#"[{"type": "sparkle", "x": 1}]"#, 2.0);
    let sched = compile_scene(&script.scenes[0], fps30(), &TimelineOptions::default()).unwrap();
    let state = sched.state_at(FrameIndex(40));
    assert_eq!(state.elements.len(), 1);
    assert_eq!(state.elements[0].kind, "sparkle");
    assert!(state.elements[0].transform.is_none());
    assert!(sched.element_transform(0, FrameIndex(40)).is_none());
}

#[test]
fn out_of_range_element_is_none() {
    let script = scene_with("[]", 1.0);
    let sched = compile_scene(&script.scenes[0], fps30(), &TimelineOptions::default()).unwrap();
    assert!(sched.element_state(0, FrameIndex(0)).is_none());
}

#[test]
fn whiteboard_preset_staggers_by_ten() {
    let script = scene_with(THREE_SHAPES, 5.0);
    let opts = TimelineOptions::whiteboard();
    let sched = compile_scene(&script.scenes[0], fps30(), &opts).unwrap();
    assert_eq!(sched.element_delay(1), 10);
    assert_eq!(sched.element_delay(2), 20);
    assert_eq!(sched.settled_opacity_frame(), 40);
    assert_eq!(sched.options().element_spring.stiffness, 200.0);
}

#[test]
fn sampling_is_deterministic() {
    let script = scene_with(THREE_SHAPES, 3.0);
    let opts = TimelineOptions::default().with_stagger(7);
    let a: Vec<FrameState> = compile_scene(&script.scenes[0], fps30(), &opts)
        .unwrap()
        .sample_range()
        .collect();
    let b: Vec<FrameState> = compile_scene(&script.scenes[0], fps30(), &opts)
        .unwrap()
        .sample_range()
        .collect();
    assert_eq!(a, b);
}

#[test]
fn rejects_springs_below_minimums() {
    let script = scene_with("[]", 1.0);
    let mut opts = TimelineOptions::default();
    opts.element_spring = Spring::new(1.0, 50.0, 15.0);
    let err = compile_scene(&script.scenes[0], fps30(), &opts).unwrap_err();
    assert!(matches!(err, ReelError::Compilation(_)));

    let mut opts = TimelineOptions::default();
    opts.min_scale = 0.0;
    assert!(compile_scene(&script.scenes[0], fps30(), &opts).is_err());
}

#[test]
fn frame_state_serializes_flat() {
    let script = scene_with(r#"[{"type": "circle"}]"#, 1.0);
    let sched = compile_scene(&script.scenes[0], fps30(), &TimelineOptions::default()).unwrap();
    let v = serde_json::to_value(sched.state_at(FrameIndex(15))).unwrap();
    assert_eq!(v["frame"], 15);
    assert!(v["elements"][0]["opacity"].is_number());
    assert!(v["elements"][0]["scale"].is_number());
    assert_eq!(v["elements"][0]["transform"].as_array().unwrap().len(), 6);
}
