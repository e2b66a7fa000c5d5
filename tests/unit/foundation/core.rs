use super::*;

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
}

#[test]
fn five_seconds_at_thirty_is_exact() {
    let fps = Fps::whole(30).unwrap();
    assert_eq!(fps.secs_to_frames_floor(5.0), 150);
    assert_eq!(fps.secs_to_frames_floor(2.99), 89);
}

#[test]
fn canvas_parses_resolution_strings() {
    let c: Canvas = "1280x720".parse().unwrap();
    assert_eq!(c, Canvas::new(1280, 720).unwrap());
    assert_eq!("640X480".parse::<Canvas>().unwrap().height, 480);
    assert!("1920".parse::<Canvas>().is_err());
    assert!("0x1080".parse::<Canvas>().is_err());
    assert!("axb".parse::<Canvas>().is_err());
}
