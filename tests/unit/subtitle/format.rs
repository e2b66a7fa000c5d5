use super::*;

fn cues() -> Vec<CaptionCue> {
    vec![
        CaptionCue { start_ms: 0, end_ms: 1000, text: "Intro".into(), kind: CueKind::Title },
        CaptionCue { start_ms: 1000, end_ms: 3_723_456, text: "Hello {there}".into(), kind: CueKind::Narration },
    ]
}

#[test]
fn srt_blocks_are_numbered_with_comma_millis() {
    let out = serialize(&cues(), SubtitleFormat::Srt);
    assert_eq!(
        out,
        "1\n00:00:00,000 --> 00:00:01,000\nIntro\n\n2\n00:00:01,000 --> 01:02:03,456\nHello {there}\n\n"
    );
    assert!(!out.contains("WEBVTT"));
}

#[test]
fn vtt_has_header_and_dot_millis() {
    let out = serialize(&cues(), SubtitleFormat::Vtt);
    assert!(out.starts_with("WEBVTT\n\n"));
    assert!(out.contains("00:00:01.000 --> 01:02:03.456\nHello {there}\n"));
}

#[test]
fn ass_uses_centiseconds_and_styles() {
    let out = serialize(&cues(), SubtitleFormat::Ass);
    assert!(out.starts_with("[Script Info]"));
    assert!(out.contains("[V4+ Styles]"));
    assert!(out.contains("Dialogue: 0,0:00:00.00,0:00:01.00,Title,,0,0,0,,Intro\n"));
    assert!(out.contains("Dialogue: 0,0:00:01.00,1:02:03.45,Default,,0,0,0,,Hello \\{there\\}\n"));
}

#[test]
fn format_names_parse_and_fall_back() {
    assert_eq!("SRT".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Srt);
    assert_eq!("webvtt".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Vtt);
    assert!("sub".parse::<SubtitleFormat>().is_err());
    assert_eq!(SubtitleFormat::parse_lenient("sub"), SubtitleFormat::Srt);
    assert_eq!(SubtitleFormat::parse_lenient("ass"), SubtitleFormat::Ass);
    assert_eq!(
        SubtitleFormat::from_path(Path::new("out/captions.vtt")),
        Some(SubtitleFormat::Vtt)
    );
    assert_eq!(SubtitleFormat::from_path(Path::new("captions")), None);
}

#[test]
fn empty_track_is_still_valid() {
    assert_eq!(serialize(&[], SubtitleFormat::Srt), "");
    assert_eq!(serialize(&[], SubtitleFormat::Vtt), "WEBVTT\n\n");
}

#[test]
fn write_subtitles_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subs/out.srt");
    write_subtitles(&path, &cues(), SubtitleFormat::Srt).unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().starts_with("1\n"));
}
