use super::*;

fn parse(raw: &str) -> Script {
    Script::parse(raw).unwrap()
}

fn assert_well_formed(cues: &[CaptionCue]) {
    for cue in cues {
        assert!(cue.start_ms < cue.end_ms, "{cue:?}");
    }
    for pair in cues.windows(2) {
        assert!(pair[0].start_ms <= pair[1].start_ms);
        assert!(pair[0].end_ms <= pair[1].start_ms, "{pair:?}");
    }
}

#[test]
fn chunking_is_greedy_and_bounded() {
    let chunks = chunk_words("the quick brown fox jumps over the lazy dog again", 30);
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["the quick brown fox jumps over", "the lazy dog again"]);
    assert_eq!(chunks[0].words, 6);
    assert!(chunks.iter().all(|c| c.text.chars().count() <= 30));
}

#[test]
fn oversize_word_stands_alone() {
    let long = "a".repeat(45);
    let chunks = chunk_words(&format!("hi {long} there"), 30);
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["hi", long.as_str(), "there"]);
}

#[test]
fn chunking_ignores_extra_whitespace() {
    assert!(chunk_words("   \n\t ", 30).is_empty());
    let chunks = chunk_words("  one\n two  ", 30);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "one two");
}

#[test]
fn scene_without_narration_is_one_title_cue() {
    let s = parse(r#"{"scenes": [{"title": "Intro", "durationSeconds": 3}, {"durationSeconds": 2}]}"#);
    let cues = compile_script(&s, &SubtitleOptions::default());
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0], CaptionCue { start_ms: 0, end_ms: 3000, text: "Intro".into(), kind: CueKind::Title });
    assert_eq!(cues[1].start_ms, 3000);
    assert_eq!(cues[1].end_ms, 5000);
    assert_eq!(cues[1].text, "Scene 2");
}

#[test]
fn narration_covers_scene_to_the_end() {
    let s = parse(
        r#"{"scenes": [
            {"durationSeconds": 4, "voiceover": "one two three four five six seven eight nine ten eleven twelve"},
            {"durationSeconds": 6, "voiceover": "short line"}
        ]}"#,
    );
    let cues = compile_script(&s, &SubtitleOptions::default());
    assert_well_formed(&cues);

    // Scene 1: three chunks, so the title slot is min(1000, 4000 / 4).
    assert_eq!(cues[0].kind, CueKind::Title);
    assert_eq!(cues[0].end_ms, 1000);
    let scene1: Vec<&CaptionCue> = cues.iter().filter(|c| c.end_ms <= 4000).collect();
    assert_eq!(scene1.last().unwrap().end_ms, 4000);

    let last = cues.last().unwrap();
    assert_eq!(last.kind, CueKind::Narration);
    assert_eq!(last.end_ms, 10_000);
    assert_eq!(last.text, "short line");
}

#[test]
fn narration_times_are_word_proportional() {
    // 30-char chunks: "aaaa bbbb cccc dddd eeee ffff" (6 words), "gg" (1 word).
    let s = parse(
        r#"{"scenes": [{"durationSeconds": 8, "voiceover": "aaaa bbbb cccc dddd eeee ffff gg"}]}"#,
    );
    let cues = compile_script(&s, &SubtitleOptions::default());
    assert_eq!(cues.len(), 3);
    // Title slot 1000ms, narration span 7000ms split 6:1.
    assert_eq!(cues[1].start_ms, 1000);
    assert_eq!(cues[1].end_ms, 7000);
    assert_eq!(cues[2].start_ms, 7000);
    assert_eq!(cues[2].end_ms, 8000);
}

#[test]
fn short_scene_title_slot_shrinks() {
    let s = parse(r#"{"scenes": [{"durationSeconds": 1.5, "voiceover": "hello"}]}"#);
    let cues = compile_script(&s, &SubtitleOptions::default());
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].end_ms, 750);
    assert_eq!(cues[1].start_ms, 750);
    assert_eq!(cues[1].end_ms, 1500);
}

#[test]
fn titles_can_be_excluded() {
    let s = parse(
        r#"{"scenes": [{"durationSeconds": 2}, {"durationSeconds": 2, "narration": "just words"}]}"#,
    );
    let opts = SubtitleOptions { include_titles: false, ..SubtitleOptions::default() };
    let cues = compile_script(&s, &opts);
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].start_ms, 2000);
    assert_eq!(cues[0].end_ms, 4000);
    assert_eq!(cues[0].kind, CueKind::Narration);
}

#[test]
fn tiny_shares_merge_without_losing_text() {
    let words: Vec<String> = (0..40).map(|i| format!("w{i:02}xxxxxxxxxxxxxxxxxxxxxxxx")).collect();
    let s = Script::from_value(serde_json::json!({
        "scenes": [{"durationSeconds": 0.02, "voiceover": words.join(" ")}]
    }))
    .unwrap();
    let cues = compile_scene(&s.scenes[0], 0, 20, &SubtitleOptions::default());
    assert_well_formed(&cues);
    let spoken: Vec<&str> = cues
        .iter()
        .filter(|c| c.kind == CueKind::Narration)
        .flat_map(|c| c.text.split(' '))
        .collect();
    assert_eq!(spoken, words.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(cues.last().unwrap().end_ms, 20);
}

#[test]
fn zero_span_scene_is_skipped() {
    let s = parse(r#"{"scenes": [{"durationSeconds": 0.0001}, {"durationSeconds": 1}]}"#);
    let cues = compile_script(&s, &SubtitleOptions::default());
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "Scene 2");
}

#[test]
fn sub_millisecond_scene_narration_joins_next_cue() {
    let s = parse(
        r#"{"scenes": [
        {"durationSeconds": 0.0004, "voiceover": "blink and miss"},
        {"title": "Main", "durationSeconds": 2, "voiceover": "hello world"}
    ]}"#,
    );
    let cues = compile_script(&s, &SubtitleOptions::default());
    assert_well_formed(&cues);
    let narration: Vec<&str> = cues
        .iter()
        .filter(|c| c.kind == CueKind::Narration)
        .map(|c| c.text.as_str())
        .collect();
    assert_eq!(narration, ["blink and miss hello world"]);
    assert_eq!(cues[0].text, "Main");
}

#[test]
fn trailing_sub_millisecond_scene_extends_last_cue() {
    let s = parse(
        r#"{"scenes": [
        {"durationSeconds": 2, "voiceover": "hello"},
        {"durationSeconds": 0.0004, "voiceover": "final  words"}
    ]}"#,
    );
    let cues = compile_script(&s, &SubtitleOptions::default());
    assert_eq!(cues.last().unwrap().text, "hello final words");
    assert_eq!(cues.last().unwrap().end_ms, 2000);
}

#[test]
fn multiline_title_is_flattened() {
    let s = parse(r#"{"scenes": [{"title": "Big\n  idea", "durationSeconds": 1}]}"#);
    let cues = compile_script(&s, &SubtitleOptions::default());
    assert_eq!(cues[0].text, "Big idea");
}
