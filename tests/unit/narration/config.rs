use super::*;

fn config(raw: &str) -> NarrationConfig {
    serde_json::from_str(raw).unwrap()
}

#[test]
fn parses_camel_case_fields() {
    let c = config(
        r#"{"engine": "elevenlabs", "apiKey": "k", "region": "westeurope",
            "voices": {"female1": "abc123"}, "defaultVoice": "xyz"}"#,
    );
    assert_eq!(c.api_key(), Some("k"));
    assert_eq!(c.region.as_deref(), Some("westeurope"));
    assert_eq!(c.resolve_voice("female1"), "abc123");
    assert_eq!(c.resolve_voice("default"), "xyz");
    assert_eq!(c.resolve_voice("other"), "other");
}

#[test]
fn auto_selection_follows_config() {
    let cases = [
        (r#"{"engine": "elevenlabs", "apiKey": "k"}"#, Engine::ElevenLabs),
        (r#"{"engine": "elevenlabs"}"#, Engine::Sag),
        (r#"{"engine": "elevenlabs", "apiKey": "  "}"#, Engine::Sag),
        (r#"{"engine": "azure", "apiKey": "k"}"#, Engine::Azure),
        (r#"{"engine": "azure"}"#, Engine::Sag),
        (r#"{"engine": "google"}"#, Engine::Google),
        (r#"{}"#, Engine::Sag),
    ];
    for (raw, expected) in cases {
        assert_eq!(Engine::Auto.select(&config(raw)), expected, "{raw}");
    }
}

#[test]
fn explicit_engine_wins() {
    let c = config(r#"{"engine": "google"}"#);
    assert_eq!(Engine::Azure.select(&c), Engine::Azure);
}

#[test]
fn engine_names_round_trip() {
    for e in [Engine::Auto, Engine::ElevenLabs, Engine::Google, Engine::Azure, Engine::Sag] {
        assert_eq!(e.to_string().parse::<Engine>().unwrap(), e);
    }
    assert!(matches!("polly".parse::<Engine>(), Err(ReelError::Configuration(_))));
}

#[test]
fn missing_file_loads_as_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    assert_eq!(NarrationConfig::load_or_default(&path).unwrap(), NarrationConfig::default());

    std::fs::write(&path, "{not json").unwrap();
    assert!(matches!(
        NarrationConfig::load_or_default(&path),
        Err(ReelError::Configuration(_))
    ));

    std::fs::write(&path, r#"{"engine": "google"}"#).unwrap();
    assert_eq!(NarrationConfig::load(&path).unwrap().engine.as_deref(), Some("google"));
}
