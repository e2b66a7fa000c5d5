use super::*;

#[test]
fn request_validation_bounds_speed() {
    assert!(NarrationRequest::new("hi").validate().is_ok());
    assert!(NarrationRequest::new("hi").with_speed(0.5).validate().is_ok());
    assert!(NarrationRequest::new("hi").with_speed(2.0).validate().is_ok());
    assert!(NarrationRequest::new("hi").with_speed(0.49).validate().is_err());
    assert!(NarrationRequest::new("hi").with_speed(2.5).validate().is_err());
    assert!(NarrationRequest::new("hi").with_speed(f64::NAN).validate().is_err());
    assert!(NarrationRequest::new("   ").validate().is_err());
}

#[test]
fn missing_credentials_become_configuration_errors() {
    let err: ReelError = NarrationError::MissingCredentials {
        backend: "elevenlabs",
        credential: "apiKey",
    }
    .into();
    assert!(matches!(err, ReelError::Configuration(_)));
    assert!(err.to_string().contains("apiKey"));

    let err: ReelError = NarrationError::UpstreamError {
        status: 401,
        message: "bad key".into(),
    }
    .into();
    assert!(err.cause().contains("401"));
}

#[test]
fn backend_selection() {
    let mut config = NarrationConfig::default();
    assert_eq!(backend_for(Engine::Auto, &config).name(), "sag");
    assert_eq!(backend_for(Engine::Google, &config).name(), "google");
    config.engine = Some("azure".into());
    config.api_key = Some("k".into());
    assert_eq!(backend_for(Engine::Auto, &config).name(), "azure");
    assert_eq!(backend_for(Engine::ElevenLabs, &config).name(), "elevenlabs");
}

#[test]
fn elevenlabs_without_key_fails_before_any_request() {
    let backend = backend_for(Engine::ElevenLabs, &NarrationConfig::default());
    let dir = tempfile::tempdir().unwrap();
    let err = backend
        .synthesize(&NarrationRequest::new("hello"), &dir.path().join("a.mp3"), None)
        .unwrap_err();
    assert!(matches!(err, NarrationError::MissingCredentials { credential: "apiKey", .. }));
}
