use std::path;

use super::parse_temperature;
use super::validate_temperature;
use super::ChatSettings;
use crate::domain::models::AppError;
use crate::domain::models::BackendName;

fn settings() -> ChatSettings {
    return ChatSettings {
        backend: BackendName::OpenAI,
        model: "gpt-4".to_string(),
        temperature: 0.5,
        api_key: "abc".to_string(),
        backend_url: "https://api.openai.com".to_string(),
        history_dir: path::PathBuf::from("/tmp/parley"),
        preset: None,
    };
}

#[test]
fn it_accepts_boundary_temperatures() {
    assert_eq!(parse_temperature("0").unwrap(), 0.0);
    assert_eq!(parse_temperature("1").unwrap(), 1.0);
    assert_eq!(parse_temperature(" 0.7 ").unwrap(), 0.7);
}

#[test]
fn it_rejects_out_of_range_temperatures() {
    for value in ["-0.1", "1.01", "2", "-1"] {
        let res = parse_temperature(value);
        assert!(matches!(res, Err(AppError::Input(_))), "{value} was accepted");
    }
}

#[test]
fn it_rejects_non_numeric_temperatures() {
    let res = parse_temperature("warm");
    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Temperature must be a number");
}

#[test]
fn it_rejects_nan() {
    assert!(validate_temperature(f64::NAN).is_err());
}

#[test]
fn it_validates_settings() {
    assert!(settings().validate().is_ok());
}

#[test]
fn it_requires_an_api_key() {
    let mut s = settings();
    s.api_key = "".to_string();

    let res = s.validate();
    assert!(matches!(
        res,
        Err(AppError::Authentication {
            backend: BackendName::OpenAI
        })
    ));
}

#[test]
fn it_requires_a_temperature_in_range() {
    let mut s = settings();
    s.temperature = 1.5;

    assert!(matches!(s.validate(), Err(AppError::Input(_))));
}
