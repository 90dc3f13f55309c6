use super::*;
use crate::element::MatchOutcome;
use crate::scoring::{EloSystem, GaussianSystem, Rating, ELO_SIGMA};

fn played_elo_engine() -> TestingEngine {
    let mut engine = TestingEngine::new(Box::new(EloSystem::default()));
    for name in ["goblin", "knight", "wizard", "dragon"] {
        engine.add_element(name).unwrap();
    }
    engine.record_match("dragon", "goblin").unwrap();
    engine.record_match("wizard", "knight").unwrap();
    engine.record_match("dragon", "wizard").unwrap();
    engine.record_match("knight", "goblin").unwrap();
    engine
}

fn snapshot(engine: &TestingEngine) -> Vec<(String, f64)> {
    engine
        .get_rankings()
        .into_iter()
        .map(|e| (e.name().to_string(), e.rating().mu()))
        .collect()
}

#[test]
fn test_save_state_shape() {
    let engine = played_elo_engine();
    let json = engine.save_state().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["version"], 1);
    assert_eq!(value["backend"], "elo");
    let dragon = &value["elements"]["dragon"];
    assert_eq!(dragon["id"], engine.get("dragon").unwrap().id());
    assert_eq!(dragon["sigma"], ELO_SIGMA);
    assert_eq!(dragon["history"][0]["result"], "win");
    assert_eq!(
        dragon["history"][0]["opponent_id"],
        engine.get("goblin").unwrap().id()
    );
}

#[test]
fn test_json_keeps_insertion_order() {
    let engine = played_elo_engine();
    let json = engine.save_state().to_json().unwrap();

    let positions: Vec<usize> = ["goblin", "knight", "wizard", "dragon"]
        .iter()
        .map(|name| json.find(&format!("\"{name}\"")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    let record = StateRecord::from_json(&json).unwrap();
    let names: Vec<&str> = record.elements.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["goblin", "knight", "wizard", "dragon"]);
}

#[test]
fn test_round_trip_reproduces_rankings() {
    let engine = played_elo_engine();
    let json = engine.save_state().to_json().unwrap();

    let record = StateRecord::from_json(&json).unwrap();
    let restored = TestingEngine::from_state(&record, Box::new(EloSystem::default())).unwrap();

    assert_eq!(snapshot(&restored), snapshot(&engine));
    for original in engine.elements() {
        let copy = restored.get(original.name()).unwrap();
        assert_eq!(copy.id(), original.id());
        assert_eq!(copy.history(), original.history());
    }
}

#[test]
fn test_round_trip_keeps_tied_order() {
    let mut engine = TestingEngine::new(Box::new(EloSystem::default()));
    for name in ["zeta", "alpha", "mid"] {
        engine.add_element(name).unwrap();
    }
    let record = StateRecord::from_json(&engine.save_state().to_json().unwrap()).unwrap();
    let restored = TestingEngine::from_state(&record, Box::new(EloSystem::default())).unwrap();
    assert_eq!(restored.ranked_names(), vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_gaussian_round_trip_restores_sigma() {
    let mut engine = TestingEngine::new(Box::new(GaussianSystem::default()));
    engine.add_element("a").unwrap();
    engine.add_element("b").unwrap();
    for _ in 0..5 {
        engine.record_match("a", "b").unwrap();
    }

    let record = StateRecord::from_json(&engine.save_state().to_json().unwrap()).unwrap();
    let mut restored = TestingEngine::new(Box::new(GaussianSystem::default()));
    let summary = restored.load_state(&record).unwrap();

    assert_eq!(summary.restored, 2);
    assert!(summary.warnings.is_empty());
    for name in ["a", "b"] {
        assert_eq!(restored.get(name).unwrap().rating(), engine.get(name).unwrap().rating());
    }
}

#[test]
fn test_read_only_sigma_is_tolerated() {
    let json = r#"{
        "elements": {
            "a": { "id": "id-a", "mu": 27.5, "sigma": 3.1, "history": [] },
            "b": { "id": "id-b", "mu": 1510.0, "sigma": 200.0, "history": [] }
        }
    }"#;
    let record = StateRecord::from_json(json).unwrap();
    assert_eq!(record.version, STATE_VERSION);
    assert_eq!(record.backend, None);

    let mut engine = TestingEngine::new(Box::new(EloSystem::default()));
    let summary = engine.load_state(&record).unwrap();

    assert_eq!(summary.restored, 2);
    assert_eq!(summary.warnings.len(), 1);
    assert!(matches!(summary.warnings[0], AbTestError::BackendMismatch(_)));
    assert_eq!(engine.get("a").unwrap().rating(), &Rating::Elo { mu: 27.5 });
}

#[test]
fn test_backend_label_mismatch_is_advisory() {
    let mut gaussian = TestingEngine::new(Box::new(GaussianSystem::default()));
    gaussian.add_element("a").unwrap();
    let record = gaussian.save_state();

    let mut elo = TestingEngine::new(Box::new(EloSystem::default()));
    let summary = elo.load_state(&record).unwrap();
    // label plus read-only sigma
    assert_eq!(summary.warnings.len(), 2);
    assert_eq!(elo.len(), 1);
}

#[test]
fn test_history_restored_verbatim() {
    let json = r#"{
        "elements": {
            "a": { "id": "1", "mu": 1516.0, "sigma": 200.0,
                   "history": [ { "opponent_id": "2", "result": "win" } ] },
            "b": { "id": "2", "mu": 1484.0, "sigma": 200.0,
                   "history": [ { "opponent_id": "1", "result": "loss" } ] }
        }
    }"#;
    let record = StateRecord::from_json(json).unwrap();
    let engine = TestingEngine::from_state(&record, Box::new(EloSystem::default())).unwrap();

    let b = engine.get("b").unwrap();
    assert_eq!(b.id(), "2");
    assert_eq!(b.history().len(), 1);
    assert_eq!(b.history()[0].opponent_id, "1");
    assert_eq!(b.history()[0].result, MatchOutcome::Loss);
    assert_eq!(engine.match_count(), 1);
}

#[test]
fn test_missing_fields_are_incompatible() {
    let missing_sigma = r#"{ "elements": { "a": { "id": "1", "mu": 1500.0, "history": [] } } }"#;
    assert!(matches!(
        StateRecord::from_json(missing_sigma),
        Err(AbTestError::IncompatibleState(_))
    ));

    let no_elements = r#"{ "version": 1 }"#;
    assert!(matches!(
        StateRecord::from_json(no_elements),
        Err(AbTestError::IncompatibleState(_))
    ));

    let bad_result = r#"{ "elements": { "a": { "id": "1", "mu": 1.0, "sigma": 0.0,
        "history": [ { "opponent_id": "2", "result": "draw" } ] } } }"#;
    assert!(matches!(
        StateRecord::from_json(bad_result),
        Err(AbTestError::IncompatibleState(_))
    ));

    let duplicate_name = r#"{ "elements": {
        "a": { "id": "1", "mu": 1.0, "sigma": 0.0, "history": [] },
        "a": { "id": "2", "mu": 1.0, "sigma": 0.0, "history": [] } } }"#;
    assert!(matches!(
        StateRecord::from_json(duplicate_name),
        Err(AbTestError::IncompatibleState(_))
    ));
}

#[test]
fn test_from_value() {
    let value = serde_json::json!({
        "elements": { "a": { "id": "1", "mu": 1500.0, "sigma": 200.0, "history": [] } }
    });
    let record = StateRecord::from_value(value).unwrap();
    assert_eq!(record.get("a").unwrap().id, "1");

    let wrong = serde_json::json!({ "elements": [1, 2, 3] });
    assert!(matches!(
        StateRecord::from_value(wrong),
        Err(AbTestError::IncompatibleState(_))
    ));
}

#[test]
fn test_invalid_record_leaves_engine_untouched() {
    let mut engine = TestingEngine::new(Box::new(EloSystem::default()));
    engine.add_element("existing").unwrap();
    let existing_id = engine.get("existing").unwrap().id().to_string();

    let record = StateRecord {
        version: STATE_VERSION,
        backend: None,
        elements: vec![
            (
                "fresh".to_string(),
                ElementRecord { id: "x".to_string(), mu: 1500.0, sigma: 200.0, history: vec![] },
            ),
            (
                "clash".to_string(),
                ElementRecord { id: existing_id, mu: 1500.0, sigma: 200.0, history: vec![] },
            ),
        ],
    };
    assert!(matches!(
        engine.load_state(&record),
        Err(AbTestError::IncompatibleState(_))
    ));
    assert_eq!(engine.len(), 1);

    let record = StateRecord {
        elements: vec![(
            "existing".to_string(),
            ElementRecord { id: "y".to_string(), mu: 1500.0, sigma: 200.0, history: vec![] },
        )],
        ..record
    };
    assert!(matches!(
        engine.load_state(&record),
        Err(AbTestError::DuplicateElement(_))
    ));
    assert_eq!(engine.len(), 1);
}

#[test]
fn test_rejects_newer_version_and_non_finite() {
    let mut engine = TestingEngine::new(Box::new(EloSystem::default()));
    let newer = StateRecord { version: STATE_VERSION + 1, backend: None, elements: vec![] };
    assert!(matches!(
        engine.load_state(&newer),
        Err(AbTestError::IncompatibleState(_))
    ));

    let nan = StateRecord {
        version: STATE_VERSION,
        backend: None,
        elements: vec![(
            "a".to_string(),
            ElementRecord { id: "1".to_string(), mu: f64::NAN, sigma: 200.0, history: vec![] },
        )],
    };
    assert!(matches!(
        engine.load_state(&nan),
        Err(AbTestError::IncompatibleState(_))
    ));
    assert!(engine.is_empty());
}

#[test]
fn test_rejects_negative_sigma() {
    let mut engine = TestingEngine::new(Box::new(GaussianSystem::default()));
    let record = StateRecord {
        version: STATE_VERSION,
        backend: Some("gaussian".to_string()),
        elements: vec![
            (
                "a".to_string(),
                ElementRecord { id: "1".to_string(), mu: 25.0, sigma: 8.0, history: vec![] },
            ),
            (
                "b".to_string(),
                ElementRecord { id: "2".to_string(), mu: 25.0, sigma: -50.0, history: vec![] },
            ),
        ],
    };

    let err = engine.load_state(&record).unwrap_err();
    assert!(matches!(err, AbTestError::IncompatibleState(ref msg) if msg.contains("negative sigma")));
    assert!(engine.is_empty());
}

#[test]
fn test_zero_sigma_is_accepted() {
    let record = StateRecord {
        version: STATE_VERSION,
        backend: None,
        elements: vec![(
            "a".to_string(),
            ElementRecord { id: "1".to_string(), mu: 25.0, sigma: 0.0, history: vec![] },
        )],
    };
    let engine = TestingEngine::from_state(&record, Box::new(GaussianSystem::default())).unwrap();
    assert_eq!(engine.get("a").unwrap().rating().sigma(), 0.0);
}

#[test]
fn test_malformed_json_is_incompatible_state() {
    let err = StateRecord::from_json("{\"elements\": [1, 2]}").unwrap_err();
    assert!(matches!(err, AbTestError::IncompatibleState(_)));
}

#[test]
fn test_one_sided_history_still_counts() {
    let record = StateRecord {
        version: STATE_VERSION,
        backend: None,
        elements: vec![
            (
                "a".to_string(),
                ElementRecord {
                    id: "1".to_string(),
                    mu: 1516.0,
                    sigma: ELO_SIGMA,
                    history: vec![MatchRecord {
                        opponent_id: "2".to_string(),
                        result: MatchOutcome::Win,
                    }],
                },
            ),
            (
                "b".to_string(),
                ElementRecord { id: "2".to_string(), mu: 1484.0, sigma: ELO_SIGMA, history: vec![] },
            ),
        ],
    };
    let engine = TestingEngine::from_state(&record, Box::new(EloSystem::default())).unwrap();
    assert_eq!(engine.get("a").unwrap().match_count(), 1);
    assert_eq!(engine.match_count(), 1);
}

#[test]
fn test_file_round_trip() {
    let engine = played_elo_engine();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    engine.save_to_file(&path).unwrap();
    let restored = TestingEngine::load_from_file(&path, Box::new(EloSystem::default())).unwrap();
    assert_eq!(snapshot(&restored), snapshot(&engine));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = TestingEngine::load_from_file(dir.path().join("nope.json"), Box::new(EloSystem::default()));
    assert!(matches!(result, Err(AbTestError::Io(_))));
}

#[test]
fn test_json_errors_convert_to_serialization() {
    let source = serde_json::from_str::<u32>("not a number").unwrap_err();
    let err: AbTestError = source.into();
    assert!(matches!(err, AbTestError::Serialization(_)));
    assert!(err.to_string().starts_with("serialization error"));
}
