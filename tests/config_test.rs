// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证排课配置读取及其对自动排课的影响
// ==========================================


use timetable_scheduler::api::ApiError;
use timetable_scheduler::config::{config_keys, ConfigManager, SchedulerConfigReader};
use timetable_scheduler::domain::SubjectType;
use timetable_scheduler::engine::{GenerationRequest, GeneratorConfig, SubjectSelection};
use timetable_scheduler::PositionStrategy;
use test_helpers::{add_subject, add_teacher, create_test_db, setup_app};

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[test]
fn test_defaults_on_fresh_database() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();

    let config = GeneratorConfig::load(&config_manager).unwrap();
    assert_eq!(config, GeneratorConfig::default());
    assert_eq!(config.strategy, PositionStrategy::FirstFit);
    assert!(config_manager.get_validate_generated_before_commit().unwrap());
}

#[test]
fn test_generator_config_follows_stored_values() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();

    config_manager
        .set_global_config_value(config_keys::POSITION_STRATEGY, "best_score")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::MAX_SEARCH_NODES, "5000")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::SEARCH_TIME_LIMIT_MS, "0")
        .unwrap();

    let config = GeneratorConfig::load(&config_manager).unwrap();
    assert_eq!(config.strategy, PositionStrategy::BestScore);
    assert_eq!(config.max_search_nodes, 5000);
    assert_eq!(config.time_limit_ms, 0);

    let snapshot: serde_json::Value =
        serde_json::from_str(&config_manager.get_config_snapshot().unwrap()).unwrap();
    assert_eq!(snapshot[config_keys::POSITION_STRATEGY], "best_score");
}

#[test]
fn test_values_survive_reopen() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    {
        let config_manager = ConfigManager::new(&db_path).unwrap();
        config_manager
            .set_global_config_value(config_keys::VALIDATE_GENERATED, "no")
            .unwrap();
    }

    let reopened = ConfigManager::new(&db_path).unwrap();
    assert!(!reopened.get_validate_generated_before_commit().unwrap());
}

#[test]
fn test_node_budget_applies_to_next_generation() {
    let (_temp_file, state) = setup_app();
    let teacher = add_teacher(&state, "Ada", 30).id;
    let subject = add_subject(&state, "Compilers", 3, SubjectType::Theory, &[&teacher]).id;

    let request = GenerationRequest {
        semester: 3,
        department: "CSE".to_string(),
        section: "A".to_string(),
        cluster: None,
        selections: vec![SubjectSelection::new(&subject, &[&teacher])],
    };

    assert!(state.timetable_api.generate_timetable(&request).is_ok());

    // 配置在每次请求时读取，无需重启
    state
        .config_manager
        .set_global_config_value(config_keys::MAX_SEARCH_NODES, "1")
        .unwrap();

    let err = state.timetable_api.generate_timetable(&request).unwrap_err();
    match err {
        ApiError::Infeasible(msg) => assert!(msg.contains("预算")),
        other => panic!("Expected Infeasible, got {:?}", other),
    }
}
