mod common;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use common::{FakeResources, Installation, RecordingInstaller, RecordingWatcher, CURRENT_VERSION};
use entity_hub::{
    ArtifactGenerator, EnvironmentConfig, GenerationError, GenerationOutcome, GenerationSettings,
};

fn generator(
    resources: Arc<FakeResources>,
    installer: Arc<RecordingInstaller>,
) -> ArtifactGenerator {
    let catalog = common::catalog(Arc::new(RecordingWatcher::default()));
    ArtifactGenerator::new(
        catalog.files().clone(),
        resources,
        installer,
        GenerationSettings {
            module_pool_size: 2,
            shutdown_wait: Duration::from_secs(5),
        },
    )
}

fn project() -> (TempDir, EnvironmentConfig) {
    let project = TempDir::new().unwrap();
    let env = common::environment(project.path(), CURRENT_VERSION);
    (project, env)
}

#[tokio::test]
async fn test_db_indexes_written_to_both_databases() {
    let (_project, env) = project();
    common::write_definition(&env, "orders", "orders");
    let resources = Arc::new(FakeResources::replying(&[r#"{"indexes":[]}"#]));
    let generator = generator(resources.clone(), Arc::new(RecordingInstaller::default()));

    let outcome = generator.save_db_indexes(&env).await;
    assert!(outcome.is_written());

    let dir = env.entity_database_dir();
    let final_db = std::fs::read_to_string(dir.join("final-database.json")).unwrap();
    let staging_db = std::fs::read_to_string(dir.join("staging-database.json")).unwrap();
    assert_eq!(final_db, r#"{"indexes":[]}"#);
    assert_eq!(final_db, staging_db);

    let calls = resources.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].resource, "db-configs");
    assert_eq!(calls[0].url, env.final_db.url);
    let posted = calls[0].body.as_array().unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0]["info"]["title"], "orders");
    // Structural document only
    assert!(posted[0].get("hubUi").is_none());
}

#[tokio::test]
async fn test_empty_index_response_leaves_existing_files() {
    let (_project, env) = project();
    common::write_definition(&env, "orders", "orders");
    let dir = env.entity_database_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("final-database.json"), "previous").unwrap();

    let resources = Arc::new(FakeResources::replying(&[]));
    let generator = generator(resources, Arc::new(RecordingInstaller::default()));

    let outcome = generator.save_db_indexes(&env).await;
    assert!(matches!(
        outcome,
        GenerationOutcome::Failed(GenerationError::EmptyResponse(ref resource)) if resource == "db-configs"
    ));
    assert_eq!(
        std::fs::read_to_string(dir.join("final-database.json")).unwrap(),
        "previous"
    );
    assert!(!dir.join("staging-database.json").exists());
}

#[tokio::test]
async fn test_remote_failure_is_reported() {
    let (_project, env) = project();
    common::write_definition(&env, "orders", "orders");
    let resources = Arc::new(FakeResources::failing("connection refused"));
    let generator = generator(resources, Arc::new(RecordingInstaller::default()));

    let outcome = generator.save_db_indexes(&env).await;
    match outcome {
        GenerationOutcome::Failed(GenerationError::Remote { resource, message }) => {
            assert_eq!(resource, "db-configs");
            assert!(message.contains("connection refused"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_search_options_skipped_without_entities() {
    let (_project, env) = project();
    let resources = Arc::new(FakeResources::replying(&["<options/>"]));
    let installer = Arc::new(RecordingInstaller::default());
    let generator = generator(resources.clone(), installer.clone());

    let outcome = generator.save_search_options(&env).await;
    assert!(matches!(outcome, GenerationOutcome::Skipped));
    assert!(outcome.files().is_empty());
    assert!(resources.calls().is_empty());
    assert!(installer.installed().is_empty());
    assert!(!env.search_options_path().exists());
}

#[tokio::test]
async fn test_search_options_written_and_installed() {
    let (_project, env) = project();
    common::write_definition(&env, "orders", "orders");
    common::write_definition(&env, "customers", "customers");

    let timestamps = env.modules_deploy_timestamp_file();
    std::fs::create_dir_all(timestamps.parent().unwrap()).unwrap();
    std::fs::write(&timestamps, "orders=1700000000").unwrap();

    let options = r#"<options xmlns="http://marklogic.com/appservices/search"/>"#;
    let resources = Arc::new(FakeResources::replying(&[options]));
    let installer = Arc::new(RecordingInstaller::default());
    let generator = generator(resources.clone(), installer.clone());

    let outcome = generator.save_search_options(&env).await;
    let file = env.search_options_path();
    assert_eq!(outcome.files(), &[file.clone()]);
    assert_eq!(std::fs::read_to_string(&file).unwrap(), options);
    assert!(!timestamps.exists());
    assert!(!file.parent().unwrap().join(".staging").exists());

    let calls = resources.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].resource, "search-options-generator");
    assert_eq!(calls[0].url, env.staging.url);
    assert_eq!(calls[0].body.as_array().map(Vec::len), Some(2));

    assert_eq!(
        installer.installed(),
        vec![Installation {
            url: env.final_db.url.clone(),
            file_name: "final-entity-options.xml".to_string(),
            contents: options.to_string(),
        }]
    );
}

#[tokio::test]
async fn test_rejected_deployment_keeps_previous_search_options() {
    let (_project, env) = project();
    common::write_definition(&env, "orders", "orders");
    let file = env.search_options_path();
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(&file, "previous").unwrap();

    let resources = Arc::new(FakeResources::replying(&["<new/>"]));
    let generator = generator(resources, Arc::new(RecordingInstaller::rejecting()));

    let outcome = generator.save_search_options(&env).await;
    assert!(matches!(
        outcome,
        GenerationOutcome::Failed(GenerationError::Deploy(ref message)) if message.contains("server rejected")
    ));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "previous");
    assert!(!file.parent().unwrap().join(".staging").exists());
}

#[tokio::test]
async fn test_failed_index_write_leaves_both_databases_alone() {
    let (_project, env) = project();
    common::write_definition(&env, "orders", "orders");
    let dir = env.entity_database_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("final-database.json"), "previous").unwrap();
    std::fs::write(dir.join("staging-database.json"), "previous").unwrap();
    // The staged copy of the second file cannot be written over a directory
    std::fs::create_dir_all(dir.join(".staging").join("staging-database.json")).unwrap();

    let resources = Arc::new(FakeResources::replying(&[r#"{"indexes":[]}"#]));
    let generator = generator(resources, Arc::new(RecordingInstaller::default()));

    let outcome = generator.save_db_indexes(&env).await;
    assert!(matches!(
        outcome,
        GenerationOutcome::Failed(GenerationError::Io { .. })
    ));
    assert_eq!(
        std::fs::read_to_string(dir.join("final-database.json")).unwrap(),
        "previous"
    );
    assert_eq!(
        std::fs::read_to_string(dir.join("staging-database.json")).unwrap(),
        "previous"
    );
    assert!(!dir.join(".staging").join("final-database.json").exists());
}

#[tokio::test]
async fn test_malformed_definition_fails_generation() {
    let (_project, env) = project();
    common::write_raw_definition(&env, "orders", "orders", "{ nope");
    let resources = Arc::new(FakeResources::replying(&["{}"]));
    let generator = generator(resources.clone(), Arc::new(RecordingInstaller::default()));

    let outcome = generator.save_db_indexes(&env).await;
    assert!(matches!(
        outcome,
        GenerationOutcome::Failed(GenerationError::Entities(_))
    ));
    assert!(resources.calls().is_empty());
}

#[tokio::test]
async fn test_raw_entities_are_unmodified_documents() {
    let (_project, env) = project();
    let path = common::write_definition(&env, "orders", "orders");
    let generator = generator(
        Arc::new(FakeResources::replying(&[])),
        Arc::new(RecordingInstaller::default()),
    );

    let raw = generator.raw_entities(&env).await.unwrap();
    let expected: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(raw, vec![expected]);
}
