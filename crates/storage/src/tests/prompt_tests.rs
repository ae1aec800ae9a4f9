//! Prompt template CRUD and specificity-key uniqueness.

#![expect(clippy::unwrap_used, reason = "test code")]

use storyflow_core::{NewPromptTemplate, Pillar};

use super::create_test_storage;

#[test]
fn test_create_and_get_template() {
    let (storage, _temp_dir) = create_test_storage();
    let template = storage
        .create_template(&NewPromptTemplate::new("Fitness", "Write about {pitch}").pillar(Pillar::Sport))
        .unwrap();
    assert_eq!(template.pillar, Some(Pillar::Sport));
    assert_eq!(storage.get_template(template.id).unwrap().unwrap(), template);
}

#[test]
fn test_duplicate_specificity_key_rejected() {
    let (storage, _temp_dir) = create_test_storage();
    storage.create_template(&NewPromptTemplate::new("Fitness", "one")).unwrap();
    let err = storage.create_template(&NewPromptTemplate::new("Fitness", "two")).unwrap_err();
    assert!(err.is_duplicate());

    storage.create_template(&NewPromptTemplate::new("Fitness", "topic").topic("Running")).unwrap();
    let err = storage
        .create_template(&NewPromptTemplate::new("Fitness", "topic again").topic("Running"))
        .unwrap_err();
    assert!(err.is_duplicate());

    storage
        .create_template(&NewPromptTemplate::new("Fitness", "pillar").pillar(Pillar::Sport))
        .unwrap();
}

#[test]
fn test_find_templates_null_aware_topic() {
    let (storage, _temp_dir) = create_test_storage();
    let general = storage.create_template(&NewPromptTemplate::new("Fitness", "general")).unwrap();
    let running =
        storage.create_template(&NewPromptTemplate::new("Fitness", "run").topic("Running")).unwrap();
    storage.create_template(&NewPromptTemplate::new("News", "news")).unwrap();

    let no_topic = storage.find_templates("Fitness", None).unwrap();
    assert_eq!(no_topic.iter().map(|t| t.id).collect::<Vec<_>>(), vec![general.id]);

    let with_topic = storage.find_templates("Fitness", Some("Running")).unwrap();
    assert_eq!(with_topic.iter().map(|t| t.id).collect::<Vec<_>>(), vec![running.id]);

    assert!(storage.find_templates("Fitness", Some("Yoga")).unwrap().is_empty());
}

#[test]
fn test_list_and_delete_templates() {
    let (storage, _temp_dir) = create_test_storage();
    let t = storage.create_template(&NewPromptTemplate::new("Fitness", "p")).unwrap();
    assert_eq!(storage.list_templates().unwrap().len(), 1);
    assert!(storage.delete_template(t.id).unwrap());
    assert!(!storage.delete_template(t.id).unwrap());
    assert!(storage.list_templates().unwrap().is_empty());
}
