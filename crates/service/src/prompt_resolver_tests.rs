#![expect(clippy::unwrap_used, reason = "test code")]

use storyflow_core::{NewPromptTemplate, Pillar, PitchContent, PromptTier};
use storyflow_storage::traits::PromptTemplateStore;

use crate::PromptResolver;
use crate::test_support::{create_pitch, test_env};

async fn template(
    env: &crate::test_support::TestEnv,
    pillar: Option<Pillar>,
    topic: Option<&str>,
    prompt: &str,
) -> i64 {
    let mut new = NewPromptTemplate::new("Fitness", prompt);
    if let Some(pillar) = pillar {
        new = new.pillar(pillar);
    }
    if let Some(topic) = topic {
        new = new.topic(topic);
    }
    env.storage.create_template(&new).await.unwrap().id
}

#[tokio::test]
async fn test_exact_match_wins() {
    let env = test_env();
    let _category = template(&env, None, None, "category").await;
    let _topic = template(&env, None, Some("Running"), "topic").await;
    let exact = template(&env, Some(Pillar::Sport), Some("Running"), "exact").await;
    let pitch = create_pitch(
        &env.storage,
        PitchContent::new("Fitness", "x").pillar(Pillar::Sport).topic("Running"),
    )
    .await;

    let resolver = PromptResolver::new(env.storage.clone(), Some("default".to_owned()));
    let resolved = resolver.resolve(&pitch).await.unwrap().unwrap();
    assert_eq!(resolved.tier, PromptTier::Exact);
    assert_eq!(resolved.template_id, Some(exact));
    assert_eq!(resolved.text, "exact");
}

#[tokio::test]
async fn test_category_topic_prefers_template_without_pillar() {
    let env = test_env();
    let _sport = template(&env, Some(Pillar::Sport), Some("Running"), "sport").await;
    let general = template(&env, None, Some("Running"), "general").await;
    let pitch = create_pitch(
        &env.storage,
        PitchContent::new("Fitness", "x").pillar(Pillar::PartnerContent).topic("Running"),
    )
    .await;

    let resolver = PromptResolver::new(env.storage.clone(), None);
    let resolved = resolver.resolve(&pitch).await.unwrap().unwrap();
    assert_eq!(resolved.tier, PromptTier::CategoryTopic);
    assert_eq!(resolved.template_id, Some(general));
}

#[tokio::test]
async fn test_category_topic_falls_back_to_lowest_id() {
    let env = test_env();
    let sport = template(&env, Some(Pillar::Sport), Some("Running"), "sport").await;
    let _partner = template(&env, Some(Pillar::PartnerContent), Some("Running"), "partner").await;
    let pitch =
        create_pitch(&env.storage, PitchContent::new("Fitness", "x").topic("Running")).await;

    let resolver = PromptResolver::new(env.storage.clone(), None);
    let resolved = resolver.resolve(&pitch).await.unwrap().unwrap();
    assert_eq!(resolved.tier, PromptTier::CategoryTopic);
    assert_eq!(resolved.template_id, Some(sport));
}

#[tokio::test]
async fn test_category_prefers_same_pillar_then_no_pillar() {
    let env = test_env();
    let _partner = template(&env, Some(Pillar::PartnerContent), None, "partner").await;
    let general = template(&env, None, None, "general").await;
    let sport = template(&env, Some(Pillar::Sport), None, "sport").await;

    let resolver = PromptResolver::new(env.storage.clone(), None);

    let sport_pitch =
        create_pitch(&env.storage, PitchContent::new("Fitness", "x").pillar(Pillar::Sport)).await;
    let resolved = resolver.resolve(&sport_pitch).await.unwrap().unwrap();
    assert_eq!(resolved.tier, PromptTier::Category);
    assert_eq!(resolved.template_id, Some(sport));

    let plain = create_pitch(&env.storage, PitchContent::new("Fitness", "x").topic("Yoga")).await;
    let resolved = resolver.resolve(&plain).await.unwrap().unwrap();
    assert_eq!(resolved.tier, PromptTier::Category);
    assert_eq!(resolved.template_id, Some(general));
}

#[tokio::test]
async fn test_default_then_none() {
    let env = test_env();
    let pitch = create_pitch(&env.storage, PitchContent::new("News", "Election night")).await;

    let with_default =
        PromptResolver::new(env.storage.clone(), Some("Write about {pitch}".to_owned()));
    let resolved = with_default.resolve(&pitch).await.unwrap().unwrap();
    assert_eq!(resolved.tier, PromptTier::Default);
    assert_eq!(resolved.template_id, None);
    assert_eq!(resolved.text, "Write about Election night");

    let blank_default = PromptResolver::new(env.storage.clone(), Some("   ".to_owned()));
    assert!(blank_default.resolve(&pitch).await.unwrap().is_none());
}

#[tokio::test]
async fn test_placeholders_rendered_and_missing_reported() {
    let env = test_env();
    template(&env, None, None, "Write about {pitch} using {keywords}. {unknown}").await;
    let pitch =
        create_pitch(&env.storage, PitchContent::new("Fitness", "X").keyword("Y")).await;

    let resolver = PromptResolver::new(env.storage.clone(), None);
    let resolved = resolver.resolve(&pitch).await.unwrap().unwrap();
    assert!(resolved.text.starts_with("Write about X using Y."));
    assert!(resolved.text.contains("[MISSING: unknown]"));
    assert_eq!(resolved.missing, vec!["unknown".to_owned()]);
}
