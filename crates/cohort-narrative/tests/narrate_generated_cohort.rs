use cohort_core::CohortConfiguration;
use cohort_generator::StratifiedCohortGenerator;
use cohort_narrative::{
    BatchNarrator, NameGenerator, NarrativeError, NarrativeGenerator, RetryPolicy, ScriptedClient,
};
use cohort_verify::verify_stratification;
use std::sync::Arc;
use std::time::Duration;

fn config() -> CohortConfiguration {
    CohortConfiguration::from_yaml(
        r#"
weighted:
  name: race
  distribution:
    - { value: Black, proportion: 0.5 }
    - { value: White, proportion: 0.5 }
uniform:
  - { name: gender, values: [Male, Female] }
"#,
    )
    .unwrap()
}

#[tokio::test]
async fn narration_preserves_stratification() {
    let config = config();
    let records = StratifiedCohortGenerator::new(config.clone(), 11)
        .generate(4)
        .unwrap();

    let client = Arc::new(ScriptedClient::default());
    for i in 0..records.len() {
        client.push_response(format!(
            r#"{{"first_name": "Pat{i}", "last_name": "Doe"}}"#
        ));
        client.push_response(format!(
            r#"{{"gender": "Female", "narrative": "Story number {i}."}}"#
        ));
    }

    let mut narrator = BatchNarrator::new(NarrativeGenerator::new(client.clone()))
        .with_names(NameGenerator::new(client.clone()));
    let outcome = narrator.run(&records).await;

    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.narrated.len(), 4);
    assert!(verify_stratification(&outcome.narrated, &config).is_perfect());

    for (original, narrated) in records.iter().zip(&outcome.narrated) {
        assert_eq!(original.get("race"), narrated.get("race"));
        assert_eq!(original.get("gender"), narrated.get("gender"));
        assert!(narrated.get("narrative").unwrap().starts_with("Story number"));
    }
}

#[tokio::test]
async fn transport_errors_are_retried() {
    let client = Arc::new(ScriptedClient::default());
    client.push_error(NarrativeError::Api {
        status: 529,
        body: "overloaded".to_string(),
    });
    client.push_response(r#"{"gender": "Male", "narrative": "Recovered."}"#);

    let mut narrator = BatchNarrator::new(
        NarrativeGenerator::new(client.clone())
            .with_retry(RetryPolicy::new(3, Duration::from_millis(1))),
    );
    let records = StratifiedCohortGenerator::new(config(), 1)
        .generate(4)
        .unwrap();

    let outcome = narrator.run(&records[..1]).await;

    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.narrated[0].get("narrative"), Some("Recovered."));
    assert_eq!(client.requests().len(), 2);
}
