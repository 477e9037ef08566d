//! End-to-end pipeline behavior with scripted collaborators.

use super::fakes::{document, FakeLiterature, FakeLlm, Reply};
use crate::generator::RouteKind;
use crate::pipeline::{Stage, WellnessPipeline};
use std::sync::Arc;
use wellness_core::AppError;
use wellness_prompt::PromptLibrary;

const MODEL: &str = "test-model";

fn pipeline(llm: &Arc<FakeLlm>, source: &Arc<FakeLiterature>) -> WellnessPipeline {
    WellnessPipeline::new(
        llm.clone(),
        source.clone(),
        Arc::new(PromptLibrary::builtin().unwrap()),
        MODEL,
        4,
    )
    .unwrap()
}

fn anxiety_source() -> FakeLiterature {
    FakeLiterature::new()
        .with_hits("exercise AND anxiety", &["111", "222"])
        .with_record(document("111", "Aerobic exercise and anxiety"))
        .with_record(document("222", "Physical activity in anxiety disorders"))
}

#[tokio::test]
async fn test_research_path_with_citations() {
    let llm = Arc::new(FakeLlm::new(
        Reply::text("\"exercise AND anxiety\""),
        Reply::text("Exercise reduces anxiety [Source: 111][Source: 222]."),
    ));
    let source = Arc::new(anxiety_source());

    let outcome = pipeline(&llm, &source)
        .run("Does exercise help anxiety?")
        .await
        .unwrap();

    assert_eq!(outcome.search_query, "exercise AND anxiety");
    assert_eq!(outcome.route, RouteKind::Research);
    assert_eq!(
        outcome.answer,
        "Exercise reduces anxiety [Source: 111][Source: 222]."
    );

    let ids: Vec<String> = outcome.sources().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["111", "222"]);
    assert_eq!(
        outcome.stages,
        vec![
            Stage::Start,
            Stage::EnhanceQuery,
            Stage::Retrieve,
            Stage::GenerateResearch,
            Stage::End
        ]
    );

    assert_eq!(source.search_queries(), vec!["exercise AND anxiety"]);
    assert_eq!(source.searches.lock().unwrap()[0].1, 4);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn test_model_requests() {
    let llm = Arc::new(FakeLlm::new(
        Reply::text("exercise AND anxiety"),
        Reply::text("Answer [Source: 111]."),
    ));
    let source = Arc::new(anxiety_source());

    pipeline(&llm, &source)
        .run("Does exercise help anxiety?")
        .await
        .unwrap();

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);

    let enhance = &requests[0];
    assert_eq!(
        enhance.prompt,
        "Convert this to a PubMed search query: Does exercise help anxiety?"
    );
    assert!(enhance
        .system
        .as_deref()
        .unwrap()
        .contains("medical search query optimizer"));
    assert_eq!(enhance.model, MODEL);

    let research = &requests[1];
    assert!(research.prompt.contains(
        "PMID: 111\nTitle: Aerobic exercise and anxiety\nAuthors: Smith J, Doe A\nJournal: J Affect Disord\nYear: 2020\nAbstract: RESULTS: Findings for Aerobic exercise and anxiety.\n\nPMID: 222"
    ));
    assert!(research
        .prompt
        .ends_with("USER QUESTION: Does exercise help anxiety?"));
    assert!(research.system.as_deref().unwrap().contains("[Source: PMID]"));
}

#[tokio::test]
async fn test_simplified_query_retry() {
    let llm = Arc::new(FakeLlm::new(
        Reply::text("exercise AND anxiety AND adolescents"),
        Reply::text("Answer [Source: 333]."),
    ));
    let source = Arc::new(
        FakeLiterature::new()
            .with_hits("exercise anxiety?", &["333"])
            .with_record(document("333", "Exercise and anxiety")),
    );

    let outcome = pipeline(&llm, &source)
        .run("Does exercise help anxiety?")
        .await
        .unwrap();

    assert_eq!(
        source.search_queries(),
        vec!["exercise AND anxiety AND adolescents", "exercise anxiety?"]
    );
    assert_eq!(outcome.route, RouteKind::Research);
    assert_eq!(outcome.documents.len(), 1);
}

#[tokio::test]
async fn test_empty_simplified_query_is_not_retried() {
    let llm = Arc::new(FakeLlm::new(
        Reply::text("tolerability"),
        Reply::text("While I couldn't find specific research articles on this topic, here's what I can share: rest."),
    ));
    let source = Arc::new(FakeLiterature::new());

    let outcome = pipeline(&llm, &source).run("is it ok?").await.unwrap();

    assert_eq!(source.search_queries(), vec!["tolerability"]);
    assert_eq!(source.fetch_count(), 0);
    assert_eq!(outcome.route, RouteKind::General);
    assert!(outcome.sources().is_empty());
}

#[tokio::test]
async fn test_no_results_takes_general_path() {
    let llm = Arc::new(FakeLlm::new(
        Reply::text("asdf"),
        Reply::text("While I couldn't find specific research articles on this topic, here's what I can share: try a wellness question [Source: 1]."),
    ));
    let source = Arc::new(FakeLiterature::new());

    let outcome = pipeline(&llm, &source).run("asdf").await.unwrap();

    // "asdf" has four characters, so the simplified query keeps it
    assert_eq!(source.search_queries(), vec!["asdf", "asdf"]);
    assert_eq!(outcome.route, RouteKind::General);
    assert!(outcome.documents.is_empty());
    assert!(!outcome.answer.contains("[Source:"));
    assert!(outcome.answer.ends_with("try a wellness question."));
    assert_eq!(outcome.stages[3], Stage::GenerateGeneral);

    let general = llm.generation_requests();
    assert_eq!(general.len(), 1);
    assert_eq!(general[0].prompt, "asdf");
    assert!(general[0]
        .system
        .as_deref()
        .unwrap()
        .contains("couldn't find specific research"));
}

#[tokio::test]
async fn test_enhancement_failure_uses_question() {
    let llm = Arc::new(FakeLlm::new(Reply::Failure, Reply::text("General answer.")));
    let source = Arc::new(FakeLiterature::new());

    let outcome = pipeline(&llm, &source)
        .run("What helps with sleep?")
        .await
        .unwrap();

    assert_eq!(outcome.search_query, "What helps with sleep?");
    assert_eq!(source.search_queries()[0], "What helps with sleep?");
    assert_eq!(outcome.answer, "General answer.");
}

#[tokio::test]
async fn test_blank_enhancement_uses_question() {
    let llm = Arc::new(FakeLlm::new(Reply::text("  \"\"  "), Reply::text("ok")));
    let source = Arc::new(FakeLiterature::new());

    let outcome = pipeline(&llm, &source)
        .run("Is coffee bad for your heart?")
        .await
        .unwrap();

    assert_eq!(outcome.search_query, "Is coffee bad for your heart?");
}

#[tokio::test]
async fn test_search_failure_degrades_to_general() {
    let llm = Arc::new(FakeLlm::new(
        Reply::text("exercise AND anxiety"),
        Reply::text("General answer."),
    ));
    let source = Arc::new(anxiety_source().failing_search());

    let outcome = pipeline(&llm, &source)
        .run("Does exercise help anxiety?")
        .await
        .unwrap();

    assert_eq!(outcome.route, RouteKind::General);
    assert_eq!(source.search_queries().len(), 1);
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn test_fetch_failure_degrades_to_general() {
    let llm = Arc::new(FakeLlm::new(
        Reply::text("exercise AND anxiety"),
        Reply::text("General answer."),
    ));
    let source = Arc::new(anxiety_source().failing_fetch());

    let outcome = pipeline(&llm, &source)
        .run("Does exercise help anxiety?")
        .await
        .unwrap();

    assert_eq!(outcome.route, RouteKind::General);
    assert!(outcome.sources().is_empty());
}

#[tokio::test]
async fn test_unusable_fetch_does_not_retry() {
    let llm = Arc::new(FakeLlm::new(
        Reply::text("exercise AND anxiety"),
        Reply::text("General answer."),
    ));
    // ids come back but no record parses
    let source = Arc::new(
        FakeLiterature::new()
            .with_hits("exercise AND anxiety", &["404"])
            .with_hits("exercise anxiety?", &["111"]),
    );

    let outcome = pipeline(&llm, &source)
        .run("Does exercise help anxiety?")
        .await
        .unwrap();

    assert_eq!(source.search_queries(), vec!["exercise AND anxiety"]);
    assert_eq!(outcome.route, RouteKind::General);
}

#[tokio::test]
async fn test_citations_are_normalized() {
    let llm = Arc::new(FakeLlm::new(
        Reply::text("exercise AND anxiety"),
        Reply::text(
            "Both trials agree [Source: 111, 222]. An older study disagrees [Source: 999].",
        ),
    ));
    let source = Arc::new(anxiety_source());

    let outcome = pipeline(&llm, &source)
        .run("Does exercise help anxiety?")
        .await
        .unwrap();

    assert_eq!(
        outcome.answer,
        "Both trials agree [Source: 111][Source: 222]. An older study disagrees."
    );
}

#[tokio::test]
async fn test_generation_failure_propagates() {
    let llm = Arc::new(FakeLlm::new(Reply::text("exercise AND anxiety"), Reply::Failure));
    let source = Arc::new(anxiety_source());

    let result = pipeline(&llm, &source).run("Does exercise help anxiety?").await;

    assert!(matches!(result, Err(AppError::Llm(_))));
    assert_eq!(llm.generation_requests().len(), 1);
}

#[tokio::test]
async fn test_missing_credential_is_fatal() {
    let llm = Arc::new(FakeLlm::new(Reply::MissingKey, Reply::MissingKey));
    let source = Arc::new(anxiety_source());

    let result = pipeline(&llm, &source).run("Does exercise help anxiety?").await;

    assert!(matches!(result, Err(AppError::MissingCredential(_))));
    assert!(source.search_queries().is_empty());
}

#[tokio::test]
async fn test_blank_question_is_rejected() {
    let llm = Arc::new(FakeLlm::new(Reply::text("x"), Reply::text("y")));
    let source = Arc::new(FakeLiterature::new());

    let result = pipeline(&llm, &source).run("   \n").await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_runs_are_independent() {
    let llm = Arc::new(FakeLlm::new(
        Reply::text("exercise AND anxiety"),
        Reply::text("Answer [Source: 111]."),
    ));
    let source = Arc::new(anxiety_source());
    let pipeline = Arc::new(pipeline(&llm, &source));

    let (first, second) = tokio::join!(
        pipeline.run("Does exercise help anxiety?"),
        pipeline.run("Does exercise help anxiety?")
    );

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.documents, second.documents);
    assert_eq!(first.stages.len(), 5);
    assert_eq!(second.stages.len(), 5);
}
