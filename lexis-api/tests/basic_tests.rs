//! Basic tests for lexis-api

use chrono::NaiveDate;
use lexis_api::*;
use std::sync::Arc;

fn analyzer() -> Analyzer {
    let config = Config::builder()
        .reference_date(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())
        .build()
        .unwrap();
    Analyzer::with_config(config).unwrap()
}

fn tasks(list: &str) -> TaskSet {
    TaskSet::parse_list(list).unwrap()
}

#[test]
fn test_example_document() {
    let annotation = analyzer()
        .annotate_tasks(
            "Can you send me the report by Friday? I'm so thrilled.",
            &tasks("question,sentiment,date"),
        )
        .unwrap();

    assert_eq!(annotation.language, "en");
    assert!(annotation.language_probability > 0.9);
    assert_eq!(annotation.sentences.len(), 2);
    assert_eq!(annotation.sentences[0].text, "Can you send me the report by Friday?");
    assert_eq!(annotation.tasks.len(), 3);
    assert!(annotation.stats.is_none());

    let question = annotation.task(TaskKind::Question).unwrap().result().unwrap();
    let question = question.as_label().unwrap();
    assert_eq!(question.sentences[0].label, "true");

    let dates = annotation.task(TaskKind::Date).unwrap().result().unwrap();
    let friday = &dates.as_dates().unwrap()[0];
    assert_eq!(
        friday.resolved,
        DateValue::Day {
            date: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
        }
    );

    let send = annotation.tokens.iter().find(|t| t.text == "send").unwrap();
    assert_eq!(send.pos, "VERB");
    assert_eq!(send.lemma, "send");
    assert!(!send.stopword);
}

#[test]
fn test_lemmas_and_filtered_tokens() {
    let annotation = analyzer()
        .annotate_tasks("The managers went to the meetings.", &TaskSet::empty())
        .unwrap();
    let lemmas: Vec<&str> = annotation.tokens.iter().map(|t| t.lemma.as_str()).collect();
    assert_eq!(lemmas, ["the", "manager", "go", "to", "the", "meeting", "."]);

    let filtered: Vec<&str> = annotation
        .tokens_filtered()
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(filtered, ["managers", "went", "meetings"]);
}

#[test]
fn test_undetermined_language() {
    let annotation = analyzer()
        .annotate_tasks("Der Hund schläft im Garten.", &TaskSet::empty())
        .unwrap();
    assert_eq!(annotation.language, "und");
    assert!(annotation.has_warning(DegradationKind::UndeterminedLanguage));
}

#[test]
fn test_pre_split_sentences() {
    let annotation = analyzer()
        .annotate_tasks(
            Input::from_sentences(["thanks Dr. Lee", "see you on Friday. Bring slides"]),
            &tasks("date"),
        )
        .unwrap();
    let sentences: Vec<&str> = annotation.sentences.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(sentences, ["thanks Dr. Lee", "see you on Friday. Bring slides"]);
    assert_eq!(annotation.sentences[1].start, "thanks Dr. Lee\n".len());
}

#[test]
fn test_unrequested_tasks_are_absent() {
    let annotation = analyzer()
        .annotate_tasks("Thanks for the help!", &tasks("speech_act"))
        .unwrap();
    assert_eq!(annotation.tasks.keys().collect::<Vec<_>>(), ["speech_act"]);
}

#[test]
fn test_empty_input() {
    let annotation = analyzer().annotate("").unwrap();

    assert!(annotation.tokens.is_empty());
    assert!(annotation.sentences.is_empty());
    assert_eq!(annotation.tasks.len(), TaskKind::ALL.len());
    assert!(annotation.tasks.values().all(|t| t.result().is_some()));
    assert!(annotation.has_warning(DegradationKind::EmptyInput));
}

#[test]
fn test_invalid_utf8_is_rejected() {
    let err = analyzer()
        .annotate(Input::from_bytes(vec![0xff, 0xfe, b'a']))
        .unwrap_err();
    assert!(matches!(err, ApiError::MalformedInput(_)));
}

#[test]
fn test_benchmark_adds_stats() {
    let config = Config::builder().benchmark(true).build().unwrap();
    let annotation = Analyzer::with_config(config)
        .unwrap()
        .annotate_tasks("Hello there.", &tasks("sentiment"))
        .unwrap();

    let stats = annotation.stats.unwrap();
    assert!(stats.contains_key("tokenize"));
    assert!(stats.contains_key("classify"));
    assert!(stats.contains_key("total"));
}

#[test]
fn test_extra_abbreviations() {
    let text = "The hall seats approx. Ninety people.";
    let plain = analyzer().annotate_tasks(text, &TaskSet::empty()).unwrap();
    let config = Config::builder().abbreviations(["approx"]).build().unwrap();
    let extended = Analyzer::with_config(config)
        .unwrap()
        .annotate_tasks(text, &TaskSet::empty())
        .unwrap();

    assert_eq!(plain.sentences.len(), 2);
    assert_eq!(extended.sentences.len(), 1);
}

struct Unreliable;

impl ModelLoader for Unreliable {
    fn load(&self, task: TaskKind, model_id: &str) -> Result<Arc<dyn ModelHandle>, ModelError> {
        if task == TaskKind::Emotion {
            return Err(ModelError::Load("no weights on disk".into()));
        }
        BuiltinModelLoader::new().load(task, model_id)
    }
}

#[test]
fn test_failed_task_serializes_as_error_object() {
    let analyzer = Analyzer::with_loader(Config::default(), &Unreliable).unwrap();
    let annotation = analyzer
        .annotate_tasks("What a lovely day!", &tasks("emotion,sentiment"))
        .unwrap();

    let failure = annotation.task(TaskKind::Emotion).unwrap().failure().unwrap();
    assert_eq!(failure.error, "model_unavailable");
    assert!(annotation.task(TaskKind::Sentiment).unwrap().result().is_some());

    let json: serde_json::Value = serde_json::from_str(&annotation.to_json().unwrap()).unwrap();
    assert_eq!(json["tasks"]["emotion"]["error"], "model_unavailable");
    assert_eq!(json["tasks"]["sentiment"]["type"], "label");
    assert!(json.get("stats").is_none());
}

#[test]
fn test_json_round_trip() {
    let annotation = analyzer()
        .annotate_tasks("Remind me to call Sarah tomorrow.", &TaskSet::all())
        .unwrap();
    let json = annotation.to_json_pretty().unwrap();
    let parsed: DocumentAnnotation = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.tokens, annotation.tokens);
    assert_eq!(parsed.sentences, annotation.sentences);
    assert_eq!(
        parsed.tasks.keys().collect::<Vec<_>>(),
        annotation.tasks.keys().collect::<Vec<_>>()
    );
    assert!(parsed.tasks.values().all(|t| t.result().is_some()));
}

#[tokio::test]
async fn test_annotate_async() {
    let analyzer = analyzer();
    let annotation = analyzer
        .annotate_async(Input::from_text("Is this working?"), &tasks("question"))
        .await
        .unwrap();
    let label = annotation.task(TaskKind::Question).unwrap().result().unwrap();
    assert_eq!(label.as_label().unwrap().label, "true");
}

#[tokio::test]
async fn test_cancelled_annotation() {
    let analyzer = analyzer();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = analyzer
        .annotate_cancellable(Input::from_text("Hello."), &TaskSet::all(), cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
}

#[test]
fn test_annotate_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.txt");
    std::fs::write(&path, "Please review the draft.").unwrap();

    let annotation = annotate_file(&path, &tasks("task")).unwrap();
    let found = annotation.task(TaskKind::Task).unwrap().result().unwrap();
    assert_eq!(found.as_tasks().unwrap().len(), 1);
}
