use std::sync::Arc;

use futures::StreamExt;
use thinktank_core::{ModelPreference, Personality};
use thinktank_debate::{
    abstention_line, unavailable_line, DebateEngine, DebateError, DebateEvent, DebateSession,
    EarlyTermination, EngineConfig, EventKind, RoundPolicy,
};
use thinktank_llm::{MockProvider, ModelGateway, ProviderRegistry};

/// Moderator and summary go to `host`, personalities to `voice`
fn gateway(host: Arc<MockProvider>, voice: Arc<MockProvider>) -> Arc<ModelGateway> {
    Arc::new(
        ModelGateway::builder(ModelPreference::new("host", "host-1"))
            .provider("host", host)
            .provider("voice", voice)
            .registry(
                ProviderRegistry::new()
                    .with_models("host", ["host-1"])
                    .with_models("voice", ["voice-1"]),
            )
            .build(),
    )
}

fn debater(name: &str) -> Personality {
    Personality::new(name, &format!("{} the debater", name), "Argue well.")
        .with_preference(ModelPreference::new("voice", "voice-1"))
}

fn classical() -> EngineConfig {
    EngineConfig {
        format: Some("classical".to_string()),
        ..EngineConfig::default()
    }
}

async fn run(engine: &mut DebateEngine) -> Vec<DebateEvent> {
    let mut events = Vec::new();
    while let Some(event) = engine.next_event().await.unwrap() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_full_debate_event_sequence() {
    let voice = Arc::new(MockProvider::new(vec!["An argument.".to_string()]));
    let mut engine = DebateEngine::new(
        "Is virtue teachable?",
        vec![debater("Plato"), debater("Protagoras")],
        gateway(Arc::new(MockProvider::smart()), voice.clone()),
        classical(),
    )
    .unwrap();

    let events = run(&mut engine).await;
    let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();

    assert_eq!(
        titles,
        vec![
            "DEBATE_STARTED",
            "MODERATOR",
            "ROUND_1",
            "Plato",
            "Protagoras",
            "ROUND_2",
            "Plato",
            "Protagoras",
            "ROUND_3",
            "Plato",
            "Protagoras",
            "MODERATOR",
            "DEBATE_ENDED",
            "FINAL_SUMMARY",
        ]
    );

    let session = engine.session();
    assert_eq!(session.current_round(), 3);
    assert_eq!(session.history().len(), 6);
    assert_eq!(voice.calls(), 6);
    assert!(events[0].body.contains("Is virtue teachable?"));
    assert!(events[0].body.contains("classical"));
    assert!(events[13].body.starts_with("Summary:"));
}

#[tokio::test]
async fn test_history_records_round_types_in_order() {
    let mut engine = DebateEngine::new(
        "topic",
        vec![debater("Hume"), debater("Kant"), debater("Mill")],
        gateway(
            Arc::new(MockProvider::smart()),
            Arc::new(MockProvider::constant("Point.")),
        ),
        classical(),
    )
    .unwrap();
    run(&mut engine).await;

    let history = engine.session().history();
    assert_eq!(history.len(), 9);
    for (round, chunk) in history.chunks(3).enumerate() {
        let speakers: Vec<&str> = chunk.iter().map(|e| e.personality.as_str()).collect();
        assert_eq!(speakers, vec!["Hume", "Kant", "Mill"]);
        let expected = ["opening", "rebuttal", "closing"][round];
        assert!(chunk.iter().all(|e| e.round_type == expected));
    }
}

#[tokio::test]
async fn test_turns_reply_to_previous_entry() {
    let voice = Arc::new(MockProvider::new(vec![
        "First.".to_string(),
        "Second.".to_string(),
        "Third.".to_string(),
    ]));
    let mut engine = DebateEngine::new(
        "topic",
        vec![debater("Hume"), debater("Kant")],
        gateway(Arc::new(MockProvider::smart()), voice),
        classical(),
    )
    .unwrap();

    let turns: Vec<DebateEvent> = run(&mut engine)
        .await
        .into_iter()
        .filter(|e| matches!(e.kind, EventKind::Turn { .. }))
        .collect();

    assert_eq!(turns[0].reply_to, None);
    assert_eq!(turns[1].reply_to.as_deref(), Some("First."));
    assert_eq!(turns[2].reply_to.as_deref(), Some("Second."));
    assert_eq!(turns[2].body, "Third.");
}

#[tokio::test]
async fn test_refusal_is_retried() {
    let voice = Arc::new(MockProvider::new(vec![
        "I'm sorry, but I can't argue for that.".to_string(),
        "Very well: knowledge begins in experience.".to_string(),
    ]));
    let mut engine = DebateEngine::new(
        "topic",
        vec![debater("Locke")],
        gateway(Arc::new(MockProvider::smart()), voice.clone()),
        classical(),
    )
    .unwrap();

    // started, moderator, round header
    for _ in 0..3 {
        engine.next_event().await.unwrap();
    }
    let turn = engine.next_event().await.unwrap().unwrap();

    assert_eq!(turn.body, "Very well: knowledge begins in experience.");
    assert_eq!(voice.calls(), 2);
    assert_eq!(engine.session().history().len(), 1);
}

#[tokio::test]
async fn test_persistent_refusal_becomes_abstention() {
    let voice = Arc::new(MockProvider::constant("I must respectfully decline."));
    let config = EngineConfig {
        max_retries: 2,
        ..classical()
    };
    let mut engine = DebateEngine::new(
        "topic",
        vec![debater("Locke")],
        gateway(Arc::new(MockProvider::smart()), voice.clone()),
        config,
    )
    .unwrap();

    for _ in 0..3 {
        engine.next_event().await.unwrap();
    }
    let turn = engine.next_event().await.unwrap().unwrap();

    assert_eq!(turn.body, abstention_line("Locke"));
    assert_eq!(voice.calls(), 3);
    assert_eq!(engine.session().history()[0].response, abstention_line("Locke"));
}

#[tokio::test]
async fn test_unbounded_retry_setting_does_not_overflow() {
    let voice = Arc::new(MockProvider::new(vec![
        "I cannot help with that.".to_string(),
        "Then let me answer plainly.".to_string(),
    ]));
    let config = EngineConfig {
        max_retries: u32::MAX,
        ..classical()
    };
    let mut engine = DebateEngine::new(
        "topic",
        vec![debater("Locke")],
        gateway(Arc::new(MockProvider::smart()), voice.clone()),
        config,
    )
    .unwrap();

    for _ in 0..3 {
        engine.next_event().await.unwrap();
    }
    let turn = engine.next_event().await.unwrap().unwrap();

    assert_eq!(turn.body, "Then let me answer plainly.");
    assert_eq!(voice.calls(), 2);
}

#[tokio::test]
async fn test_moderator_speaks_without_debater_framing() {
    let host = Arc::new(MockProvider::smart());
    let mut engine = DebateEngine::new(
        "Is virtue teachable?",
        vec![debater("Plato")],
        gateway(host.clone(), Arc::new(MockProvider::constant("Point."))),
        classical(),
    )
    .unwrap();
    run(&mut engine).await;

    let requests = host.requests().await;
    // opening, closing, summary
    assert_eq!(requests.len(), 3);
    for request in &requests[..2] {
        assert_eq!(request.config.provider, "host");
        assert!(request.system.contains("impartial moderator"));
        assert!(!request.system.contains("philosophical thinker"));
        assert!(!request.prompt.contains("engage with the previous arguments"));
    }
    assert!(requests[0].system.contains("moderator_opening"));
    assert!(requests[1].system.contains("moderator_closing"));
}

#[tokio::test]
async fn test_service_failures_degrade_until_summary() {
    let host = Arc::new(MockProvider::failing());
    let mut engine = DebateEngine::new(
        "topic",
        vec![debater("Hume"), debater("Kant")],
        gateway(host.clone(), Arc::new(MockProvider::failing())),
        classical(),
    )
    .unwrap();

    let mut events = Vec::new();
    let error = loop {
        match engine.next_event().await {
            Ok(Some(event)) => events.push(event),
            Ok(None) => panic!("summary failure should surface"),
            Err(e) => break e,
        }
    };

    assert!(matches!(error, DebateError::Service(_)));
    assert_eq!(events.len(), 13);
    assert_eq!(events.last().unwrap().title, "DEBATE_ENDED");
    assert!(events[1].body.starts_with("Welcome to this debate"));
    assert_eq!(events[3].body, unavailable_line("Hume"));
    assert!(engine.next_event().await.unwrap().is_none());
}

#[tokio::test]
async fn test_moderator_failure_does_not_stop_debate() {
    // Host answers the two moderator calls with nothing, then the summary
    let host = Arc::new(MockProvider::new(vec![
        String::new(),
        String::new(),
        "Summary: a close contest.".to_string(),
    ]));
    let mut engine = DebateEngine::new(
        "topic",
        vec![debater("Hume")],
        gateway(host, Arc::new(MockProvider::constant("Point."))),
        classical(),
    )
    .unwrap();

    let events = run(&mut engine).await;

    assert_eq!(events.len(), 11);
    assert!(events[1].body.starts_with("Welcome to this debate"));
    assert!(events[8].body.starts_with("That concludes"));
    assert_eq!(events[10].body, "Summary: a close contest.");
}

struct AfterRounds(u32);

impl EarlyTermination for AfterRounds {
    fn should_end_early(&self, session: &DebateSession) -> bool {
        session.current_round() >= self.0
    }
}

#[tokio::test]
async fn test_early_termination_skips_to_closing() {
    let mut engine = DebateEngine::new(
        "topic",
        vec![debater("Hume"), debater("Kant")],
        gateway(
            Arc::new(MockProvider::smart()),
            Arc::new(MockProvider::constant("Point.")),
        ),
        classical(),
    )
    .unwrap()
    .with_early_termination(Box::new(AfterRounds(1)));

    let events = run(&mut engine).await;
    let rounds = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::Round { .. }))
        .count();

    assert_eq!(rounds, 1);
    assert_eq!(engine.session().current_round(), 1);
    assert_eq!(engine.session().history().len(), 2);
    assert_eq!(events.last().unwrap().kind, EventKind::FinalSummary);
}

#[tokio::test]
async fn test_free_form_wraps_descriptors() {
    let config = EngineConfig {
        round_policy: RoundPolicy::FreeForm {
            min_rounds: 5,
            max_rounds: 5,
        },
        ..classical()
    };
    let mut engine = DebateEngine::new(
        "topic",
        vec![debater("Hume")],
        gateway(
            Arc::new(MockProvider::smart()),
            Arc::new(MockProvider::constant("Point.")),
        ),
        config,
    )
    .unwrap();
    run(&mut engine).await;

    let kinds: Vec<&str> = engine
        .session()
        .history()
        .iter()
        .map(|e| e.round_type.as_str())
        .collect();
    assert_eq!(
        kinds,
        vec!["opening", "rebuttal", "closing", "opening", "rebuttal"]
    );
}

#[tokio::test]
async fn test_stream_stops_when_consumer_stops() {
    let host = Arc::new(MockProvider::smart());
    let voice = Arc::new(MockProvider::constant("Point."));
    let engine = DebateEngine::new(
        "topic",
        vec![debater("Hume"), debater("Kant")],
        gateway(host.clone(), voice.clone()),
        classical(),
    )
    .unwrap();

    let events: Vec<_> = engine.into_stream().take(4).collect().await;

    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e.is_ok()));
    assert_eq!(host.calls(), 1);
    assert_eq!(voice.calls(), 1);
}

#[tokio::test]
async fn test_random_format_runs_its_own_round_count() {
    let mut engine = DebateEngine::new(
        "topic",
        vec![debater("Hume")],
        gateway(
            Arc::new(MockProvider::smart()),
            Arc::new(MockProvider::constant("Point.")),
        ),
        EngineConfig::default(),
    )
    .unwrap();
    let expected = engine.session().format().len();

    let events = run(&mut engine).await;
    let rounds = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::Round { .. }))
        .count();
    assert_eq!(rounds, expected);
}
