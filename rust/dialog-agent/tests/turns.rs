mod common;

use common::*;
use dialog_agent::{
    Ntuple,
    clarification::ClarificationSlot,
    diagnostic::DropReason,
    envelope::Envelope,
    error::{AlignError, RouterError},
    router::Outbound,
    span::SpanDescriptor,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use testresult::TestResult;

fn to_solver(ntuple: serde_json::Value) -> Outbound {
    Outbound::Ntuple {
        channel: SOLVER.to_string(),
        ntuple: Ntuple::from(ntuple),
    }
}

fn standard(text: &str) -> serde_json::Value {
    json!({"type": "standard", "tag": "TextAgent", "text": text})
}

fn clarification_request(ntuple: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "clarification",
        "tag": "ProblemSolver",
        "message": "Which box do you mean?",
        "ntuple": ntuple
    })
}

#[test_log::test(tokio::test)]
async fn standard_text_is_forwarded_to_the_solver() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "move the box",
        parse_of([json!({"predicate_type": "command", "action": "move"})]),
    )]));

    let outbound = harness.router.route(TEXT, standard("move the box")).await?;

    assert_eq!(
        outbound,
        vec![to_solver(json!({"predicate_type": "command", "action": "move"}))]
    );
    assert_eq!(
        outbound[0].clone().into_payload()?,
        json!({"predicate_type": "command", "action": "move"})
    );
    assert!(harness.diagnostics.drops().is_empty());
    Ok(())
}

#[tokio::test]
async fn speech_is_lowercased_before_parsing() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "move the box",
        parse_of([json!({"predicate_type": "command"})]),
    )]));

    let outbound = harness
        .router
        .route(SPEECH, json!({"text": "Move The BOX"}))
        .await?;

    assert_eq!(harness.analyzer.asked(), vec!["move the box"]);
    assert_eq!(outbound, vec![to_solver(json!({"predicate_type": "command"}))]);
    Ok(())
}

#[tokio::test]
async fn first_specialized_candidate_wins() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "pick it up",
        parse_of([
            json!({"reject": true}),
            json!({"predicate_type": "command", "rank": 2}),
            json!({"predicate_type": "command", "rank": 3}),
        ]),
    )]));

    let outbound = harness.router.route(TEXT, standard("pick it up")).await?;

    assert_eq!(
        outbound,
        vec![to_solver(json!({"predicate_type": "command", "rank": 2}))]
    );
    assert_eq!(harness.specializer.attempts().len(), 2);
    Ok(())
}

#[tokio::test]
async fn spans_are_aligned_for_the_specializer() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "move the box, please.",
        parse_with_spans(
            json!({"predicate_type": "command"}),
            vec![SpanDescriptor {
                semantic_type: "RefExp".to_string(),
                span: [1, 3],
                id: json!(4),
            }],
        ),
    )]));

    harness
        .router
        .route(TEXT, standard("move the box, please."))
        .await?;

    let spans = harness.specializer.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].tokens, vec!["the", "box"]);
    Ok(())
}

#[tokio::test]
async fn debug_toggle_is_not_parsed() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::default());

    let outbound = harness.router.route(TEXT, standard("d")).await?;

    assert!(outbound.is_empty());
    assert!(harness.specializer.debug());
    assert!(harness.analyzer.asked().is_empty());

    harness.router.route(TEXT, standard("d")).await?;
    assert!(!harness.specializer.debug());
    Ok(())
}

#[tokio::test]
async fn empty_text_is_ignored() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::default());

    let outbound = harness.router.route(TEXT, standard("")).await?;

    assert!(outbound.is_empty());
    assert!(harness.analyzer.asked().is_empty());
    assert!(harness.diagnostics.drops().is_empty());
    Ok(())
}

#[tokio::test]
async fn solver_feedback_goes_to_the_output_sink() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::default());

    for kind in ["response", "id_failure", "error_descriptor"] {
        let outbound = harness
            .router
            .route(
                SOLVER,
                json!({"type": kind, "tag": "ProblemSolver", "message": kind}),
            )
            .await?;
        assert!(outbound.is_empty());
    }

    assert_eq!(
        harness.sink.lines(),
        vec![
            "ProblemSolver: response",
            "ProblemSolver: id_failure",
            "ProblemSolver: error_descriptor",
        ]
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn clarification_round_trip_merges_the_answer() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "the red one",
        parse_of([json!({"predicate_type": "entity", "color": "red"})]),
    )]));

    let prompt = harness
        .router
        .route(
            SOLVER,
            clarification_request(json!({"predicate_type": "command", "object*": "?"})),
        )
        .await?;

    assert_eq!(
        prompt,
        vec![Outbound::Envelope {
            channel: TEXT.to_string(),
            envelope: Envelope::clarification_prompt(
                "ProblemSolver".to_string(),
                "Which box do you mean?".to_string(),
                Ntuple::from(json!({"predicate_type": "command", "object*": "?"})),
            ),
        }]
    );
    assert!(harness.router.slot().is_awaiting_descriptor());

    let merged = harness.router.route(TEXT, standard("the red one")).await?;

    assert_eq!(
        merged,
        vec![to_solver(json!({
            "predicate_type": "command",
            "object": {"predicate_type": "entity", "color": "red"}
        }))]
    );
    assert_eq!(harness.router.slot(), &ClarificationSlot::AwaitingTurn);
    Ok(())
}

#[tokio::test]
async fn later_clarification_replaces_the_parked_one() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "the red one",
        parse_of([json!({"color": "red"})]),
    )]));

    harness
        .router
        .route(SOLVER, clarification_request(json!({"first*": "?"})))
        .await?;
    harness
        .router
        .route(SOLVER, clarification_request(json!({"second*": "?"})))
        .await?;

    assert_eq!(
        harness.diagnostics.reasons(),
        vec![DropReason::ClarificationDisplaced(Ntuple::from(
            json!({"first*": "?"})
        ))]
    );

    let merged = harness.router.route(TEXT, standard("the red one")).await?;
    assert_eq!(merged, vec![to_solver(json!({"second": {"color": "red"}}))]);
    Ok(())
}

#[tokio::test]
async fn unparsable_answer_keeps_the_clarification_parked() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "the red one",
        parse_of([json!({"color": "red"})]),
    )]));

    harness
        .router
        .route(SOLVER, clarification_request(json!({"object*": "?"})))
        .await?;

    let outbound = harness.router.route(TEXT, standard("xyzzy")).await?;

    assert!(outbound.is_empty());
    assert!(harness.router.slot().is_awaiting_descriptor());
    assert!(matches!(
        harness.diagnostics.reasons().as_slice(),
        [DropReason::AnalyzerFailed(_)]
    ));

    let merged = harness.router.route(TEXT, standard("the red one")).await?;
    assert_eq!(merged, vec![to_solver(json!({"object": {"color": "red"}}))]);
    Ok(())
}

#[tokio::test]
async fn answer_carrying_its_original_merges_while_idle() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "the red one",
        parse_of([json!({"color": "red"})]),
    )]));

    let outbound = harness
        .router
        .route(
            TEXT,
            json!({
                "type": "clarification",
                "tag": "TextAgent",
                "text": "the red one",
                "original": {"predicate_type": "command", "object*": "?"}
            }),
        )
        .await?;

    assert_eq!(
        outbound,
        vec![to_solver(json!({
            "predicate_type": "command",
            "object": {"color": "red"}
        }))]
    );
    Ok(())
}

#[tokio::test]
async fn malformed_messages_are_dropped_and_routing_continues() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "move the box",
        parse_of([json!({"predicate_type": "command"})]),
    )]));

    let inputs = [
        (TEXT, json!("move the box")),
        (TEXT, json!({"tag": "TextAgent", "text": "move the box"})),
        (TEXT, json!({"type": "telepathy", "tag": "TextAgent"})),
        (TEXT, json!({"type": "clarification", "text": "the red one"})),
        (SOLVER, json!({"type": "response", "tag": "ProblemSolver"})),
        (SOLVER, json!({"type": "clarification", "tag": "ProblemSolver"})),
        (SPEECH, json!({"tag": "SpeechAgent"})),
        ("FED2_TextAgent", standard("move the box")),
    ];
    let count = inputs.len();

    for (channel, payload) in inputs {
        let outbound = harness.router.route(channel, payload).await?;
        assert!(outbound.is_empty());
    }

    let reasons = harness.diagnostics.reasons();
    assert_eq!(reasons.len(), count);
    assert!(
        reasons
            .iter()
            .all(|reason| matches!(reason, DropReason::Malformed(_)))
    );
    assert!(harness.sink.lines().is_empty());

    let outbound = harness.router.route(TEXT, standard("move the box")).await?;
    assert_eq!(outbound, vec![to_solver(json!({"predicate_type": "command"}))]);
    Ok(())
}

#[tokio::test]
async fn ntuple_without_predicate_type_is_not_forwarded() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "the box",
        parse_of([json!({"color": "red"})]),
    )]));

    let outbound = harness.router.route(TEXT, standard("the box")).await?;

    assert!(outbound.is_empty());
    assert_eq!(
        harness.diagnostics.reasons(),
        vec![DropReason::NotForwardable(Ntuple::from(
            json!({"color": "red"})
        ))]
    );
    Ok(())
}

#[tokio::test]
async fn ntuple_with_pending_slots_is_not_forwarded() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "where is it",
        parse_of([json!({
            "predicate_type": "query",
            "object": {"location*": "?"}
        })]),
    )]));

    let outbound = harness.router.route(TEXT, standard("where is it")).await?;

    assert!(outbound.is_empty());
    assert_eq!(
        harness.diagnostics.reasons(),
        vec![DropReason::PendingSlots(vec!["object.location".to_string()])]
    );
    Ok(())
}

#[tokio::test]
async fn no_specialized_candidate_drops_the_turn() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "colorless green ideas",
        parse_of([json!({"reject": true}), json!("not a mapping")]),
    )]));

    let outbound = harness
        .router
        .route(TEXT, standard("colorless green ideas"))
        .await?;

    assert!(outbound.is_empty());
    assert!(matches!(
        harness.diagnostics.reasons().as_slice(),
        [DropReason::NoCandidateSpecialized { attempted: 2, .. }]
    ));
    Ok(())
}

#[tokio::test]
async fn out_of_range_span_is_returned_to_the_caller() {
    let mut harness = Harness::new(ScriptedAnalyzer::new([(
        "move the box",
        parse_with_spans(
            json!({"predicate_type": "command"}),
            vec![SpanDescriptor {
                semantic_type: "RefExp".to_string(),
                span: [1, 9],
                id: json!("np"),
            }],
        ),
    )]));

    let result = harness.router.route(TEXT, standard("move the box")).await;

    assert!(matches!(
        result,
        Err(RouterError::Align(AlignError::OutOfRangeSpan {
            start: 1,
            end: 9,
            len: 3,
            ..
        }))
    ));
    assert!(harness.specializer.attempts().is_empty());
}

#[tokio::test]
async fn answer_leaving_slots_pending_keeps_the_clarification_parked() -> TestResult {
    let mut harness = Harness::new(ScriptedAnalyzer::new([
        (
            "it",
            parse_of([json!({"predicate_type": "entity", "ref*": "?"})]),
        ),
        (
            "the red one",
            parse_of([json!({"predicate_type": "entity", "color": "red"})]),
        ),
    ]));

    harness
        .router
        .route(SOLVER, clarification_request(json!({"object*": "?"})))
        .await?;

    let outbound = harness.router.route(TEXT, standard("it")).await?;

    assert!(outbound.is_empty());
    assert!(harness.router.slot().is_awaiting_descriptor());
    assert_eq!(
        harness.diagnostics.reasons(),
        vec![DropReason::PendingSlots(vec!["object.ref".to_string()])]
    );

    let merged = harness.router.route(TEXT, standard("the red one")).await?;
    assert_eq!(
        merged,
        vec![to_solver(json!({
            "object": {"predicate_type": "entity", "color": "red"}
        }))]
    );
    assert_eq!(harness.router.slot(), &ClarificationSlot::AwaitingTurn);
    Ok(())
}
