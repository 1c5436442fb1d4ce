//! End-to-end tests across the decoder, workflow controller, review engine,
//! and chat session, using in-memory streams shaped exactly like the
//! backend's wire output.

use dsa_copilot::services::snapshot::ChatContext;
use dsa_copilot::{
    AssessmentPhase, ChatSession, ContextMode, EventStreamDecoder, ResearchPhase, Section,
    StreamEvent, WorkflowController, WorkflowEvent,
};
use dsa_copilot::models::CompanyIdentity;

/// Build a wire body from event JSON lines, with noise a real backend can
/// produce interleaved (blank lines, comments, unknown tags).
fn wire_body(lines: &[&str]) -> Vec<u8> {
    let mut body = String::new();
    for line in lines {
        body.push_str("data: ");
        body.push_str(line);
        body.push_str("\n\n");
    }
    body.into_bytes()
}

/// Chop a body into fixed-size chunks to exercise frame reassembly.
fn chunked(body: &[u8], size: usize) -> Vec<Vec<u8>> {
    body.chunks(size).map(|c| c.to_vec()).collect()
}

async fn drain(decoder: &mut EventStreamDecoder) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = decoder.next_event().await.unwrap() {
        events.push(event);
    }
    events
}

fn match_result_frames() -> Vec<u8> {
    wire_body(&[
        r#"{"type":"node_start","node":"match_company"}"#,
        r#"{"type":"llm_start","node":"match_company"}"#,
        r#"{"type":"node_end","node":"match_company"}"#,
        r#"{"type":"result","data":{"input_name":"acme","exact_match":{"name":"Acme GmbH","top_domain":"acme.de","confidence":"exact","summary_long":"German hosting provider."},"suggestions":[]}}"#,
        r#"{"type":"done"}"#,
    ])
}

fn research_frames() -> Vec<u8> {
    wire_body(&[
        r#"{"type":"node_start","node":"research_subquestions"}"#,
        r#"{"type":"tool_end","name":"web_search","sources":[{"url":"https://acme.de/about","title":"About Acme"},{"url":"https://news.example/acme"}]}"#,
        // Duplicate URL plus one new source
        r#"{"type":"tool_end","name":"web_search","sources":[{"url":"https://acme.de/about"},{"url":"https://register.example/acme"}]}"#,
        r#"{"type":"weird_new_event","payload":1}"#,
        r#"{"type":"node_start","node":"finalize_profile"}"#,
        r#"{"type":"result","data":{"company_name":"Acme GmbH","answers":[{"section":"Territorial Scope","question":"Where is the service offered?","answer":"EU-wide","source":"acme.de","confidence":"High"},{"section":"Company Size","question":"How many employees?","answer":"Around 250","source":"register.example","confidence":"Medium"},{"section":"Type of Service","question":"What does the service do?","answer":"Information not publicly available","information_found":false}]}}"#,
        r#"{"type":"done"}"#,
    ])
}

fn classify_frames() -> Vec<u8> {
    wire_body(&[
        r#"{"type":"result","data":{"company_name":"Acme GmbH","classification":{"is_in_scope":true,"service_category":"Hosting","is_online_platform":true,"is_marketplace":false,"is_search_engine":false,"is_vlop_vlose":false,"reasoning":"Stores and disseminates user content."},"obligation_analyses":[{"article":"Art. 16","title":"Notice and action","applies":true,"implications":"A reporting mechanism is required."}],"summary":"In scope as a hosting service."}}"#,
        r#"{"type":"done"}"#,
    ])
}

#[tokio::test]
async fn full_assessment_exact_match_flow() {
    let mut workflow = WorkflowController::new();
    workflow.set_identity(CompanyIdentity::new("acme", "Germany"));

    // Company matching: frames arrive in awkward 7-byte chunks.
    let mut decoder = EventStreamDecoder::from_chunks(chunked(&match_result_frames(), 7));
    for event in drain(&mut decoder).await {
        workflow.handle_match_event(&event).unwrap();
    }
    // Exact match confirmed without a user pick
    assert_eq!(workflow.phase(), &AssessmentPhase::DeepResearch);
    assert_eq!(workflow.company_name(), Some("Acme GmbH"));

    // Deep research, with a malformed frame injected mid-stream.
    let mut body = research_frames();
    let mut with_garbage = wire_body(&[r#"{"type":"token","content""#]); // truncated JSON
    with_garbage.extend_from_slice(&body);
    body = with_garbage;
    let mut decoder = EventStreamDecoder::from_chunks(chunked(&body, 13));
    for event in drain(&mut decoder).await {
        workflow.handle_research_event(&event).unwrap();
    }

    // Three distinct URLs despite the duplicate
    assert_eq!(workflow.sources().total(), 3);
    assert!(!workflow.sources().is_capped());
    // The finalize node was observed before the result arrived
    assert_eq!(workflow.tracker().phase(), ResearchPhase::Finalizing);
    assert_eq!(
        workflow.phase(),
        &AssessmentPhase::Review {
            section: Section::TerritorialScope
        }
    );

    // Section 1 and 2: accept everything.
    for _ in 0..2 {
        let session = workflow.current_review_mut().unwrap();
        for i in 0..session.findings().len() {
            session.accept(i).unwrap();
        }
        workflow.apply(WorkflowEvent::SectionApproved).unwrap();
    }

    // Section 3 holds the unanswered question: accept is refused, the edit
    // path starts from an empty buffer and upgrades the finding.
    let session = workflow.current_review_mut().unwrap();
    assert!(session.accept(0).is_err());
    session.begin_edit(0).unwrap();
    assert_eq!(session.edit().unwrap().buffer, "");
    session.set_edit_buffer("Cloud hosting for user websites").unwrap();
    session.save_edit().unwrap();
    workflow.apply(WorkflowEvent::SectionApproved).unwrap();
    assert_eq!(workflow.phase(), &AssessmentPhase::Classify);

    // The profile sent to the categorizer carries the user's answer.
    let profile = workflow.company_profile().unwrap();
    let answers = profile["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 3);
    assert!(answers
        .iter()
        .any(|a| a["answer"] == "Cloud hosting for user websites" && a["confidence"] == "High"));

    // Classification.
    let mut decoder = EventStreamDecoder::from_chunks(chunked(&classify_frames(), 32));
    for event in drain(&mut decoder).await {
        workflow.handle_classify_event(&event).unwrap();
    }
    assert_eq!(workflow.phase(), &AssessmentPhase::Report);
    let report = workflow.report().unwrap();
    assert!(report.classification.is_in_scope);
    assert_eq!(report.obligation_analyses.len(), 1);
}

#[tokio::test]
async fn research_failure_then_retry_resets_progress() {
    let mut workflow = WorkflowController::new();
    workflow.set_identity(CompanyIdentity::new("acme", "Germany"));
    let mut decoder = EventStreamDecoder::from_chunks(vec![match_result_frames()]);
    for event in drain(&mut decoder).await {
        workflow.handle_match_event(&event).unwrap();
    }

    let body = wire_body(&[
        r#"{"type":"tool_end","name":"web_search","sources":[{"url":"https://a.example"}]}"#,
        r#"{"type":"error","message":"research agent crashed"}"#,
        // Nothing after the terminal error may be observed
        r#"{"type":"tool_end","name":"web_search","sources":[{"url":"https://b.example"}]}"#,
    ]);
    let mut decoder = EventStreamDecoder::from_chunks(vec![body]);
    for event in drain(&mut decoder).await {
        workflow.handle_research_event(&event).unwrap();
    }
    assert_eq!(workflow.sources().total(), 1);
    match workflow.phase() {
        AssessmentPhase::PhaseError { phase, message } => {
            assert_eq!(**phase, AssessmentPhase::DeepResearch);
            assert_eq!(message, "research agent crashed");
        }
        other => panic!("unexpected phase {other:?}"),
    }

    workflow.apply(WorkflowEvent::Retry).unwrap();
    assert_eq!(workflow.phase(), &AssessmentPhase::DeepResearch);
    assert_eq!(workflow.sources().total(), 0);
    assert_eq!(workflow.tracker().phase(), ResearchPhase::Research);
}

#[tokio::test]
async fn chat_turn_carries_review_context() {
    let mut workflow = WorkflowController::new();
    workflow.set_identity(CompanyIdentity::new("acme", "Germany"));
    let mut decoder = EventStreamDecoder::from_chunks(vec![match_result_frames()]);
    for event in drain(&mut decoder).await {
        workflow.handle_match_event(&event).unwrap();
    }
    let mut decoder = EventStreamDecoder::from_chunks(vec![research_frames()]);
    for event in drain(&mut decoder).await {
        workflow.handle_research_event(&event).unwrap();
    }

    let context = ChatContext::capture(&workflow);
    assert_eq!(context.context_mode(), ContextMode::ReviewFindings);
    let rendered = context.render();
    assert!(rendered.contains("Current phase: Findings Review"));
    assert!(rendered.contains("Where is the service offered?"));
    // Only the visible section is in the snapshot
    assert!(!rendered.contains("How many employees?"));

    let mut chat = ChatSession::new();
    let reply_stream = EventStreamDecoder::from_chunks(vec![wire_body(&[
        r#"{"type":"tool_start","name":"dsa_lookup"}"#,
        r#"{"type":"token","content":"Territorial scope means "}"#,
        r#"{"type":"token","content":"the service reaches EU users."}"#,
        r#"{"type":"done"}"#,
    ])]);
    let reply = chat
        .run_turn("What does territorial scope mean?", reply_stream)
        .await
        .unwrap();
    assert_eq!(reply, "Territorial scope means the service reaches EU users.");
    assert_eq!(chat.messages().len(), 2);
    assert!(chat.current_tool().is_none());
}
