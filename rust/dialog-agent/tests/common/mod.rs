#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dialog_agent::{
    Ntuple,
    analyzer::{Analyzer, AnalyzerError, FullParse, SemSpec},
    channel::Channels,
    diagnostic::RecordingDiagnostics,
    router::Router,
    select::Selector,
    sink::RecordingSink,
    span::{AlignedSpan, SpanDescriptor},
    specializer::{SpecializeError, Specializer},
};
use parking_lot::Mutex;
use serde_json::Value;

pub const FEDERATION: &str = "FED1";
pub const SOLVER: &str = "FED1_ProblemSolver";
pub const SPEECH: &str = "FED1_SpeechAgent";
pub const TEXT: &str = "FED1_TextAgent";

/// Answers utterances from a fixed script and records what it was asked.
#[derive(Clone, Default)]
pub struct ScriptedAnalyzer {
    script: Arc<HashMap<String, FullParse>>,
    asked: Arc<Mutex<Vec<String>>>,
}

impl ScriptedAnalyzer {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, FullParse)>,
    {
        ScriptedAnalyzer {
            script: Arc::new(
                script
                    .into_iter()
                    .map(|(utterance, parse)| (utterance.to_string(), parse))
                    .collect(),
            ),
            asked: Arc::default(),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn full_parse(&self, utterance: &str) -> Result<FullParse, AnalyzerError> {
        self.asked.lock().push(utterance.to_string());
        self.script
            .get(utterance)
            .cloned()
            .ok_or_else(|| AnalyzerError::Rejected(format!("no parse for '{utterance}'")))
    }

    async fn ping(&self) -> Result<(), AnalyzerError> {
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "scripted"
    }
}

/// Specializes mapping specs as-is and rejects any spec with `"reject": true`.
#[derive(Clone, Default)]
pub struct ScriptedSpecializer {
    debug: Arc<AtomicBool>,
    spans: Arc<Mutex<Vec<AlignedSpan>>>,
    attempts: Arc<Mutex<Vec<Value>>>,
}

impl ScriptedSpecializer {
    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::SeqCst)
    }

    pub fn spans(&self) -> Vec<AlignedSpan> {
        self.spans.lock().clone()
    }

    pub fn attempts(&self) -> Vec<Value> {
        self.attempts.lock().clone()
    }
}

impl Specializer for ScriptedSpecializer {
    fn set_spans(&mut self, spans: Vec<AlignedSpan>) {
        *self.spans.lock() = spans;
    }

    fn specialize(&mut self, spec: &SemSpec) -> Result<Ntuple, SpecializeError> {
        self.attempts.lock().push(spec.0.clone());
        if spec.0.get("reject") == Some(&Value::Bool(true)) {
            return Err(SpecializeError::NoTemplate(spec.0.to_string()));
        }
        if !spec.0.is_object() {
            return Err(SpecializeError::NotAMapping);
        }
        Ok(Ntuple::from(spec.0.clone()))
    }

    fn toggle_debug(&mut self) -> bool {
        !self.debug.fetch_xor(true, Ordering::SeqCst)
    }
}

/// A parse with one candidate per spec, each with an empty span list.
pub fn parse_of<I>(specs: I) -> FullParse
where
    I: IntoIterator<Item = Value>,
{
    let parse: Vec<SemSpec> = specs.into_iter().map(SemSpec).collect();
    let spans = vec![Vec::new(); parse.len()];
    FullParse { parse, spans }
}

/// A single-candidate parse with the given spans.
pub fn parse_with_spans(spec: Value, spans: Vec<SpanDescriptor>) -> FullParse {
    FullParse {
        parse: vec![SemSpec(spec)],
        spans: vec![spans],
    }
}

pub struct Harness {
    pub router: Router<ScriptedAnalyzer, ScriptedSpecializer, RecordingSink>,
    pub analyzer: ScriptedAnalyzer,
    pub specializer: ScriptedSpecializer,
    pub sink: RecordingSink,
    pub diagnostics: RecordingDiagnostics,
}

impl Harness {
    pub fn new(analyzer: ScriptedAnalyzer) -> Self {
        let specializer = ScriptedSpecializer::default();
        let sink = RecordingSink::new();
        let diagnostics = RecordingDiagnostics::new();

        let router = Router::new(
            Channels::for_federation(FEDERATION),
            Selector::new(analyzer.clone(), specializer.clone()),
            sink.clone(),
            Arc::new(diagnostics.clone()),
        );

        Harness {
            router,
            analyzer,
            specializer,
            sink,
            diagnostics,
        }
    }
}
