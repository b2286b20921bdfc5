// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use datadash_app::{AnalysisResult, ChatMessage, Dataset, RequestId};
use datadash_llm::{AnalysisUnavailable, Analyst};
use std::io::BufRead;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, warn};

pub const LLM_DISABLED_MESSAGE: &str =
    "AI analysis is disabled. Set [llm] enabled = true in the config to turn it on.";

/// Everything the shell loop reacts to, from stdin or from a worker thread.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    Input(String),
    InputClosed,
    AnalysisFinished {
        request_id: RequestId,
        result: Result<AnalysisResult, String>,
    },
    ChatFinished {
        request_id: RequestId,
        result: Result<String, String>,
    },
}

impl RuntimeEvent {
    pub const fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::AnalysisFinished { request_id, .. } | Self::ChatFinished { request_id, .. } => {
                Some(*request_id)
            }
            Self::Input(_) | Self::InputClosed => None,
        }
    }
}

/// Stands in for the model client when `[llm] enabled = false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAnalyst;

impl Analyst for DisabledAnalyst {
    fn analyze(&self, _dataset: &Dataset) -> Result<AnalysisResult, AnalysisUnavailable> {
        Err(AnalysisUnavailable::new(LLM_DISABLED_MESSAGE))
    }

    fn chat(
        &self,
        _dataset: &Dataset,
        _analysis: &AnalysisResult,
        _transcript: &[ChatMessage],
    ) -> Result<String, AnalysisUnavailable> {
        Err(AnalysisUnavailable::new(LLM_DISABLED_MESSAGE))
    }
}

/// Owns the event channel. Model calls run on their own thread and report
/// back through it, so the shell never blocks on the network.
pub struct Runtime {
    tx: Sender<RuntimeEvent>,
    rx: Receiver<RuntimeEvent>,
    analyst: Arc<dyn Analyst>,
}

impl Runtime {
    pub fn new(analyst: Arc<dyn Analyst>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, analyst }
    }

    /// Forwards lines from `reader` until EOF, then sends `InputClosed`.
    pub fn spawn_input_reader<R>(&self, reader: R)
    where
        R: BufRead + Send + 'static,
    {
        let tx = self.tx.clone();
        thread::spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(error) => {
                        warn!(%error, "stopped reading input");
                        break;
                    }
                };
                if tx.send(RuntimeEvent::Input(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(RuntimeEvent::InputClosed);
        });
    }

    pub fn spawn_analysis(&self, request_id: RequestId, dataset: Dataset) {
        let tx = self.tx.clone();
        let analyst = Arc::clone(&self.analyst);
        thread::spawn(move || {
            debug!(request = %request_id, rows = dataset.row_count(), "analysis worker started");
            let result = analyst
                .analyze(&dataset)
                .map_err(|error| error.to_string());
            let _ = tx.send(RuntimeEvent::AnalysisFinished { request_id, result });
        });
    }

    pub fn spawn_chat(
        &self,
        request_id: RequestId,
        dataset: Dataset,
        analysis: AnalysisResult,
        transcript: Vec<ChatMessage>,
    ) {
        let tx = self.tx.clone();
        let analyst = Arc::clone(&self.analyst);
        thread::spawn(move || {
            debug!(request = %request_id, turns = transcript.len(), "chat worker started");
            let result = analyst
                .chat(&dataset, &analysis, &transcript)
                .map_err(|error| error.to_string());
            let _ = tx.send(RuntimeEvent::ChatFinished { request_id, result });
        });
    }

    /// Blocks until the next event.
    pub fn next_event(&self) -> Option<RuntimeEvent> {
        self.rx.recv().ok()
    }

    #[cfg(test)]
    pub fn next_event_within(&self, timeout: std::time::Duration) -> Option<RuntimeEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{DisabledAnalyst, LLM_DISABLED_MESSAGE, Runtime, RuntimeEvent};
    use datadash_app::{AnalysisResult, ChatMessage, Dataset, RequestId};
    use datadash_llm::{AnalysisUnavailable, Analyst};
    use datadash_testkit::{sample_analysis, stock_rows};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    /// Answers from canned results and remembers the transcripts it saw.
    #[derive(Default)]
    pub(crate) struct ScriptedAnalyst {
        pub(crate) analysis: Option<AnalysisResult>,
        pub(crate) reply: Option<String>,
        pub(crate) transcripts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedAnalyst {
        pub(crate) fn answering(analysis: AnalysisResult, reply: &str) -> Self {
            Self {
                analysis: Some(analysis),
                reply: Some(reply.to_owned()),
                transcripts: Mutex::new(Vec::new()),
            }
        }
    }

    impl Analyst for ScriptedAnalyst {
        fn analyze(&self, _dataset: &Dataset) -> Result<AnalysisResult, AnalysisUnavailable> {
            self.analysis
                .clone()
                .ok_or_else(|| AnalysisUnavailable::new("scripted analysis failure"))
        }

        fn chat(
            &self,
            _dataset: &Dataset,
            _analysis: &AnalysisResult,
            transcript: &[ChatMessage],
        ) -> Result<String, AnalysisUnavailable> {
            if let Ok(mut seen) = self.transcripts.lock() {
                seen.push(transcript.to_vec());
            }
            self.reply
                .clone()
                .ok_or_else(|| AnalysisUnavailable::new("scripted chat failure"))
        }
    }

    #[test]
    fn input_reader_forwards_lines_then_closes() {
        let runtime = Runtime::new(Arc::new(DisabledAnalyst));
        runtime.spawn_input_reader(Cursor::new("show\nsort price\n"));

        assert_eq!(
            runtime.next_event_within(WAIT),
            Some(RuntimeEvent::Input("show".to_owned()))
        );
        assert_eq!(
            runtime.next_event_within(WAIT),
            Some(RuntimeEvent::Input("sort price".to_owned()))
        );
        assert_eq!(runtime.next_event_within(WAIT), Some(RuntimeEvent::InputClosed));
    }

    #[test]
    fn analysis_worker_reports_under_its_request_id() {
        let analyst = ScriptedAnalyst::answering(sample_analysis(), "ok");
        let runtime = Runtime::new(Arc::new(analyst));
        runtime.spawn_analysis(RequestId::new(7), stock_rows());

        let event = runtime.next_event_within(WAIT);
        assert_eq!(
            event,
            Some(RuntimeEvent::AnalysisFinished {
                request_id: RequestId::new(7),
                result: Ok(sample_analysis()),
            })
        );
        assert_eq!(
            event.and_then(|event| event.request_id()),
            Some(RequestId::new(7))
        );
    }

    #[test]
    fn chat_worker_passes_the_transcript_and_stringifies_failures() {
        let analyst = Arc::new(ScriptedAnalyst::default());
        let runtime = Runtime::new(analyst.clone());
        let transcript = vec![ChatMessage::user("what is low?")];
        runtime.spawn_chat(
            RequestId::new(3),
            stock_rows(),
            sample_analysis(),
            transcript.clone(),
        );

        assert_eq!(
            runtime.next_event_within(WAIT),
            Some(RuntimeEvent::ChatFinished {
                request_id: RequestId::new(3),
                result: Err("scripted chat failure".to_owned()),
            })
        );
        let seen = analyst
            .transcripts
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default();
        assert_eq!(seen, vec![transcript]);
    }

    #[test]
    fn disabled_analyst_explains_how_to_enable() {
        let err = DisabledAnalyst
            .analyze(&stock_rows())
            .expect_err("disabled analyst never answers");
        assert_eq!(err.to_string(), LLM_DISABLED_MESSAGE);
        assert!(err.to_string().contains("[llm] enabled = true"));
    }

    #[test]
    fn input_events_carry_no_request_id() {
        assert_eq!(RuntimeEvent::Input("x".to_owned()).request_id(), None);
        assert_eq!(RuntimeEvent::InputClosed.request_id(), None);
    }
}
