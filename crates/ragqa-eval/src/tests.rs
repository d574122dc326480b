//! Tests for the batch runner, dataset files, judges and harness

#[cfg(test)]
mod batch_tests {
    use crate::{BatchOptions, BatchRunner, ColumnMapping, ColumnPresence};
    use async_trait::async_trait;
    use insta::assert_yaml_snapshot;
    use ragqa_core::{Error, ErrorKind, Flow, FlowInput, FlowOutput, Result, Snippet};
    use serde_json::{Value, json};

    struct ScriptedFlow {
        fail_on: Vec<&'static str>,
        answer_column: &'static str,
    }

    impl ScriptedFlow {
        fn new(fail_on: Vec<&'static str>) -> Self {
            Self {
                fail_on,
                answer_column: "answer",
            }
        }
    }

    #[async_trait]
    impl Flow for ScriptedFlow {
        async fn invoke(&self, input: &FlowInput) -> Result<FlowOutput> {
            if self.fail_on.contains(&input.question.as_str()) {
                return Err(Error::RetrievalFailed("index unreachable".to_string()));
            }

            let mut output = FlowOutput::new();
            output.insert(
                self.answer_column.to_string(),
                Value::String(format!("answer to {}", input.question)),
            );
            output.insert("context".to_string(), json!([format!("doc for {}", input.question)]));
            Ok(output)
        }
    }

    fn dataset(questions: &[&str]) -> Vec<FlowInput> {
        questions.iter().map(|q| FlowInput::new(*q)).collect()
    }

    #[tokio::test]
    async fn test_failed_row_does_not_abort_batch() {
        let flow = ScriptedFlow::new(vec!["q2"]);
        let run = BatchRunner::new(&flow)
            .run(&dataset(&["q1", "q2", "q3"]))
            .await
            .unwrap();

        assert_eq!(run.succeeded_count(), 2);
        assert_eq!(run.failed_count(), 1);
        assert!(run.rows[0].succeeded());
        assert!(run.rows[2].succeeded());

        let failures: Vec<_> = run.failures().map(|(i, f)| (i, f.kind)).collect();
        assert_eq!(failures, vec![(1, ErrorKind::RetrievalFailed)]);
        assert_yaml_snapshot!(run.rows[1].status, @r###"
        status: failed
        failure:
          kind: RetrievalFailed
          message: "Retrieval failed: index unreachable"
        "###);

        assert_eq!(
            run.presence(),
            vec![
                ColumnPresence { index: 0, answer: true, context: true },
                ColumnPresence { index: 1, answer: false, context: false },
                ColumnPresence { index: 2, answer: true, context: true },
            ]
        );

        let records = run.into_response_records().unwrap();
        let questions: Vec<_> = records.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, vec!["q1", "q3"]);
        assert_eq!(records[1].answer, "answer to q3");
        assert_eq!(records[1].context.snippets(), &[Snippet::text("doc for q3")]);
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_on_first_failure() {
        let flow = ScriptedFlow::new(vec!["q2"]);
        let err = BatchRunner::new(&flow)
            .with_options(BatchOptions {
                fail_fast: true,
                ..Default::default()
            })
            .run(&dataset(&["q1", "q2", "q3"]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RetrievalFailed);
    }

    #[tokio::test]
    async fn test_missing_output_column_is_reported_once() {
        let flow = ScriptedFlow {
            fail_on: Vec::new(),
            answer_column: "response",
        };
        let run = BatchRunner::new(&flow)
            .run(&dataset(&["q1", "q2"]))
            .await
            .unwrap();

        assert_eq!(run.missing_columns(), vec!["answer".to_string()]);
        match run.into_response_records() {
            Err(Error::MissingOutputColumns(columns)) => assert_eq!(columns, vec!["answer".to_string()]),
            other => panic!("expected MissingOutputColumns, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_column_mapping_renames_outputs() {
        let flow = ScriptedFlow {
            fail_on: Vec::new(),
            answer_column: "response",
        };
        let run = BatchRunner::new(&flow)
            .with_options(BatchOptions {
                fail_fast: false,
                columns: ColumnMapping {
                    answer: "response".to_string(),
                    context: "context".to_string(),
                },
            })
            .run(&dataset(&["q1"]))
            .await
            .unwrap();

        let records = run.into_response_records().unwrap();
        assert_eq!(records[0].answer, "answer to q1");
    }

    #[tokio::test]
    async fn test_all_rows_failing_is_a_batch_error() {
        let flow = ScriptedFlow::new(vec!["q1", "q2"]);
        let run = BatchRunner::new(&flow)
            .run(&dataset(&["q1", "q2"]))
            .await
            .unwrap();

        let err = run.into_response_records().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Batch);
    }

    #[tokio::test]
    async fn test_empty_dataset_is_rejected() {
        let flow = ScriptedFlow::new(Vec::new());
        let err = BatchRunner::new(&flow).run(&[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_rows_keep_dataset_order_through_dyn_flow() {
        let flow = ScriptedFlow::new(Vec::new());
        let dyn_flow: &dyn Flow = &flow;
        let run = BatchRunner::new(dyn_flow)
            .run(&dataset(&["c", "a", "b"]))
            .await
            .unwrap();

        let order: Vec<_> = run.rows.iter().map(|r| r.input.question.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }
}

#[cfg(test)]
mod dataset_tests {
    use crate::{parse_jsonl, read_dataset, read_evaluation_records, write_responses};
    use ragqa_core::{DocumentContext, ErrorKind, FlowInput, ResponseRecord, Snippet};
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_read_dataset_defaults_chat_history() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"question": "What is the size of the moon?"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"question": "And the sun?", "chat_history": [{{"role": "user"}}], "truth": "big"}}"#
        )
        .unwrap();

        let rows = read_dataset(file.path()).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], FlowInput::new("What is the size of the moon?"));
        assert_eq!(rows[1].chat_history, vec![json!({"role": "user"})]);
    }

    #[test]
    fn test_row_without_question_is_rejected() {
        let err = parse_jsonl::<FlowInput>("{\"question\": \"ok\"}\n{\"query\": \"bad\"}\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn test_response_file_round_trip() {
        let records = vec![
            ResponseRecord {
                question: "What is the size of the moon?".to_string(),
                chat_history: Vec::new(),
                answer: "About 3,474 km.".to_string(),
                context: DocumentContext::fallback(),
            },
            ResponseRecord {
                question: "Who landed first?".to_string(),
                chat_history: vec![json!({"inputs": {"question": "hi"}})],
                answer: String::new(),
                context: DocumentContext::new(vec![
                    Snippet::text("Apollo 11 landed in 1969.").with_score(3.25).with_source("apollo.md"),
                ]),
            },
        ];

        let file = NamedTempFile::new().unwrap();
        write_responses(file.path(), &records).await.unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let first_line = content.lines().next().unwrap();
        assert_eq!(
            first_line,
            r#"{"question":"What is the size of the moon?","chat_history":[],"answer":"About 3,474 km.","context":["No relevant context found."]}"#
        );

        let back = read_evaluation_records(file.path()).await.unwrap();
        assert_eq!(back.len(), 2);
        for (original, read) in records.iter().zip(&back) {
            assert_eq!(read.question, original.question);
            assert_eq!(read.chat_history, original.chat_history);
            assert_eq!(read.answer, original.answer);
            assert_eq!(read.context, original.context);
        }
    }
}

#[cfg(test)]
mod judge_tests {
    use crate::{JudgeKind, PromptJudge, default_judges, parse_rating};
    use async_trait::async_trait;
    use ragqa_core::{
        ChatMessage, DocumentContext, ErrorKind, EvaluationRecord, GenerationConfig,
        GenerationResult, Judge, LLMProvider, Result, Snippet,
    };
    use std::sync::Arc;

    struct FixedReply(&'static str);

    #[async_trait]
    impl LLMProvider for FixedReply {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _config: &GenerationConfig,
        ) -> Result<GenerationResult> {
            Ok(GenerationResult {
                text: self.0.to_string(),
                model_id: "judge".to_string(),
                tokens_used: None,
            })
        }

        fn model_id(&self) -> &str {
            "judge"
        }
    }

    fn record() -> EvaluationRecord {
        EvaluationRecord {
            question: "What is the size of the moon?".to_string(),
            chat_history: Vec::new(),
            answer: "About 3,474 km across.".to_string(),
            context: DocumentContext::new(vec![Snippet::text("The moon is 3,474 km in diameter.")]),
        }
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("4"), Some(4.0));
        assert_eq!(parse_rating("Rating: 5 stars"), Some(5.0));
        assert_eq!(parse_rating("3.5"), Some(3.5));
        assert_eq!(parse_rating("10/10"), None);
        assert_eq!(parse_rating("no idea"), None);
    }

    #[test]
    fn test_prompts_include_context_only_where_needed() {
        let grounded = JudgeKind::Groundedness.prompt(&record());
        assert!(grounded[1].content.contains("The moon is 3,474 km in diameter."));

        let fluency = JudgeKind::Fluency.prompt(&record());
        assert!(!fluency[1].content.contains("CONTEXT"));
        assert!(fluency[1].content.contains("About 3,474 km across."));
    }

    #[tokio::test]
    async fn test_prompt_judge_scores() {
        let judge = PromptJudge::new(JudgeKind::Relevance, Arc::new(FixedReply("Rating: 4")));
        assert_eq!(judge.metric(), "gpt_relevance");
        assert_eq!(judge.score(&record()).await.unwrap(), 4.0);
    }

    #[tokio::test]
    async fn test_prompt_judge_without_rating_fails() {
        let judge = PromptJudge::new(JudgeKind::Coherence, Arc::new(FixedReply("I cannot say.")));
        let err = judge.score(&record()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Judge);
    }

    #[test]
    fn test_default_judges() {
        let judges = default_judges(Arc::new(FixedReply("5")));
        let names: Vec<_> = judges.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Coherence", "Fluency", "Groundedness", "Relevance"]);
        assert_eq!(judges["Groundedness"].metric(), "gpt_groundedness");
    }
}

#[cfg(test)]
mod harness_tests {
    use crate::{EvaluationHarness, JudgeSet, evaluation_name, read_report};
    use async_trait::async_trait;
    use ragqa_core::{
        DocumentContext, Error, ErrorKind, EvaluationRecord, EvaluationReport, Judge,
        ReportPublisher, Result,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// One point per word, capped at 5
    struct WordCountJudge;

    #[async_trait]
    impl Judge for WordCountJudge {
        fn metric(&self) -> &str {
            "word_count"
        }

        async fn score(&self, record: &EvaluationRecord) -> Result<f64> {
            Ok(record.answer.split_whitespace().count().min(5) as f64)
        }
    }

    /// Fails on empty answers
    struct PickyJudge;

    #[async_trait]
    impl Judge for PickyJudge {
        fn metric(&self) -> &str {
            "picky"
        }

        async fn score(&self, record: &EvaluationRecord) -> Result<f64> {
            if record.answer.is_empty() {
                Err(Error::Judge("nothing to rate".to_string()))
            } else {
                Ok(3.0)
            }
        }
    }

    struct CountingPublisher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingPublisher {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReportPublisher for CountingPublisher {
        async fn publish(&self, report: &EvaluationReport) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Network("project service unreachable".to_string()))
            } else {
                Ok(format!("https://example.com/runs/{}", report.run_id))
            }
        }
    }

    fn judges() -> JudgeSet {
        let mut judges = JudgeSet::new();
        judges.insert("Fluency".to_string(), Arc::new(WordCountJudge) as Arc<dyn Judge>);
        judges.insert("Groundedness".to_string(), Arc::new(PickyJudge) as Arc<dyn Judge>);
        judges
    }

    fn records() -> Vec<EvaluationRecord> {
        [("q1", "one two three"), ("q2", ""), ("q3", "a b c d e f g")]
            .into_iter()
            .map(|(question, answer)| EvaluationRecord {
                question: question.to_string(),
                chat_history: Vec::new(),
                answer: answer.to_string(),
                context: DocumentContext::fallback(),
            })
            .collect()
    }

    #[test]
    fn test_evaluation_name() {
        assert_eq!(evaluation_name("241016093000"), "241016093000 Quality Evaluation");
    }

    #[tokio::test]
    async fn test_scores_and_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let harness = EvaluationHarness::new(judges()).with_output_path(dir.path().join("report.json"));

        let outcome = harness.evaluate("test", &records()).await.unwrap();

        let fluency = &outcome.report.evaluators["Fluency"];
        assert_eq!(fluency.metric, "word_count");
        assert_eq!(fluency.rows, vec![Some(3.0), Some(0.0), Some(5.0)]);
        assert_eq!(fluency.aggregate, Some(8.0 / 3.0));

        let grounded = &outcome.report.evaluators["Groundedness"];
        assert_eq!(grounded.rows, vec![Some(3.0), None, Some(3.0)]);
        assert_eq!(grounded.failed_rows, 1);
        assert_eq!(grounded.aggregate, Some(3.0));

        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.degraded);
    }

    #[tokio::test]
    async fn test_publish_failure_retries_once_locally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qa_flow_quality_eval.json");
        let publisher = CountingPublisher::new(true);
        let harness = EvaluationHarness::new(judges())
            .with_output_path(&path)
            .with_publisher(publisher.clone());

        let outcome = harness.evaluate("241016 Quality Evaluation", &records()).await.unwrap();

        assert_eq!(outcome.attempts, 2);
        assert!(outcome.degraded);
        assert_eq!(publisher.calls(), 1);
        assert!(outcome.report.published_url.is_none());

        let written = read_report(&path).await.unwrap();
        assert_eq!(written.evaluation_name, "241016 Quality Evaluation");
        assert_eq!(written.rows.len(), 3);
        assert_eq!(written.metrics(), outcome.report.metrics());
    }

    #[tokio::test]
    async fn test_successful_publish_records_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let publisher = CountingPublisher::new(false);
        let harness = EvaluationHarness::new(judges())
            .with_output_path(&path)
            .with_publisher(publisher.clone());

        let outcome = harness.evaluate("test", &records()).await.unwrap();

        assert_eq!(outcome.attempts, 1);
        assert_eq!(publisher.calls(), 1);
        let url = outcome.report.published_url.clone().unwrap();
        assert!(url.ends_with(&outcome.report.run_id.to_string()));
        assert_eq!(read_report(&path).await.unwrap().published_url, Some(url));
    }

    #[tokio::test]
    async fn test_evaluation_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let harness = EvaluationHarness::new(judges()).with_output_path(dir.path().join("report.json"));
        let input = records();

        let first = harness.evaluate("test", &input).await.unwrap();
        let second = harness.evaluate("test", &input).await.unwrap();

        assert_eq!(first.report.metrics(), second.report.metrics());
    }

    /// Always fails, as when the judge endpoint is down
    struct UnreachableJudge;

    #[async_trait]
    impl Judge for UnreachableJudge {
        fn metric(&self) -> &str {
            "unreachable"
        }

        async fn score(&self, _record: &EvaluationRecord) -> Result<f64> {
            Err(Error::Judge("judge deployment returned 401".to_string()))
        }
    }

    #[tokio::test]
    async fn test_no_scored_rows_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let publisher = CountingPublisher::new(false);
        let mut judges = JudgeSet::new();
        for name in ["Coherence", "Fluency", "Groundedness", "Relevance"] {
            judges.insert(name.to_string(), Arc::new(UnreachableJudge) as Arc<dyn Judge>);
        }
        let harness = EvaluationHarness::new(judges)
            .with_output_path(&path)
            .with_publisher(publisher.clone());

        let err = harness.evaluate("test", &records()[..2]).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Evaluation);
        assert!(err.to_string().contains("no judge produced a score"));
        assert_eq!(publisher.calls(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_local_failure_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = CountingPublisher::new(true);
        let harness = EvaluationHarness::new(judges())
            .with_output_path(dir.path().join("report.json"))
            .with_publisher(publisher.clone());

        let err = harness.evaluate("test", &[]).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Evaluation);
        assert_eq!(publisher.calls(), 0);
    }

    #[tokio::test]
    async fn test_unwritable_output_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let harness = EvaluationHarness::new(judges())
            .with_output_path(dir.path().join("missing").join("report.json"));

        let err = harness.evaluate("test", &records()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
