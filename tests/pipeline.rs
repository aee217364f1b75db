//! End-to-end pipeline scenarios with mock adapters.

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use voicebrief::adapters::ServiceReply;
use voicebrief::compose::MAX_MESSAGE_CHARS;
use voicebrief::config::Config;
use voicebrief::domain::InboundEvent;
use voicebrief::pipeline::JobPipeline;

use common::{
    test_config, MockNotifier, MockSummarizer, MockTranscriber, ScriptedResponse, ScriptedStore,
};

struct Harness {
    pipeline: JobPipeline,
    store: Arc<ScriptedStore>,
    transcriber: Arc<MockTranscriber>,
    summarizer: Arc<MockSummarizer>,
    notifier: Arc<MockNotifier>,
    _temp: TempDir,
}

fn harness(
    config: Config,
    temp: TempDir,
    store: ScriptedStore,
    transcriber: Arc<MockTranscriber>,
    summarizer: Arc<MockSummarizer>,
    notifier: Arc<MockNotifier>,
) -> Harness {
    let store = Arc::new(store);
    let pipeline = JobPipeline::new(
        Arc::new(config),
        store.clone(),
        transcriber.clone(),
        summarizer.clone(),
        notifier.clone(),
    );
    Harness {
        pipeline,
        store,
        transcriber,
        summarizer,
        notifier,
        _temp: temp,
    }
}

fn happy_harness(config: Config, temp: TempDir) -> Harness {
    harness(
        config,
        temp,
        ScriptedStore::ready(b"audio-bytes"),
        MockTranscriber::replying(ServiceReply::Text("the full transcript text".to_string())),
        MockSummarizer::replying(ServiceReply::Text("A tidy summary.".to_string())),
        MockNotifier::ok(),
    )
}

#[tokio::test]
async fn success_delivers_summary_with_timing_and_releases_artifacts() {
    let temp = TempDir::new().unwrap();
    let h = happy_harness(test_config(&temp), temp);

    let report = h.pipeline.run(InboundEvent::audio("U1", "msg-1")).await;

    assert_eq!(report.outcome, "summarized");
    assert!(report.delivered);
    assert_eq!(h.notifier.calls(), 1);

    let message = h.notifier.last_message();
    assert!(message.starts_with("A tidy summary."));
    assert!(message.contains("⏱"));
    assert!(message.chars().count() <= MAX_MESSAGE_CHARS);

    // The summarizer saw the transcript, and the audio artifact is gone.
    assert_eq!(h.summarizer.inputs.lock().unwrap()[0], "the full transcript text");
    let audio_path = h.transcriber.seen_paths.lock().unwrap()[0].clone();
    assert!(!audio_path.exists());
}

#[tokio::test]
async fn success_with_public_base_url_links_the_transcript() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config(&temp);
    config.public_base_url = Some("https://bot.example.com".to_string());
    let transcripts_dir = config.transcripts_dir();
    let h = happy_harness(config, temp);

    let report = h.pipeline.run(InboundEvent::audio("U1", "msg-1")).await;

    let message = h.notifier.last_message();
    assert!(message.contains(&format!(
        "https://bot.example.com/static/transcripts/{}.txt",
        report.job_id
    )));

    // Default retention keeps the transcript so the link stays valid
    let transcript = transcripts_dir.join(format!("{}.txt", report.job_id));
    assert!(transcript.exists());
    assert_eq!(
        std::fs::read_to_string(transcript).unwrap(),
        "the full transcript text"
    );
}

#[tokio::test(start_paused = true)]
async fn fetch_exhaustion_skips_transcriber_and_summarizer() {
    let temp = TempDir::new().unwrap();
    let h = harness(
        test_config(&temp),
        temp,
        ScriptedStore::not_ready(5),
        MockTranscriber::replying(ServiceReply::Text(String::new())),
        MockSummarizer::replying(ServiceReply::Text(String::new())),
        MockNotifier::ok(),
    );

    let report = h.pipeline.run(InboundEvent::audio("U1", "msg-1")).await;

    assert_eq!(report.outcome, "content_unavailable");
    assert_eq!(h.store.calls(), 5);
    assert_eq!(h.transcriber.calls(), 0);
    assert_eq!(h.summarizer.calls(), 0);
    assert_eq!(h.notifier.calls(), 1);
    assert!(h.notifier.last_message().contains("202"));
}

#[tokio::test(start_paused = true)]
async fn permanent_fetch_error_reports_status_and_detail() {
    let temp = TempDir::new().unwrap();
    let h = harness(
        test_config(&temp),
        temp,
        ScriptedStore::new(vec![ScriptedResponse::Status(
            410,
            b"content expired".to_vec(),
        )]),
        MockTranscriber::replying(ServiceReply::Text(String::new())),
        MockSummarizer::replying(ServiceReply::Text(String::new())),
        MockNotifier::ok(),
    );

    h.pipeline.run(InboundEvent::audio("U1", "msg-1")).await;

    let message = h.notifier.last_message();
    assert!(message.contains("410"));
    assert!(message.contains("content expired"));
    assert_eq!(h.transcriber.calls(), 0);
}

#[tokio::test]
async fn degraded_transcription_skips_summarizer_and_carries_detail() {
    let temp = TempDir::new().unwrap();
    let h = harness(
        test_config(&temp),
        temp,
        ScriptedStore::ready(b"audio"),
        MockTranscriber::replying(ServiceReply::Degraded(
            "Expected key.size(2) == value.size(3)".to_string(),
        )),
        MockSummarizer::replying(ServiceReply::Text(String::new())),
        MockNotifier::ok(),
    );

    let report = h.pipeline.run(InboundEvent::audio("U1", "msg-1")).await;

    assert_eq!(report.outcome, "transcription_degraded");
    assert_eq!(h.summarizer.calls(), 0);
    let message = h.notifier.last_message();
    assert!(message.contains("Expected key.size(2) == value.size(3)"));
    assert!(message.contains("⏱"));
}

#[tokio::test]
async fn degraded_summary_falls_back_to_excerpt_without_base_url() {
    let temp = TempDir::new().unwrap();
    let h = harness(
        test_config(&temp),
        temp,
        ScriptedStore::ready(b"audio"),
        MockTranscriber::replying(ServiceReply::Text("what was actually said".to_string())),
        MockSummarizer::replying(ServiceReply::Degraded("no candidates".to_string())),
        MockNotifier::ok(),
    );

    let report = h.pipeline.run(InboundEvent::audio("U1", "msg-1")).await;

    assert_eq!(report.outcome, "summary_degraded");
    // Never link-less *and* excerpt-less: without a base URL the raw
    // transcript text must appear inline.
    assert!(h.notifier.last_message().contains("what was actually said"));
}

#[tokio::test]
async fn degraded_summary_links_transcript_when_configured() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config(&temp);
    config.public_base_url = Some("https://bot.example.com".to_string());
    let h = harness(
        config,
        temp,
        ScriptedStore::ready(b"audio"),
        MockTranscriber::replying(ServiceReply::Text("what was actually said".to_string())),
        MockSummarizer::replying(ServiceReply::Degraded("no candidates".to_string())),
        MockNotifier::ok(),
    );

    let report = h.pipeline.run(InboundEvent::audio("U1", "msg-1")).await;

    let message = h.notifier.last_message();
    assert!(message.contains(&format!("{}.txt", report.job_id)));
}

#[tokio::test]
async fn blocked_transcript_dir_downgrades_link_to_excerpt() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config(&temp);
    config.public_base_url = Some("https://bot.example.com".to_string());
    // Occupy the transcripts path with a regular file so persisting fails
    std::fs::create_dir_all(&config.static_dir).unwrap();
    std::fs::write(config.transcripts_dir(), b"in the way").unwrap();
    let h = harness(
        config,
        temp,
        ScriptedStore::ready(b"audio"),
        MockTranscriber::replying(ServiceReply::Text("what was actually said".to_string())),
        MockSummarizer::replying(ServiceReply::Degraded("no candidates".to_string())),
        MockNotifier::ok(),
    );

    let report = h.pipeline.run(InboundEvent::audio("U1", "msg-1")).await;

    // The run still completes and delivers; the transcript is surfaced as an
    // inline excerpt instead of the dead link.
    assert_eq!(report.outcome, "summary_degraded");
    assert!(report.delivered);
    let message = h.notifier.last_message();
    assert!(message.contains("what was actually said"));
    assert!(!message.contains(&format!("{}.txt", report.job_id)));
}

#[tokio::test]
async fn delivery_failure_is_absorbed_and_artifacts_still_release() {
    let temp = TempDir::new().unwrap();
    let h = harness(
        test_config(&temp),
        temp,
        ScriptedStore::ready(b"audio"),
        MockTranscriber::replying(ServiceReply::Text("transcript".to_string())),
        MockSummarizer::replying(ServiceReply::Text("summary".to_string())),
        MockNotifier::failing(),
    );

    let report = h.pipeline.run(InboundEvent::audio("U1", "msg-1")).await;

    assert!(!report.delivered);
    assert_eq!(h.notifier.calls(), 1);

    let audio_path = h.transcriber.seen_paths.lock().unwrap()[0].clone();
    assert!(!audio_path.exists());
}

#[tokio::test]
async fn file_event_keeps_its_extension_for_the_audio_artifact() {
    let temp = TempDir::new().unwrap();
    let h = happy_harness(test_config(&temp), temp);

    h.pipeline
        .run(InboundEvent::file("U1", "msg-1", "memo.mp3"))
        .await;

    let audio_path = h.transcriber.seen_paths.lock().unwrap()[0].clone();
    assert_eq!(
        audio_path.extension().and_then(|e| e.to_str()),
        Some("mp3")
    );
}

#[tokio::test]
async fn oversized_summary_is_truncated_with_suffix_intact() {
    let temp = TempDir::new().unwrap();
    let h = harness(
        test_config(&temp),
        temp,
        ScriptedStore::ready(b"audio"),
        MockTranscriber::replying(ServiceReply::Text("transcript".to_string())),
        MockSummarizer::replying(ServiceReply::Text("長".repeat(8000))),
        MockNotifier::ok(),
    );

    h.pipeline.run(InboundEvent::audio("U1", "msg-1")).await;

    let message = h.notifier.last_message();
    assert!(message.chars().count() <= MAX_MESSAGE_CHARS);
    assert!(message.contains("…(message truncated)"));
    // The timing suffix survives the cut
    assert!(message.rfind("⏱").unwrap() > message.rfind("truncated").unwrap());
}
