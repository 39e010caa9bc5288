//! 翻译管道集成测试
//!
//! 覆盖从请求合并到批次分发、缓存写入和 HTML 片段翻译的端到端流程

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;

use translation_manager::translation::PreloadEntry;

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{AssertionHelper, CallbackRecorder, FakeBackend, TestConfigBuilder, TestEnvironment};

#[tokio::test(start_paused = true)]
async fn test_single_request_is_translated_and_cached() {
    let env = TestEnvironment::new(FakeBackend::vietnamese());

    let translated = env.service.translate("Hello", "vi").await;

    assert_eq!(translated, "Xin chào");
    assert_eq!(env.backend.call_count(), 1);
    assert_eq!(env.backend.calls()[0].lang, "vi");
    assert_eq!(env.service.cache_size(), 1);
    assert_eq!(
        env.service.cached_translation("Hello", "vi").as_deref(),
        Some("Xin chào")
    );
}

#[tokio::test(start_paused = true)]
async fn test_cached_request_is_answered_synchronously() {
    let env = TestEnvironment::new(FakeBackend::vietnamese());
    env.service.translate("Hello", "vi").await;

    let recorder = CallbackRecorder::new();
    env.service
        .request_translation("Hello", "vi", recorder.callback());

    // 没有任何 await，回调已经执行
    assert_eq!(recorder.values(), vec!["Xin chào"]);
    assert_eq!(env.backend.call_count(), 1);
    assert_eq!(env.service.pending_count(), 0);
    assert_eq!(env.service.get_stats().cache_hits, 1);
}

#[tokio::test(start_paused = true)]
async fn test_identical_requests_are_coalesced() {
    let env = TestEnvironment::new(FakeBackend::vietnamese());

    let results = join_all((0..5).map(|_| env.service.translate("Hello", "vi"))).await;

    assert!(results.iter().all(|result| result == "Xin chào"));
    assert_eq!(env.backend.call_count(), 1);

    let stats = env.service.get_stats();
    assert_eq!(stats.enqueued, 1);
    assert_eq!(stats.coalesced, 4);
    assert_eq!(stats.flushes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_callbacks_fan_out_from_one_pending_item() {
    let env = TestEnvironment::new(FakeBackend::vietnamese());
    let recorder = CallbackRecorder::new();

    for _ in 0..3 {
        env.service
            .request_translation("World", "vi", recorder.callback());
    }
    assert_eq!(env.service.pending_count(), 1);
    assert!(env.service.is_flush_scheduled());

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(recorder.values(), vec!["Thế giới"; 3]);
    assert_eq!(env.backend.call_count(), 1);
    assert!(!env.service.is_flush_scheduled());
}

#[tokio::test(start_paused = true)]
async fn test_same_text_different_languages_are_separate_jobs() {
    let env = TestEnvironment::new(FakeBackend::new());

    let (vi, en) = tokio::join!(
        env.service.translate("Bonjour", "vi"),
        env.service.translate("Bonjour", "en")
    );

    assert_eq!(vi, "vi:Bonjour");
    assert_eq!(en, "en:Bonjour");
    assert_eq!(env.backend.call_count(), 2);
    assert_eq!(env.service.cache_size(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_batches_into_chunks() {
    let config = TestConfigBuilder::new().concurrency(3).build();
    let env = TestEnvironment::with_config(FakeBackend::new(), config);
    let texts: Vec<String> = (1..=5).map(|i| format!("Job title {}", i)).collect();

    let start = Instant::now();
    let results = join_all(texts.iter().map(|text| env.service.translate(text, "vi"))).await;

    assert_eq!(results[4], "vi:Job title 5");

    let stats = env.service.get_stats();
    assert_eq!(stats.flushes, 1);
    assert_eq!(stats.chunks, 2);
    assert_eq!(stats.backend_calls, 5);

    // 第一块在防抖到期时发出，第二块在块间隔之后发出
    let calls = env.backend.calls();
    for call in &calls[..3] {
        let offset = call.at - start;
        assert!(offset >= Duration::from_millis(50) && offset < Duration::from_millis(60));
    }
    for call in &calls[3..] {
        let offset = call.at - start;
        assert!(offset >= Duration::from_millis(100) && offset < Duration::from_millis(115));
    }
    // 块内按入队顺序分发
    assert_eq!(calls[0].text, "Job title 1");
    assert_eq!(calls[3].text, "Job title 4");
}

#[tokio::test(start_paused = true)]
async fn test_requests_after_flush_start_a_new_cycle() {
    let env = TestEnvironment::new(FakeBackend::new());

    env.service.translate("first", "vi").await;
    env.service.translate("second", "vi").await;

    assert_eq!(env.service.get_stats().flushes, 2);
}

#[tokio::test(start_paused = true)]
async fn test_bounded_deferral_flushes_a_continuous_stream() {
    let config = TestConfigBuilder::new().max_flush_wait_ms(200).build();
    let env = TestEnvironment::with_config(FakeBackend::new(), config);
    let first_resolved = Arc::new(Mutex::new(None));

    let start = Instant::now();
    for i in 0..20 {
        let slot = first_resolved.clone();
        let callback = move |_value: String| {
            if i == 0 {
                *slot.lock().unwrap() = Some(Instant::now());
            }
        };
        env.service
            .request_translation(&format!("stream item {}", i), "vi", callback);
        // 间隔小于防抖延迟，防抖定时器不断被重置
        tokio::time::sleep(Duration::from_millis(40)).await;
    }
    env.service.flush_now().await;

    let resolved_at = first_resolved
        .lock()
        .unwrap()
        .expect("first request should be resolved");
    assert!(resolved_at - start <= Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_deferral_waits_for_quiet_period() {
    let config = TestConfigBuilder::new().max_flush_wait_ms(0).build();
    let env = TestEnvironment::with_config(FakeBackend::new(), config);
    let recorder = CallbackRecorder::new();

    for i in 0..10 {
        env.service
            .request_translation(&format!("stream item {}", i), "vi", recorder.callback());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(recorder.values().is_empty());
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(recorder.values().len(), 10);
    assert_eq!(env.service.get_stats().flushes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_flush_now_resolves_immediately() {
    let env = TestEnvironment::new(FakeBackend::vietnamese());
    let recorder = CallbackRecorder::new();

    env.service
        .request_translation("Hello", "vi", recorder.callback());
    let report = env.service.flush_now().await;

    assert_eq!(report.items, 1);
    assert_eq!(report.translated, 1);
    assert_eq!(recorder.values(), vec!["Xin chào"]);
    assert!(!env.service.is_flush_scheduled());

    // 队列已空，再次刷新什么也不做
    assert_eq!(env.service.flush_now().await.items, 0);
}

#[tokio::test(start_paused = true)]
async fn test_preloaded_translations_skip_the_backend() {
    let env = TestEnvironment::new(FakeBackend::new());

    let loaded = env.service.preload_translations(vec![
        PreloadEntry::new("Apply now", "vi", "Ứng tuyển ngay"),
        PreloadEntry::new("Salary", "vi", "Mức lương"),
    ]);

    assert_eq!(loaded, 2);
    assert_eq!(env.service.cache_size(), 2);
    assert_eq!(env.service.translate("Apply now", "vi").await, "Ứng tuyển ngay");
    assert_eq!(env.backend.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_content_never_reaches_the_queue() {
    let env = TestEnvironment::new(FakeBackend::new());
    let recorder = CallbackRecorder::new();

    env.service.request_translation("", "vi", recorder.callback());

    assert_eq!(recorder.values(), vec![""]);
    assert_eq!(env.service.pending_count(), 0);
    assert_eq!(env.service.translate_html("", "vi").await, "");
    assert_eq!(env.backend.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_short_html_is_translated_as_one_string() {
    let env = TestEnvironment::new(FakeBackend::new());
    let html = "<b>Senior</b> engineer";

    let translated = env.service.translate_html(html, "vi").await;

    assert_eq!(translated, format!("vi:{}", html));
    assert_eq!(env.backend.texts(), vec![html]);
}

#[tokio::test(start_paused = true)]
async fn test_markup_is_preserved_per_text_node() {
    let config = TestConfigBuilder::new().short_content_threshold(10).build();
    let env = TestEnvironment::with_config(FakeBackend::vietnamese(), config);
    let html = "<p>Hello <b>World</b></p>";

    let translated = env.service.translate_html(html, "vi").await;

    assert_eq!(translated, "<p>Xin chào <b>Thế giới</b></p>");
    AssertionHelper::assert_same_markup(html, &translated);

    let mut texts = env.backend.texts();
    texts.sort();
    assert_eq!(texts, vec!["Hello", "World"]);
}

#[tokio::test(start_paused = true)]
async fn test_table_markup_gets_no_implied_tags() {
    let config = TestConfigBuilder::new().short_content_threshold(0).build();
    let env = TestEnvironment::with_config(FakeBackend::vietnamese(), config);
    let html = "<table><tr><td>Hello</td><td>World</td></tr></table>";

    let translated = env.service.translate_html(html, "vi").await;

    assert_eq!(
        translated,
        "<table><tr><td>Xin chào</td><td>Thế giới</td></tr></table>"
    );
    AssertionHelper::assert_same_markup(html, &translated);
}

#[tokio::test(start_paused = true)]
async fn test_context_dependent_fragments_keep_their_tags() {
    let config = TestConfigBuilder::new().short_content_threshold(0).build();
    let env = TestEnvironment::with_config(FakeBackend::vietnamese(), config);

    for (html, expected) in [
        ("<tr><td>Hello</td></tr>", "<tr><td>Xin chào</td></tr>"),
        ("<li>Hello</li><li>World</li>", "<li>Xin chào</li><li>Thế giới</li>"),
        (
            "<html><body><p>Hello</p></body></html>",
            "<html><body><p>Xin chào</p></body></html>",
        ),
        ("<ul><li>Hello<li>World</ul>", "<ul><li>Xin chào<li>Thế giới</ul>"),
    ] {
        let translated = env.service.translate_html(html, "vi").await;

        assert_eq!(translated, expected);
        AssertionHelper::assert_same_markup(html, &translated);
    }
}

#[tokio::test(start_paused = true)]
async fn test_nested_fragment_above_default_threshold() {
    let env = TestEnvironment::new(FakeBackend::vietnamese());
    let html = concat!(
        r#"<div class="greeting" data-source="recruitment-platform/job-board" "#,
        r#"title="Welcome message">Hello <span>World</span></div>"#
    );
    assert!(html.chars().count() >= 100);

    let translated = env.service.translate_html(html, "vi").await;

    assert_eq!(
        translated,
        concat!(
            r#"<div class="greeting" data-source="recruitment-platform/job-board" "#,
            r#"title="Welcome message">Xin chào <span>Thế giới</span></div>"#
        )
    );
}

#[tokio::test(start_paused = true)]
async fn test_small_threshold_fragment() {
    let config = TestConfigBuilder::new().short_content_threshold(1).build();
    let env = TestEnvironment::with_config(FakeBackend::vietnamese(), config);

    let translated = env
        .service
        .translate_html("<div>Hello <span>World</span></div>", "vi")
        .await;

    assert_eq!(translated, "<div>Xin chào <span>Thế giới</span></div>");
}

#[tokio::test(start_paused = true)]
async fn test_whitespace_nodes_and_skip_elements_are_not_sent() {
    let config = TestConfigBuilder::new().short_content_threshold(0).build();
    let env = TestEnvironment::with_config(FakeBackend::vietnamese(), config);
    let html = "<style>p { color: red }</style>\n<ul>\n  <li>Hello</li>\n  <li>World</li>\n</ul>\n<script>var greeting = \"Hello\";</script>";

    let translated = env.service.translate_html(html, "vi").await;

    assert_eq!(
        translated,
        "<style>p { color: red }</style>\n<ul>\n  <li>Xin chào</li>\n  <li>Thế giới</li>\n</ul>\n<script>var greeting = \"Hello\";</script>"
    );
    assert_eq!(env.backend.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_texts_in_fragment_share_one_request() {
    let config = TestConfigBuilder::new().short_content_threshold(0).build();
    let env = TestEnvironment::with_config(FakeBackend::new(), config);

    let translated = env
        .service
        .translate_html("<ul><li>Apply</li><li> Apply </li><li>Save</li></ul>", "vi")
        .await;

    assert_eq!(
        translated,
        "<ul><li>vi:Apply</li><li> vi:Apply </li><li>vi:Save</li></ul>"
    );
    assert_eq!(env.backend.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fragment_without_text_is_returned_unchanged() {
    let config = TestConfigBuilder::new().short_content_threshold(0).build();
    let env = TestEnvironment::with_config(FakeBackend::new(), config);
    let html = r#"<img src="logo.png" alt="Logo"><br>"#;

    assert_eq!(env.service.translate_html(html, "vi").await, html);
    assert_eq!(env.backend.call_count(), 0);
}
