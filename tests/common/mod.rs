// 集成测试公共模块
//
// 提供可脚本化的假后端、测试配置和常用断言

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use translation_manager::translation::{
    TranslationBackend, TranslationConfig, TranslationError, TranslationResult,
    TranslationService,
};

/// 一次后端调用的记录
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub text: String,
    pub lang: String,
    pub at: Instant,
}

/// 可脚本化的假后端
///
/// - 命中词典时返回对应译文，否则返回 `"{lang}:{text}"`
/// - `failures` 中的文本总是返回指定错误
/// - `fail_first` 让前 n 次调用失败
/// - `delay` 模拟后端耗时
pub struct FakeBackend {
    dictionary: HashMap<String, String>,
    failures: HashMap<String, TranslationError>,
    fail_first: usize,
    fail_with: Option<TranslationError>,
    delay: Duration,
    calls: AtomicUsize,
    log: Mutex<Vec<RecordedCall>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            dictionary: HashMap::new(),
            failures: HashMap::new(),
            fail_first: 0,
            fail_with: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// 预设的越南语词典
    pub fn vietnamese() -> Self {
        Self::new()
            .with_translation("Hello", "Xin chào")
            .with_translation("World", "Thế giới")
    }

    pub fn with_translation(mut self, text: &str, translated: &str) -> Self {
        self.dictionary.insert(text.to_string(), translated.to_string());
        self
    }

    pub fn failing_on(mut self, text: &str, error: TranslationError) -> Self {
        self.failures.insert(text.to_string(), error);
        self
    }

    /// 所有调用都失败
    pub fn always_failing(mut self, error: TranslationError) -> Self {
        self.fail_first = usize::MAX;
        self.fail_with = Some(error);
        self
    }

    pub fn failing_first(mut self, count: usize, error: TranslationError) -> Self {
        self.fail_first = count;
        self.fail_with = Some(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.text).collect()
    }
}

#[async_trait]
impl TranslationBackend for FakeBackend {
    async fn translate(&self, text: &str, target_lang: &str) -> TranslationResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(RecordedCall {
            text: text.to_string(),
            lang: target_lang.to_string(),
            at: Instant::now(),
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(error) = self.failures.get(text) {
            return Err(error.clone());
        }
        if call < self.fail_first {
            if let Some(error) = &self.fail_with {
                return Err(error.clone());
            }
        }

        Ok(self
            .dictionary
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("{}:{}", target_lang, text)))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// 测试配置构建器
pub struct TestConfigBuilder {
    config: TranslationConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: TranslationConfig::default(),
        }
    }

    pub fn concurrency(mut self, limit: usize) -> Self {
        self.config.max_concurrent_requests = limit;
        self
    }

    pub fn max_retries(mut self, retries: usize) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn timeout_ms(mut self, millis: u64) -> Self {
        self.config.request_timeout_ms = millis;
        self
    }

    pub fn max_flush_wait_ms(mut self, millis: u64) -> Self {
        self.config.max_flush_wait_ms = millis;
        self
    }

    pub fn short_content_threshold(mut self, threshold: usize) -> Self {
        self.config.short_content_threshold = threshold;
        self
    }

    pub fn build(self) -> TranslationConfig {
        self.config
    }
}

/// 测试环境：服务和它背后的假后端
pub struct TestEnvironment {
    pub service: TranslationService,
    pub backend: Arc<FakeBackend>,
}

impl TestEnvironment {
    pub fn new(backend: FakeBackend) -> Self {
        Self::with_config(backend, TranslationConfig::default())
    }

    pub fn with_config(backend: FakeBackend, config: TranslationConfig) -> Self {
        let backend = Arc::new(backend);
        let service = TranslationService::new(config, backend.clone())
            .expect("service should be created inside a tokio runtime");
        Self { service, backend }
    }
}

/// 记录回调结果的收集器
#[derive(Clone, Default)]
pub struct CallbackRecorder {
    values: Arc<Mutex<Vec<String>>>,
}

impl CallbackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> impl FnOnce(String) + Send + 'static {
        let values = self.values.clone();
        move |value| values.lock().unwrap().push(value)
    }

    pub fn values(&self) -> Vec<String> {
        self.values.lock().unwrap().clone()
    }
}

/// 按源码顺序列出所有开始/结束标签及其属性
///
/// 直接对原始字符串分词，不经过任何树构建，标签的增删都会体现在结果里。
pub fn tag_sequence(html: &str) -> Vec<String> {
    use std::cell::RefCell;

    use html5ever::tendril::StrTendril;
    use html5ever::tokenizer::states::RawKind;
    use html5ever::tokenizer::{
        BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
    };

    #[derive(Default)]
    struct TagCollector {
        tags: RefCell<Vec<String>>,
    }

    impl TokenSink for TagCollector {
        type Handle = ();

        fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
            if let Token::TagToken(tag) = token {
                match tag.kind {
                    TagKind::StartTag => {
                        let attrs: Vec<String> = tag
                            .attrs
                            .iter()
                            .map(|attr| format!("{}={:?}", attr.name.local, &*attr.value))
                            .collect();
                        self.tags
                            .borrow_mut()
                            .push(format!("<{} {}>", tag.name, attrs.join(" ")));

                        match &*tag.name {
                            "script" => return TokenSinkResult::RawData(RawKind::ScriptData),
                            "style" => return TokenSinkResult::RawData(RawKind::Rawtext),
                            _ => {}
                        }
                    }
                    TagKind::EndTag => self.tags.borrow_mut().push(format!("</{}>", tag.name)),
                }
            }
            TokenSinkResult::Continue
        }
    }

    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));
    let tokenizer = Tokenizer::new(TagCollector::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();

    tokenizer.sink.tags.take()
}

/// 常用断言
pub struct AssertionHelper;

impl AssertionHelper {
    /// 两段 HTML 的标签序列（标签名、属性、顺序）完全一致
    pub fn assert_same_markup(original: &str, translated: &str) {
        assert_eq!(
            tag_sequence(original),
            tag_sequence(translated),
            "markup changed during translation"
        );
    }
}
