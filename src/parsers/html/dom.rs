//! HTML片段的树形表示
//!
//! 片段只经过 html5ever 的分词器，不经过树构建器：不会补出 `<html>`、`<tbody>`
//! 之类的隐含标签，也不会丢弃放错位置的标签。树只按源码中实际出现的开始/结束
//! 标签嵌套，未闭合的元素保持未闭合，多余的结束标签原样保留。

use std::cell::RefCell;

use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::{local_name, namespace_url, ns, LocalName};

/// 解析后的HTML片段（若干个顶层节点）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pub children: Vec<Node>,
}

/// 片段中的节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// 可翻译的字符数据
    Text(String),
    /// `script`、`style` 等原始文本元素的内容
    RawText(String),
    Comment(String),
    Doctype(String),
    /// 没有对应开始标签的结束标签
    EndTag(QualName),
}

/// 元素节点：名称、有序属性列表和有序子节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QualName,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    /// 源码中是否写了结束标签（空元素恒为 false）
    pub has_end_tag: bool,
}

impl Element {
    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    /// 获取属性值
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| &*attr.name.local == name)
            .map(|attr| &*attr.value)
    }
}

impl Fragment {
    /// 片段中元素节点的总数（递归）
    pub fn element_count(&self) -> usize {
        count_elements(&self.children)
    }
}

fn count_elements(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::Element(element) => 1 + count_elements(&element.children),
            _ => 0,
        })
        .sum()
}

/// 没有结束标签、也不能有子节点的元素
pub fn is_void_element(name: &LocalName) -> bool {
    matches!(
        *name,
        local_name!("area")
            | local_name!("base")
            | local_name!("basefont")
            | local_name!("bgsound")
            | local_name!("br")
            | local_name!("col")
            | local_name!("embed")
            | local_name!("frame")
            | local_name!("hr")
            | local_name!("img")
            | local_name!("input")
            | local_name!("keygen")
            | local_name!("link")
            | local_name!("meta")
            | local_name!("param")
            | local_name!("source")
            | local_name!("track")
            | local_name!("wbr")
    )
}

/// 开始标签之后分词器应切换到的状态
///
/// `noscript` 按普通标记处理，序列化时相应地关闭 scripting。
fn text_mode(name: &LocalName) -> TokenSinkResult<()> {
    match *name {
        local_name!("script") => TokenSinkResult::RawData(RawKind::ScriptData),
        local_name!("style")
        | local_name!("xmp")
        | local_name!("iframe")
        | local_name!("noembed")
        | local_name!("noframes") => TokenSinkResult::RawData(RawKind::Rawtext),
        local_name!("title") | local_name!("textarea") => TokenSinkResult::RawData(RawKind::Rcdata),
        local_name!("plaintext") => TokenSinkResult::Plaintext,
        _ => TokenSinkResult::Continue,
    }
}

#[derive(Default)]
struct FragmentBuilder {
    root: Vec<Node>,
    open: Vec<Element>,
    raw_text: bool,
}

impl FragmentBuilder {
    fn current(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some(element) => &mut element.children,
            None => &mut self.root,
        }
    }

    fn push_text(&mut self, text: &str) {
        let raw = self.raw_text;
        let nodes = self.current();

        // 分词器会把连续文本拆成多段
        if let Some(last) = nodes.last_mut() {
            if let (Node::Text(existing), false) | (Node::RawText(existing), true) = (last, raw) {
                existing.push_str(text);
                return;
            }
        }

        if raw {
            nodes.push(Node::RawText(text.to_string()));
        } else {
            nodes.push(Node::Text(text.to_string()));
        }
    }

    fn start_tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        let void = is_void_element(&tag.name);
        let mode = if void {
            TokenSinkResult::Continue
        } else {
            text_mode(&tag.name)
        };

        let element = Element {
            name: QualName::new(None, ns!(html), tag.name),
            attrs: tag.attrs,
            children: Vec::new(),
            has_end_tag: false,
        };

        if void {
            self.current().push(Node::Element(element));
        } else {
            // 非空元素上的 `/>` 没有意义，按开始标签处理
            self.open.push(element);
            self.raw_text = matches!(
                mode,
                TokenSinkResult::Plaintext
                    | TokenSinkResult::RawData(RawKind::ScriptData | RawKind::Rawtext)
            );
        }

        mode
    }

    fn end_tag(&mut self, tag: Tag) {
        self.raw_text = false;

        match self
            .open
            .iter()
            .rposition(|element| element.name.local == tag.name)
        {
            Some(index) => {
                // 中间未闭合的元素只是结束了作用范围，不补结束标签
                while self.open.len() > index + 1 {
                    self.close_top(false);
                }
                self.close_top(true);
            }
            None => {
                let name = QualName::new(None, ns!(html), tag.name);
                self.current().push(Node::EndTag(name));
            }
        }
    }

    fn close_top(&mut self, has_end_tag: bool) {
        if let Some(mut element) = self.open.pop() {
            element.has_end_tag = has_end_tag;
            self.current().push(Node::Element(element));
        }
    }

    fn finish(mut self) -> Fragment {
        while !self.open.is_empty() {
            self.close_top(false);
        }
        Fragment {
            children: self.root,
        }
    }
}

#[derive(Default)]
struct FragmentSink {
    builder: RefCell<FragmentBuilder>,
}

impl TokenSink for FragmentSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut builder = self.builder.borrow_mut();

        match token {
            Token::TagToken(tag) => {
                if tag.kind == TagKind::StartTag {
                    return builder.start_tag(tag);
                }
                builder.end_tag(tag);
            }
            Token::CharacterTokens(text) => builder.push_text(&text),
            Token::NullCharacterToken => builder.push_text("\0"),
            Token::CommentToken(text) => builder.current().push(Node::Comment(text.to_string())),
            Token::DoctypeToken(doctype) => {
                let name = doctype.name.map(|name| name.to_string()).unwrap_or_default();
                builder.current().push(Node::Doctype(name));
            }
            Token::ParseError(_) | Token::EOFToken => {}
        }

        TokenSinkResult::Continue
    }
}

/// 将HTML片段解析为 [`Fragment`]
///
/// 分词不会失败：不规范的标记按源码中的标签逐个保留。
pub fn html_to_fragment(content: &str) -> Fragment {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(content));

    let tokenizer = Tokenizer::new(
        FragmentSink::default(),
        TokenizerOpts {
            discard_bom: false,
            ..TokenizerOpts::default()
        },
    );
    let _ = tokenizer.feed(&input);
    tokenizer.end();

    tokenizer.sink.builder.take().finish()
}
