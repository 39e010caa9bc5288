//! 片段序列化
//!
//! [`Fragment`] 实现了 html5ever 的 `Serialize`，输出交给 html5ever 自带的
//! HTML 序列化器完成。源码中没有结束标签的元素不会被补上结束标签。

use std::io;

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};

use super::dom::{is_void_element, Fragment, Node};
use crate::translation::error::{TranslationError, TranslationResult};

impl Serialize for Fragment {
    fn serialize<S>(&self, serializer: &mut S, _traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        for child in &self.children {
            child.serialize(serializer, TraversalScope::IncludeNode)?;
        }
        Ok(())
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: &mut S, _traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match self {
            Node::Element(element) => {
                serializer.start_elem(
                    element.name.clone(),
                    element
                        .attrs
                        .iter()
                        .map(|attr| (&attr.name, &*attr.value)),
                )?;
                for child in &element.children {
                    child.serialize(serializer, TraversalScope::IncludeNode)?;
                }
                // 空元素的 end_elem 只弹出序列化器的栈，不输出结束标签
                if element.has_end_tag || is_void_element(&element.name.local) {
                    serializer.end_elem(element.name.clone())?;
                }
                Ok(())
            }
            Node::Text(text) | Node::RawText(text) => serializer.write_text(text),
            Node::Comment(text) => serializer.write_comment(text),
            Node::Doctype(name) => serializer.write_doctype(name),
            Node::EndTag(name) => serializer.end_elem(name.clone()),
        }
    }
}

/// 序列化片段
pub fn serialize_fragment(fragment: &Fragment) -> TranslationResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    let opts = SerializeOpts {
        // noscript 的内容按普通标记解析，因此需要转义
        scripting_enabled: false,
        // 多余的结束标签没有对应的开始标签
        create_missing_parent: true,
        ..SerializeOpts::default()
    };

    serialize(&mut buf, fragment, opts)
        .map_err(|e| TranslationError::SerializationError(format!("HTML序列化失败: {}", e)))?;

    String::from_utf8(buf)
        .map_err(|e| TranslationError::SerializationError(format!("HTML序列化结果不是UTF-8: {}", e)))
}
