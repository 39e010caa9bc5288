//! # 解析器模块
//!
//! 目前只包含 HTML 片段的解析、遍历和序列化，见 [`html`]。

pub mod html;

pub use html::{collect_texts, html_to_fragment, rewrite_texts, serialize_fragment, Fragment};
