//! HTML片段解析和处理模块
//!
//! - `utils`: 文本工具函数
//! - `dom`: 片段树定义与分词解析
//! - `walker`: 文本节点收集与改写
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;
pub mod utils;
pub mod walker;

pub use dom::{html_to_fragment, is_void_element, Element, Fragment, Node};
pub use serializer::serialize_fragment;
pub use utils::split_whitespace_edges;
pub use walker::{collect_texts, rewrite_texts};
