//! 片段遍历
//!
//! 深度优先收集可翻译的文本节点，并在拿到译文后原地改写它们。
//! 跳过列表中的元素（默认 `script`、`style`）及其所有后代都不参与，
//! 原始文本元素的内容本身也不是可翻译文本。

use super::dom::{Fragment, Node};
use super::utils::split_whitespace_edges;

/// 按文档顺序收集所有非空白文本节点的修剪后内容
pub fn collect_texts(fragment: &Fragment, skip_elements: &[String]) -> Vec<String> {
    let mut texts = Vec::new();
    collect_from(&fragment.children, skip_elements, &mut texts);
    texts
}

fn collect_from(nodes: &[Node], skip_elements: &[String], texts: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                let (_, core, _) = split_whitespace_edges(text);
                if !core.is_empty() {
                    texts.push(core.to_string());
                }
            }
            Node::Element(element) => {
                if !is_skipped(element.local_name(), skip_elements) {
                    collect_from(&element.children, skip_elements, texts);
                }
            }
            _ => {}
        }
    }
}

/// 改写文本节点
///
/// `translate` 接收修剪后的文本，返回替换内容；两端原有的空白会被保留。
/// 返回 `None` 表示保持原样。遍历顺序与 [`collect_texts`] 相同。
pub fn rewrite_texts<F>(fragment: &mut Fragment, skip_elements: &[String], translate: &mut F) -> usize
where
    F: FnMut(&str) -> Option<String>,
{
    rewrite_in(&mut fragment.children, skip_elements, translate)
}

fn rewrite_in<F>(nodes: &mut [Node], skip_elements: &[String], translate: &mut F) -> usize
where
    F: FnMut(&str) -> Option<String>,
{
    let mut rewritten = 0;

    for node in nodes.iter_mut() {
        match node {
            Node::Text(text) => {
                let (leading, core, trailing) = split_whitespace_edges(text);
                if core.is_empty() {
                    continue;
                }
                if let Some(replacement) = translate(core) {
                    *text = format!("{}{}{}", leading, replacement, trailing);
                    rewritten += 1;
                }
            }
            Node::Element(element) => {
                if !is_skipped(element.local_name(), skip_elements) {
                    rewritten += rewrite_in(&mut element.children, skip_elements, translate);
                }
            }
            _ => {}
        }
    }

    rewritten
}

fn is_skipped(name: &str, skip_elements: &[String]) -> bool {
    skip_elements
        .iter()
        .any(|skip| skip.eq_ignore_ascii_case(name))
}
