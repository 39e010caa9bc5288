/// 拆分文本两端的空白，返回 (前导空白, 正文, 尾随空白)
pub fn split_whitespace_edges(text: &str) -> (&str, &str, &str) {
    let trimmed_start = text.trim_start();
    let leading = &text[..text.len() - trimmed_start.len()];
    let core = trimmed_start.trim_end();
    let trailing = &trimmed_start[core.len()..];
    (leading, core, trailing)
}
