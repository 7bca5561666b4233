//! 评价文本解析 - 业务能力层
//!
//! 把 LLM 返回的原始文本逐行解析为 `FeedbackResult`。
//! 纯函数、不做 I/O、永不失败：缺失或无法识别的字段一律取默认值。

use regex::Regex;
use std::sync::OnceLock;

use crate::models::question::{is_valid_score, FeedbackResult, DEFAULT_SCORE, PLACEHOLDER};

const SCORE_PREFIX: &str = "SCORE:";
const GRAMMAR_PREFIX: &str = "GRAMMAR:";
const FLUENCY_PREFIX: &str = "FLUENCY:";
const SUGGESTIONS_PREFIX: &str = "SUGGESTIONS:";

fn leading_number() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+(?:\.\d+)?").ok())
        .as_ref()
}

/// 解析评价文本
///
/// 规则：
/// - 每行去掉首尾空白后按前缀匹配（不区分大小写）
/// - `SCORE:` 取值开头的数字（`8`、`8.5`、`8/10`），不在 0-10 内则取默认值
/// - `GRAMMAR:` / `FLUENCY:` 取剩余文本
/// - `SUGGESTIONS:` 吸收其后直到结尾的所有非空行
/// - 同一前缀出现多次时以第一次为准
pub fn parse_feedback(raw: &str) -> FeedbackResult {
    let mut score: Option<f64> = None;
    let mut grammar: Option<String> = None;
    let mut fluency: Option<String> = None;
    let mut suggestions: Option<Vec<String>> = None;

    let mut lines = raw.lines().map(str::trim);
    while let Some(line) = lines.next() {
        if let Some(value) = strip_prefix_ci(line, SCORE_PREFIX) {
            if score.is_none() {
                score = Some(parse_score(value));
            }
        } else if let Some(value) = strip_prefix_ci(line, GRAMMAR_PREFIX) {
            if grammar.is_none() {
                grammar = non_empty(value);
            }
        } else if let Some(value) = strip_prefix_ci(line, FLUENCY_PREFIX) {
            if fluency.is_none() {
                fluency = non_empty(value);
            }
        } else if let Some(value) = strip_prefix_ci(line, SUGGESTIONS_PREFIX) {
            // 建议段一直延续到文本结束
            let items: Vec<String> = std::iter::once(value)
                .chain(lines.by_ref())
                .map(strip_bullet)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect();
            if !items.is_empty() {
                suggestions = Some(items);
            }
            break;
        }
    }

    FeedbackResult {
        grammar: grammar.unwrap_or_else(|| PLACEHOLDER.to_string()),
        fluency: fluency.unwrap_or_else(|| PLACEHOLDER.to_string()),
        suggestions: suggestions.unwrap_or_else(|| vec![PLACEHOLDER.to_string()]),
        score: score.unwrap_or(DEFAULT_SCORE),
    }
}

/// 解析分数，失败或越界都退回默认值
fn parse_score(value: &str) -> f64 {
    leading_number()
        .and_then(|re| re.find(value.trim()))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|s| is_valid_score(*s))
        .unwrap_or(DEFAULT_SCORE)
}

/// 不区分大小写地去掉行首前缀，返回去空白后的剩余部分
pub(crate) fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(line[prefix.len()..].trim())
    } else {
        None
    }
}

fn strip_bullet(item: &str) -> &str {
    item.trim()
        .trim_start_matches(['-', '*', '•'])
        .trim_start()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
