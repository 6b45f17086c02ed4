//! Query parser - splits raw user input into exact phrases and bare terms / 查询解析
//!
//! - Text between double quotes becomes a phrase (case preserved) / 引号内为短语
//! - Everything else is split into Unicode word runs, lowercased / 其余按单词切分
//! - An unterminated quote is plain text / 未闭合的引号按普通文本处理
//!
//! Parsing is total: any input, however odd, yields a `StructuredQuery`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::schema::StructuredQuery;

/// Closed quote pairs, left to right / 成对引号
static PHRASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("static regex"));

/// Unicode letters, digits and underscore / Unicode 单词字符
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("static regex"));

/// Parse a raw query / 解析查询
pub fn parse(raw: &str) -> StructuredQuery {
    let mut query = StructuredQuery::default();

    for cap in PHRASE_RE.captures_iter(raw) {
        let phrase = cap[1].trim();
        if !phrase.is_empty() {
            push_unique(&mut query.phrases, phrase.to_string());
        }
    }

    // Replace with a space so words on both sides of a phrase stay apart
    let remainder = PHRASE_RE.replace_all(raw, " ");

    for m in WORD_RE.find_iter(&remainder) {
        let term = m.as_str().to_lowercase();
        if !term.is_empty() {
            push_unique(&mut query.terms, term);
        }
    }

    query
}

/// Split a phrase into whitespace separated words / 将短语按空白切分
pub fn phrase_words(phrase: &str) -> Vec<&str> {
    phrase.split_whitespace().collect()
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
