//! Expression builders - one per backend capability / 表达式构建器
//!
//! Builders are pure: same `StructuredQuery` in, same expression out.

use super::schema::{
    BooleanOp, KeywordBlock, KeywordGroup, MatchExpression, SearchField, StructuredQuery,
    SubstringFilter,
};
use super::tokenizer::phrase_words;

/// Escape character used by substring patterns (`LIKE ... ESCAPE '\'`)
pub const LIKE_ESCAPE: char = '\\';

/// Inverted-index engines (SQLite FTS5): `"exact phrase" term*` / 倒排索引表达式
pub struct RankedIndexBuilder;

impl RankedIndexBuilder {
    pub fn build(query: &StructuredQuery) -> MatchExpression {
        let mut tokens: Vec<String> = Vec::with_capacity(query.phrases.len() + query.terms.len());

        for phrase in &query.phrases {
            // FTS5 strings escape a quote by doubling it
            tokens.push(format!("\"{}\"", phrase.replace('"', "\"\"")));
        }
        for term in &query.terms {
            tokens.push(format!("{}*", term));
        }

        MatchExpression::RankedIndex(tokens.join(" "))
    }
}

/// Relational text-search engines (tsvector): plain text for the backend parser / 文本向量表达式
pub struct VectorTextBuilder;

impl VectorTextBuilder {
    pub fn build(query: &StructuredQuery) -> MatchExpression {
        let text = query
            .phrases
            .iter()
            .map(|p| format!("\"{}\"", p))
            .chain(query.terms.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");

        MatchExpression::VectorText(text)
    }
}

/// Substring-only engines: a boolean tree of per-field LIKE predicates / 子串匹配
pub struct SubstringBuilder;

impl SubstringBuilder {
    pub fn build(query: &StructuredQuery, op: BooleanOp) -> SubstringFilter {
        let mut groups = Vec::with_capacity(query.phrases.len() + query.terms.len());

        for term in &query.terms {
            groups.push(KeywordGroup {
                blocks: vec![keyword_block(term)],
            });
        }

        // No phrase support here: every word of the phrase must match
        for phrase in &query.phrases {
            let blocks: Vec<KeywordBlock> = phrase_words(phrase)
                .into_iter()
                .map(keyword_block)
                .collect();
            if !blocks.is_empty() {
                groups.push(KeywordGroup { blocks });
            }
        }

        SubstringFilter { groups, op }
    }
}

fn keyword_block(keyword: &str) -> KeywordBlock {
    KeywordBlock {
        keyword: keyword.to_string(),
        pattern: format!("%{}%", escape_like(&keyword.to_lowercase())),
        fields: SearchField::ALL.to_vec(),
    }
}

/// Escape `\`, `%` and `_` so LIKE treats them literally / 转义 LIKE 通配符
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tokenizer::parse;

    #[test]
    fn test_ranked_index_expression() {
        let expr = RankedIndexBuilder::build(&parse(r#""red shoes" nike air"#));
        assert_eq!(expr, MatchExpression::RankedIndex(r#""red shoes" nike* air*"#.to_string()));
    }

    #[test]
    fn test_ranked_index_empty_query() {
        let expr = RankedIndexBuilder::build(&parse("   "));
        assert!(expr.is_empty());
    }

    #[test]
    fn test_ranked_index_doubles_inner_quotes() {
        let query = StructuredQuery {
            phrases: vec![r#"12" pizza"#.to_string()],
            terms: vec![],
        };
        assert_eq!(RankedIndexBuilder::build(&query).as_str(), r#""12"" pizza""#);
    }

    #[test]
    fn test_vector_text_expression() {
        let expr = VectorTextBuilder::build(&parse(r#"nike "Red Shoes" running"#));
        assert_eq!(expr, MatchExpression::VectorText(r#""Red Shoes" nike running"#.to_string()));
        assert!(VectorTextBuilder::build(&parse("")).is_empty());
    }

    #[test]
    fn test_substring_term_blocks() {
        let filter = SubstringBuilder::build(&parse("red shoes"), BooleanOp::Or);
        assert_eq!(filter.op, BooleanOp::Or);
        assert_eq!(filter.groups.len(), 2);
        let block = &filter.groups[0].blocks[0];
        assert_eq!(block.keyword, "red");
        assert_eq!(block.pattern, "%red%");
        assert_eq!(block.fields, SearchField::ALL.to_vec());
    }

    #[test]
    fn test_substring_phrase_group() {
        let filter = SubstringBuilder::build(&parse(r#""Red Shoes""#), BooleanOp::Or);
        assert_eq!(filter.groups.len(), 1);
        let words: Vec<_> = filter.groups[0].blocks.iter().map(|b| b.keyword.as_str()).collect();
        assert_eq!(words, vec!["Red", "Shoes"]);
        let patterns: Vec<_> = filter.groups[0].blocks.iter().map(|b| b.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["%red%", "%shoes%"]);
    }

    #[test]
    fn test_substring_pattern_folds_unicode_case() {
        let filter = SubstringBuilder::build(&parse(r#""ÉCHARPE Ürün""#), BooleanOp::And);
        let patterns: Vec<_> = filter.groups[0].blocks.iter().map(|b| b.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["%écharpe%", "%ürün%"]);
    }

    #[test]
    fn test_substring_empty_query() {
        let filter = SubstringBuilder::build(&parse(""), BooleanOp::And);
        assert!(filter.is_empty());
        assert!(filter.groups.is_empty());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_off"), r"100\%\_off");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_substring_escapes_wildcards() {
        let filter = SubstringBuilder::build(&parse(r#""100%_off""#), BooleanOp::And);
        assert_eq!(filter.groups[0].blocks[0].pattern, r"%100\%\_off%");
    }
}
