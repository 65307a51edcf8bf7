use crate::cursor::TokenMatcher;
use super::tag::{parse_tag, TagValue};
use crate::locator::doc_tag_multiline_value;
use crate::token::{TokenKind, Tokens};

/// One tag of a doc comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTag {
    /// Index of the `@tag` token.
    pub index: usize,
    /// Tag name including `@`.
    pub name: String,
    /// Index of the body string on the tag's line, if any.
    pub value_index: Option<usize>,
    /// Parsed body.
    pub value: TagValue,
    /// The body was reassembled from continuation lines.
    pub multiline: bool,
}

impl DocTag {
    /// Tag name without `@`, lowercased.
    #[must_use]
    pub fn base_name(&self) -> String {
        self.name.trim_start_matches('@').to_ascii_lowercase()
    }
}

/// A doc comment read from the token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocBlock {
    /// Index of `/**`.
    pub opener: usize,
    /// Index of `*/`.
    pub closer: usize,
    /// Free text before the first tag, lines joined with a space.
    pub summary: String,
    /// Tags in written order.
    pub tags: Vec<DocTag>,
}

impl DocBlock {
    /// Reads the doc comment opened at `opener`.
    ///
    /// Returns `None` when `opener` is not a doc-comment opener.
    #[must_use]
    pub fn read(tokens: &Tokens, opener: usize) -> Option<Self> {
        let open = tokens.get(opener)?;
        if open.kind != TokenKind::DocCommentOpenTag {
            return None;
        }
        let closer = open.comment_closer?;

        let first_tag = open.comment_tags.first().copied().unwrap_or(closer);
        let summary = tokens.as_slice()[opener + 1..first_tag]
            .iter()
            .filter(|t| t.kind == TokenKind::DocCommentString)
            .map(|t| t.content.trim())
            .collect::<Vec<_>>()
            .join(" ");

        let tags = open
            .comment_tags
            .iter()
            .map(|&index| read_tag(tokens, index, closer))
            .collect();

        Some(Self {
            opener,
            closer,
            summary,
            tags,
        })
    }

    /// Tags with the given name (with or without `@`, case-insensitive).
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DocTag> + 'a {
        let wanted = name.trim_start_matches('@');
        self.tags
            .iter()
            .filter(move |t| t.name.trim_start_matches('@').eq_ignore_ascii_case(wanted))
    }

    /// Returns true if the comment has a tag with the given name.
    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags_named(name).next().is_some()
    }

    /// The `@param` tag documenting `variable` (with `$`).
    #[must_use]
    pub fn param_tag(&self, variable: &str) -> Option<&DocTag> {
        self.tags_named("param").find(|t| {
            t.value
                .typed()
                .and_then(super::tag::TypedValue::variable)
                .is_some_and(|v| v == variable)
        })
    }

    /// Returns true when the comment's tags include `@inheritDoc`, either as a
    /// tag or inline in the summary.
    #[must_use]
    pub fn inherits_doc(&self) -> bool {
        self.has_tag("inheritdoc") || self.summary.to_ascii_lowercase().contains("{@inheritdoc}")
    }
}

fn read_tag(tokens: &Tokens, index: usize, closer: usize) -> DocTag {
    let name = tokens[index].content.clone();
    let line = tokens[index].line;

    let value_index = tokens
        .find_next(TokenKind::DocCommentWhitespace.negate(), index + 1, Some(closer))
        .filter(|&i| tokens[i].kind == TokenKind::DocCommentString && tokens[i].line == line);
    let body = value_index.map_or("", |i| tokens[i].content.as_str());

    let mut value = parse_tag(&name, body);
    let mut multiline = false;
    if let TagValue::Invalid {
        continues: true, ..
    } = value
    {
        if let Some(joined) = doc_tag_multiline_value(tokens, index) {
            value = parse_tag(&name, &joined);
            multiline = true;
        }
    }

    DocTag {
        index,
        name,
        value_index,
        value,
        multiline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(src: &str) -> (Tokens, DocBlock) {
        let tokens = Tokens::tokenize(src);
        let opener = tokens
            .find_next(TokenKind::DocCommentOpenTag, 0, None)
            .unwrap();
        let block = DocBlock::read(&tokens, opener).unwrap();
        (tokens, block)
    }

    #[test]
    fn test_read_block() {
        let (tokens, block) = read(
            "<?php\n/**\n * Finds a node.\n * Second line.\n *\n * @param int $id The id\n * @param string $name\n * @return Node|null\n */\n",
        );
        assert_eq!(block.summary, "Finds a node. Second line.");
        assert_eq!(block.tags.len(), 3);
        assert_eq!(block.tags_named("param").count(), 2);
        assert!(block.has_tag("@return"));

        let name = block.param_tag("$name").unwrap();
        assert_eq!(tokens.content(name.value_index.unwrap()), "string $name");
        assert!(block.param_tag("$missing").is_none());
    }

    #[test]
    fn test_tag_without_body() {
        let (_, block) = read("<?php\n/**\n * @inheritDoc\n */\n");
        assert_eq!(block.tags[0].value_index, None);
        assert!(block.inherits_doc());
    }

    #[test]
    fn test_multiline_tag_is_reassembled() {
        let (_, block) = read(
            "<?php\n/**\n * @param array{\n *     foo: int\n * } $x\n */\n",
        );
        let tag = &block.tags[0];
        assert!(tag.multiline);
        let typed = tag.value.typed().unwrap();
        assert_eq!(typed.type_expr.to_string(), "array{ foo: int }");
        assert_eq!(typed.variable(), Some("$x"));
    }

    #[test]
    fn test_read_rejects_non_opener() {
        let tokens = Tokens::tokenize("<?php\n$a = 1;\n");
        assert_eq!(DocBlock::read(&tokens, 0), None);
    }
}
