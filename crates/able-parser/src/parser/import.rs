//! `import` / `dynimport` clause parsing
//!
//! Grammar: `<dotted.path>[.{Name [as Alias], ...} | .*] [as Alias] [;]`

use super::{is_identifier, ParseError};
use crate::ast::{ImportSelector, ImportStatement, NodeIds};

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    As,
    Dot,
    LBrace,
    RBrace,
    Comma,
    Star,
    Semi,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    column: usize,
    len: usize,
}

struct Cursor<'a> {
    tokens: Vec<Token>,
    pos: usize,
    keyword: &'a str,
    line: usize,
    end_column: usize,
}

/// Parse the clause following an import keyword.
///
/// `column` is the 1-based column of the first character of `clause`.
pub(crate) fn parse_import_clause(
    ids: &mut NodeIds,
    keyword: &str,
    clause: &str,
    line: usize,
    column: usize,
) -> Result<ImportStatement, ParseError> {
    let tokens = tokenize(clause, line, column)?;
    let mut cursor = Cursor {
        tokens,
        pos: 0,
        keyword,
        line,
        end_column: column + clause.chars().count(),
    };

    let id = ids.next_id();
    let first = cursor.expect_ident("expected package path")?;
    let mut package_path = vec![ids.ident(first)];
    let mut is_wildcard = false;
    let mut selectors = Vec::new();

    while cursor.eat(&TokenKind::Dot) {
        match cursor.peek_kind() {
            Some(TokenKind::Ident(_)) => {
                let segment = cursor.expect_ident("expected identifier")?;
                package_path.push(ids.ident(segment));
            },
            Some(TokenKind::Star) => {
                cursor.pos += 1;
                is_wildcard = true;
                break;
            },
            Some(TokenKind::LBrace) => {
                cursor.pos += 1;
                selectors = parse_selectors(ids, &mut cursor)?;
                break;
            },
            _ => return Err(cursor.error("expected identifier, `{` or `*` after `.`")),
        }
    }

    let alias = if cursor.eat(&TokenKind::As) {
        let name = cursor.expect_ident("expected alias after `as`")?;
        Some(ids.ident(name))
    } else {
        None
    };

    cursor.eat(&TokenKind::Semi);
    if cursor.peek_kind().is_some() {
        return Err(cursor.error("unexpected token"));
    }

    Ok(ImportStatement {
        id,
        package_path,
        is_wildcard,
        selectors,
        alias,
        line,
    })
}

fn parse_selectors(ids: &mut NodeIds, cursor: &mut Cursor<'_>) -> Result<Vec<ImportSelector>, ParseError> {
    if cursor.peek_kind() == Some(&TokenKind::RBrace) {
        return Err(cursor.error("empty selector list"));
    }
    let mut selectors = Vec::new();
    loop {
        if cursor.eat(&TokenKind::RBrace) {
            return Ok(selectors);
        }
        let id = ids.next_id();
        let name = cursor.expect_ident("expected selector name")?;
        let name = ids.ident(name);
        let alias = if cursor.eat(&TokenKind::As) {
            let alias = cursor.expect_ident("expected alias after `as`")?;
            Some(ids.ident(alias))
        } else {
            None
        };
        selectors.push(ImportSelector { id, name, alias });

        if cursor.eat(&TokenKind::Comma) {
            continue;
        }
        if cursor.eat(&TokenKind::RBrace) {
            return Ok(selectors);
        }
        return Err(cursor.error("expected `,` or `}` in selector list"));
    }
}

impl Cursor<'_> {
    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<String, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            },
            _ => Err(self.error(message)),
        }
    }

    fn error(&self, message: &str) -> ParseError {
        let message = format!("{} in `{}`", message, self.keyword);
        match self.tokens.get(self.pos) {
            Some(token) => ParseError::at(message, self.line, token.column, token.len),
            None => ParseError::at(message, self.line, self.end_column, 1),
        }
    }
}

fn tokenize(clause: &str, line: usize, column: usize) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = clause.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let col = column + i;
        let single = match c {
            '.' => Some(TokenKind::Dot),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            ',' => Some(TokenKind::Comma),
            '*' => Some(TokenKind::Star),
            ';' => Some(TokenKind::Semi),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token { kind, column: col, len: 1 });
            i += 1;
            continue;
        }
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_alphanumeric() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if !is_identifier(&word) {
                return Err(ParseError::at(
                    format!("invalid identifier `{}`", word),
                    line,
                    col,
                    i - start,
                ));
            }
            let kind = if word == "as" {
                TokenKind::As
            } else {
                TokenKind::Ident(word)
            };
            tokens.push(Token { kind, column: col, len: i - start });
            continue;
        }
        return Err(ParseError::at(format!("unexpected character `{}`", c), line, col, 1));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FileId;

    fn parse(clause: &str) -> Result<ImportStatement, ParseError> {
        let mut ids = NodeIds::new(FileId(0));
        parse_import_clause(&mut ids, "import", clause, 1, 7)
    }

    #[test]
    fn test_plain_path() {
        let import = parse(" other.thing;").unwrap();
        assert_eq!(import.package_name(), "other.thing");
        assert!(!import.is_wildcard);
        assert!(import.selectors.is_empty());
        assert!(import.alias.is_none());
    }

    #[test]
    fn test_wildcard_and_alias() {
        let import = parse(" q.*").unwrap();
        assert!(import.is_wildcard);
        assert_eq!(import.package_name(), "q");

        let import = parse(" a.b as ab;").unwrap();
        assert_eq!(import.alias.map(|a| a.name), Some("ab".to_string()));
    }

    #[test]
    fn test_selectors() {
        let import = parse(" io.{print, read as r,};").unwrap();
        assert_eq!(import.package_name(), "io");
        assert_eq!(import.selectors.len(), 2);
        assert_eq!(import.selectors[1].name.name, "read");
        assert_eq!(
            import.selectors[1].alias.as_ref().map(|a| a.name.as_str()),
            Some("r")
        );
    }

    #[test]
    fn test_errors_carry_columns() {
        let err = parse(" a.;").unwrap_err();
        assert_eq!(err.column, 10);
        assert!(err.message.contains("after `.`"));

        let err = parse(" ;").unwrap_err();
        assert!(err.message.contains("expected package path"));

        let err = parse(" a.{}").unwrap_err();
        assert!(err.message.contains("empty selector list"));

        let err = parse(" a b").unwrap_err();
        assert_eq!(err.column, 10);

        let err = parse(" a.{x").unwrap_err();
        assert!(err.message.contains("`,` or `}`"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn segment() -> impl Strategy<Value = String> {
            "[a-z_][a-z0-9_]{0,6}".prop_filter("`as` is a keyword", |s| s != "as")
        }

        proptest! {
            #[test]
            fn dotted_paths_keep_their_segments(
                segments in prop::collection::vec(segment(), 1..5),
                wildcard in any::<bool>()
            ) {
                let path = segments.join(".");
                let clause = if wildcard { format!(" {}.*;", path) } else { format!(" {};", path) };
                let import = parse(&clause).unwrap();
                prop_assert_eq!(import.package_name(), path);
                prop_assert_eq!(import.is_wildcard, wildcard);
            }
        }
    }
}
