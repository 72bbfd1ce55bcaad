//! Tokenizer for the recognized TypeScript subset.
//!
//! Tolerant by design: the scanner never fails. Characters that do not start
//! any recognized token are emitted as [`Kind::Other`] and left for the
//! parser's recovery logic, because a single odd construct in a scanned file
//! must not abort specification generation.

/// A single token: its kind, its text and the 1-based line it starts on.
///
/// For strings the text is the unescaped value, for regular expressions the
/// bare pattern, for templates the raw inner text; comments keep their
/// `//`/`/* */` markers so the annotation grammar can strip them itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: Kind,
    pub text: String,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Ident,
    Str,
    Num,
    Template,
    Regex,
    Comment,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Lt,
    Gt,
    Comma,
    Semi,
    Colon,
    Question,
    Pipe,
    Amp,
    Eq,
    Arrow,
    Dot,
    Ellipsis,
    Bang,
    Minus,
    Plus,
    Star,
    Slash,
    Other,
}

/// Tokenizes a source string.
pub fn tokenize(source: &str) -> Vec<Token> {
    Tokenizer::new(source).run()
}

struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    tokens: Vec<Token>,
    /// Kind of the last non-comment token, for regex-context detection.
    last_significant: Option<Kind>,
}

impl Tokenizer {
    fn new(source: &str) -> Self {
        Tokenizer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
            last_significant: None,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if let Some(c) = ch {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
            }
        }
        ch
    }

    fn emit(&mut self, kind: Kind, text: String, line: u32) {
        if kind != Kind::Comment {
            self.last_significant = Some(kind);
        }
        self.tokens.push(Token { kind, text, line });
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(ch) = self.peek() {
            let line = self.line;
            if ch.is_whitespace() {
                self.bump();
                continue;
            }
            match ch {
                '{' => self.punct(Kind::LBrace, line),
                '}' => self.punct(Kind::RBrace, line),
                '(' => self.punct(Kind::LParen, line),
                ')' => self.punct(Kind::RParen, line),
                '[' => self.punct(Kind::LBracket, line),
                ']' => self.punct(Kind::RBracket, line),
                '<' => self.punct(Kind::Lt, line),
                '>' => self.punct(Kind::Gt, line),
                ',' => self.punct(Kind::Comma, line),
                ';' => self.punct(Kind::Semi, line),
                ':' => self.punct(Kind::Colon, line),
                '!' => self.punct(Kind::Bang, line),
                '+' => self.punct(Kind::Plus, line),
                '*' => self.punct(Kind::Star, line),
                '-' => self.punct(Kind::Minus, line),
                '?' => {
                    self.bump();
                    // `?.` and `??` are not part of the subset
                    if self.peek() == Some('.') || self.peek() == Some('?') {
                        self.bump();
                        self.emit(Kind::Other, "?.".to_string(), line);
                    } else {
                        self.emit(Kind::Question, "?".to_string(), line);
                    }
                }
                '|' => {
                    self.bump();
                    if self.peek() == Some('|') {
                        self.bump();
                        self.emit(Kind::Other, "||".to_string(), line);
                    } else {
                        self.emit(Kind::Pipe, "|".to_string(), line);
                    }
                }
                '&' => {
                    self.bump();
                    if self.peek() == Some('&') {
                        self.bump();
                        self.emit(Kind::Other, "&&".to_string(), line);
                    } else {
                        self.emit(Kind::Amp, "&".to_string(), line);
                    }
                }
                '=' => {
                    self.bump();
                    if self.peek() == Some('>') {
                        self.bump();
                        self.emit(Kind::Arrow, "=>".to_string(), line);
                    } else if self.peek() == Some('=') {
                        while self.peek() == Some('=') {
                            self.bump();
                        }
                        self.emit(Kind::Other, "==".to_string(), line);
                    } else {
                        self.emit(Kind::Eq, "=".to_string(), line);
                    }
                }
                '.' => {
                    if self.peek_at(1) == Some('.') && self.peek_at(2) == Some('.') {
                        self.bump();
                        self.bump();
                        self.bump();
                        self.emit(Kind::Ellipsis, "...".to_string(), line);
                    } else if self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
                        self.number(line);
                    } else {
                        self.punct(Kind::Dot, line);
                    }
                }
                '"' | '\'' => self.string(ch, line),
                '`' => self.template(line),
                '/' => match self.peek_at(1) {
                    Some('/') => self.line_comment(line),
                    Some('*') => self.block_comment(line),
                    _ => {
                        if self.regex_allowed() {
                            self.regex(line);
                        } else {
                            self.punct(Kind::Slash, line);
                        }
                    }
                },
                c if c.is_ascii_digit() => self.number(line),
                c if c.is_alphabetic() || c == '_' || c == '$' => self.ident(line),
                _ => {
                    self.bump();
                    self.emit(Kind::Other, ch.to_string(), line);
                }
            }
        }
        self.tokens
    }

    fn punct(&mut self, kind: Kind, line: u32) {
        let ch = self.bump().unwrap();
        self.emit(kind, ch.to_string(), line);
    }

    fn ident(&mut self, line: u32) {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        self.emit(Kind::Ident, text, line);
    }

    fn number(&mut self, line: u32) {
        let mut text = String::new();
        // hex / octal / binary prefixes
        if self.peek() == Some('0') {
            let radix = self.peek_at(1);
            if matches!(radix, Some('x') | Some('X') | Some('b') | Some('B') | Some('o') | Some('O')) {
                text.push(self.bump().unwrap());
                text.push(self.bump().unwrap());
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        text.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                self.emit(Kind::Num, text, line);
                return;
            }
        }
        let mut seen_dot = false;
        let mut seen_exp = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                text.push(c);
                self.bump();
            } else if c == '.' && !seen_dot && !seen_exp {
                // a second dot belongs to a following member access
                if self.peek_at(1).map_or(false, |n| n.is_ascii_digit()) || text.is_empty() {
                    seen_dot = true;
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            } else if (c == 'e' || c == 'E') && !seen_exp && !text.is_empty() {
                seen_exp = true;
                text.push(c);
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    text.push(self.bump().unwrap());
                }
            } else {
                break;
            }
        }
        self.emit(Kind::Num, text, line);
    }

    fn string(&mut self, quote: char, line: u32) {
        self.bump();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == quote {
                self.bump();
                break;
            }
            if c == '\n' {
                // unterminated on this line; emit what we have
                break;
            }
            self.bump();
            if c == '\\' {
                match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('0') => text.push('\0'),
                    Some(other) => text.push(other),
                    None => break,
                }
            } else {
                text.push(c);
            }
        }
        self.emit(Kind::Str, text, line);
    }

    fn template(&mut self, line: u32) {
        self.bump();
        let mut text = String::new();
        let mut brace_depth = 0usize;
        while let Some(c) = self.peek() {
            if c == '`' && brace_depth == 0 {
                self.bump();
                break;
            }
            self.bump();
            if c == '\\' {
                if let Some(next) = self.bump() {
                    text.push(next);
                }
                continue;
            }
            if c == '$' && self.peek() == Some('{') {
                brace_depth += 1;
            } else if c == '}' && brace_depth > 0 {
                brace_depth -= 1;
            }
            text.push(c);
        }
        self.emit(Kind::Template, text, line);
    }

    fn line_comment(&mut self, line: u32) {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        self.emit(Kind::Comment, text, line);
    }

    fn block_comment(&mut self, line: u32) {
        let mut text = String::new();
        // consume "/*"
        text.push(self.bump().unwrap());
        text.push(self.bump().unwrap());
        while let Some(c) = self.peek() {
            if c == '*' && self.peek_at(1) == Some('/') {
                text.push(self.bump().unwrap());
                text.push(self.bump().unwrap());
                break;
            }
            text.push(c);
            self.bump();
        }
        self.emit(Kind::Comment, text, line);
    }

    /// Whether a `/` at the current position starts a regular expression.
    /// True after any token that cannot end an expression.
    fn regex_allowed(&self) -> bool {
        !matches!(
            self.last_significant,
            Some(Kind::Ident)
                | Some(Kind::Str)
                | Some(Kind::Num)
                | Some(Kind::Template)
                | Some(Kind::Regex)
                | Some(Kind::RParen)
                | Some(Kind::RBracket)
        )
    }

    fn regex(&mut self, line: u32) {
        self.bump(); // leading '/'
        let mut text = String::new();
        let mut in_class = false;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            if c == '\\' {
                text.push(c);
                self.bump();
                if let Some(next) = self.bump() {
                    text.push(next);
                }
                continue;
            }
            if c == '[' {
                in_class = true;
            } else if c == ']' {
                in_class = false;
            } else if c == '/' && !in_class {
                self.bump();
                break;
            }
            text.push(c);
            self.bump();
        }
        // flags
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() {
                self.bump();
            } else {
                break;
            }
        }
        self.emit(Kind::Regex, text, line);
    }
}

impl Token {
    /// The 1-based line the token ends on (block comments span lines).
    pub fn end_line(&self) -> u32 {
        self.line + self.text.matches('\n').count() as u32
    }

    /// Numeric value of a [`Kind::Num`] token; `0.0` if out of range.
    pub fn num_value(&self) -> f64 {
        let cleaned: String = self.text.chars().filter(|c| *c != '_').collect();
        if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
            return i64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(0.0);
        }
        if let Some(bin) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
            return i64::from_str_radix(bin, 2).map(|v| v as f64).unwrap_or(0.0);
        }
        if let Some(oct) = cleaned.strip_prefix("0o").or_else(|| cleaned.strip_prefix("0O")) {
            return i64::from_str_radix(oct, 8).map(|v| v as f64).unwrap_or(0.0);
        }
        cleaned.parse().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<Kind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_interface_members() {
        let tokens = tokenize("interface User { id: number; name?: string }");
        let idents: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == Kind::Ident)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(idents, vec!["interface", "User", "id", "number", "name", "string"]);
    }

    #[test]
    fn tokenizes_optional_marker() {
        assert_eq!(
            kinds("name?: string"),
            vec![Kind::Ident, Kind::Question, Kind::Colon, Kind::Ident]
        );
    }

    #[test]
    fn string_escapes_are_unescaped() {
        let tokens = tokenize(r#"const a = "it\'s\n""#);
        let s = tokens.iter().find(|t| t.kind == Kind::Str).unwrap();
        assert_eq!(s.text, "it's\n");
    }

    #[test]
    fn arrow_and_eq_are_distinct() {
        assert_eq!(
            kinds("const f = () => x"),
            vec![
                Kind::Ident,
                Kind::Ident,
                Kind::Eq,
                Kind::LParen,
                Kind::RParen,
                Kind::Arrow,
                Kind::Ident
            ]
        );
    }

    #[test]
    fn regex_after_paren_is_one_token() {
        let tokens = tokenize(r"z.string().regex(/^[a-z]+\/?$/)");
        let regex = tokens.iter().find(|t| t.kind == Kind::Regex).unwrap();
        assert_eq!(regex.text, r"^[a-z]+\/?$");
    }

    #[test]
    fn slash_after_ident_is_division() {
        assert_eq!(
            kinds("total / count"),
            vec![Kind::Ident, Kind::Slash, Kind::Ident]
        );
    }

    #[test]
    fn comments_keep_markers_and_lines() {
        let tokens = tokenize("// first\nconst a = 1; // trailing");
        let comments: Vec<_> = tokens.iter().filter(|t| t.kind == Kind::Comment).collect();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "// first");
        assert_eq!(comments[0].line, 1);
        assert_eq!(comments[1].text, "// trailing");
        assert_eq!(comments[1].line, 2);
    }

    #[test]
    fn block_comment_spans_lines() {
        let tokens = tokenize("/**\n * @openapi\n */\nexport const GET = 1");
        let comment = &tokens[0];
        assert_eq!(comment.kind, Kind::Comment);
        assert_eq!(comment.line, 1);
        assert_eq!(comment.end_line(), 3);
        assert!(comment.text.contains("@openapi"));
    }

    #[test]
    fn numbers_parse_their_values() {
        let tokens = tokenize("1 2.5 1e3 0x10");
        let values: Vec<f64> = tokens.iter().map(|t| t.num_value()).collect();
        assert_eq!(values, vec![1.0, 2.5, 1000.0, 16.0]);
    }

    #[test]
    fn template_literal_is_single_token() {
        let tokens = tokenize("const t = `a ${b} c`");
        let tpl = tokens.iter().find(|t| t.kind == Kind::Template).unwrap();
        assert_eq!(tpl.text, "a ${b} c");
    }

    #[test]
    fn unknown_characters_degrade_to_other() {
        let tokens = tokenize("a # b");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![Kind::Ident, Kind::Other, Kind::Ident]
        );
    }
}
