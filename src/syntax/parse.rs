//! Recursive-descent parser for the recognized TypeScript subset.
//!
//! The parser is recovery-oriented: it extracts every declaration it can and
//! skips everything else. Constructs outside the subset become
//! [`TypeExpr::Unknown`]/[`Expr::Unknown`] leaves or are dropped entirely, so
//! a file full of unrelated application code still yields its type and schema
//! declarations.

use super::ast::*;
use super::tokenizer::{tokenize, Kind, Token};

/// Parses a source string into a [`SourceModule`].
pub fn parse_module(source: &str) -> SourceModule {
    Parser::new(tokenize(source)).parse()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    // ---- token access -------------------------------------------------

    /// Index of the next non-comment token, if any.
    fn next_significant_index(&self) -> Option<usize> {
        let mut idx = self.pos;
        while let Some(tok) = self.tokens.get(idx) {
            if tok.kind != Kind::Comment {
                return Some(idx);
            }
            idx += 1;
        }
        None
    }

    fn peek(&self) -> Option<&Token> {
        self.next_significant_index().map(|i| &self.tokens[i])
    }

    fn peek_kind(&self) -> Option<Kind> {
        self.peek().map(|t| t.kind)
    }

    /// The significant token after the next one.
    fn peek2(&self) -> Option<&Token> {
        let first = self.next_significant_index()?;
        let mut idx = first + 1;
        while let Some(tok) = self.tokens.get(idx) {
            if tok.kind != Kind::Comment {
                return Some(tok);
            }
            idx += 1;
        }
        None
    }

    fn bump(&mut self) -> Option<Token> {
        let idx = self.next_significant_index()?;
        self.pos = idx + 1;
        Some(self.tokens[idx].clone())
    }

    fn at_ident(&self, text: &str) -> bool {
        self.peek()
            .map_or(false, |t| t.kind == Kind::Ident && t.text == text)
    }

    fn eat_kind(&mut self, kind: Kind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, text: &str) -> bool {
        if self.at_ident(text) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_ident_name(&mut self) -> Option<String> {
        if self.peek_kind() == Some(Kind::Ident) {
            self.bump().map(|t| t.text)
        } else {
            None
        }
    }

    /// Raw index of the most recently consumed token.
    fn last_index(&self) -> usize {
        self.pos.saturating_sub(1)
    }

    // ---- comment attachment -------------------------------------------

    /// The comment block attached to the token at `index`: the contiguous run
    /// of comments directly above it (same-line trailing comments of the
    /// previous statement are excluded).
    fn leading_doc(&self, index: usize) -> Option<String> {
        let decl_line = self.tokens.get(index)?.line;
        // collect the run of comment tokens immediately before `index`
        let mut run: Vec<&Token> = Vec::new();
        let mut idx = index;
        while idx > 0 {
            let tok = &self.tokens[idx - 1];
            if tok.kind != Kind::Comment {
                break;
            }
            run.push(tok);
            idx -= 1;
        }
        run.reverse();
        // previous significant token, to drop its trailing comment
        let prev_line = if idx > 0 { Some(self.tokens[idx - 1].line) } else { None };
        let attached: Vec<&Token> = run
            .into_iter()
            .filter(|t| prev_line.map_or(true, |l| t.line > l))
            .collect();
        let last = attached.last()?;
        if last.end_line() + 1 < decl_line {
            return None;
        }
        // keep only the trailing contiguous block
        let mut block: Vec<&str> = Vec::new();
        let mut expected_end = decl_line.saturating_sub(1);
        for tok in attached.iter().rev() {
            if tok.end_line() < expected_end {
                break;
            }
            block.push(tok.text.as_str());
            expected_end = tok.line.saturating_sub(1);
        }
        if block.is_empty() {
            return None;
        }
        block.reverse();
        Some(block.join("\n"))
    }

    /// A `// comment` on the same line right after the token at `index`,
    /// looking past the member's own `,`/`;` separator.
    fn trailing_comment(&self, index: usize) -> Option<String> {
        let line = self.tokens.get(index)?.line;
        let mut idx = index + 1;
        while let Some(tok) = self.tokens.get(idx) {
            if tok.line != line {
                return None;
            }
            match tok.kind {
                Kind::Comma | Kind::Semi => idx += 1,
                Kind::Comment => return Some(clean_comment_text(&tok.text)),
                _ => return None,
            }
        }
        None
    }

    // ---- recovery ------------------------------------------------------

    /// Skips one token, or a whole balanced group if the next token opens one.
    fn skip_token_or_group(&mut self) {
        match self.peek_kind() {
            Some(Kind::LBrace) => self.skip_balanced(Kind::LBrace, Kind::RBrace),
            Some(Kind::LParen) => self.skip_balanced(Kind::LParen, Kind::RParen),
            Some(Kind::LBracket) => self.skip_balanced(Kind::LBracket, Kind::RBracket),
            Some(_) => {
                self.bump();
            }
            None => {}
        }
    }

    /// Consumes a balanced `open ... close` group, including nested groups of
    /// the same kind. The next significant token must be `open`.
    fn skip_balanced(&mut self, open: Kind, close: Kind) {
        if self.peek_kind() != Some(open) {
            return;
        }
        self.bump();
        let mut depth = 1usize;
        while let Some(tok) = self.bump() {
            if tok.kind == open {
                depth += 1;
            } else if tok.kind == close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Skips a `<...>` type-argument group if present.
    fn skip_type_args(&mut self) {
        if self.peek_kind() == Some(Kind::Lt) {
            self.skip_balanced(Kind::Lt, Kind::Gt);
        }
    }

    /// Skips the remainder of an unrecognized statement: up to a `;` at
    /// depth zero, or a new top-level declaration keyword on a later line.
    fn skip_statement(&mut self) {
        let start_line = self.peek().map(|t| t.line).unwrap_or(0);
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            let tok = tok.clone();
            if depth == 0 {
                if tok.kind == Kind::Semi {
                    self.bump();
                    return;
                }
                if tok.line > start_line && tok.kind == Kind::Ident && is_decl_keyword(&tok.text) {
                    return;
                }
            }
            match tok.kind {
                Kind::LBrace | Kind::LParen | Kind::LBracket => depth += 1,
                Kind::RBrace | Kind::RParen | Kind::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.bump();
        }
    }

    // ---- items ---------------------------------------------------------

    fn parse(mut self) -> SourceModule {
        let mut items = Vec::new();
        while self.peek().is_some() {
            let checkpoint = self.pos;
            if let Some(item) = self.parse_item() {
                items.push(item);
            } else if self.pos == checkpoint {
                self.skip_token_or_group();
            }
        }
        SourceModule { items }
    }

    fn parse_item(&mut self) -> Option<Item> {
        let start_index = self.next_significant_index()?;
        let doc = self.leading_doc(start_index);

        let exported = self.eat_ident("export");
        if exported {
            // `export default ...`, `export * from ...`, `export { ... }`
            if self.at_ident("default")
                || self.peek_kind() == Some(Kind::Star)
                || self.peek_kind() == Some(Kind::LBrace)
            {
                self.skip_statement();
                return None;
            }
        }
        self.eat_ident("declare");

        let decl = if self.at_ident("interface") {
            self.parse_interface()?
        } else if self.at_ident("type") {
            self.parse_type_alias()?
        } else if self.at_ident("enum") {
            self.bump();
            self.parse_enum_body()?
        } else if self.at_ident("const") || self.at_ident("let") || self.at_ident("var") {
            self.bump();
            if self.at_ident("enum") {
                self.bump();
                self.parse_enum_body()?
            } else {
                self.parse_const_rest()?
            }
        } else if self.at_ident("async") || self.at_ident("function") {
            self.eat_ident("async");
            if !self.eat_ident("function") {
                return None;
            }
            self.parse_function_rest()?
        } else if self.at_ident("import") {
            self.skip_statement();
            return None;
        } else {
            return None;
        };

        Some(Item { exported, doc, decl })
    }

    fn parse_interface(&mut self) -> Option<Decl> {
        self.bump(); // interface
        let name = self.expect_ident_name()?;
        self.skip_type_args();
        let mut extends = Vec::new();
        if self.eat_ident("extends") {
            loop {
                let base = self.parse_qualified_name()?;
                self.skip_type_args();
                extends.push(base);
                if !self.eat_kind(Kind::Comma) {
                    break;
                }
            }
        }
        if !self.eat_kind(Kind::LBrace) {
            return None;
        }
        let members = self.parse_members();
        Some(Decl::Interface(InterfaceDecl { name, extends, members }))
    }

    fn parse_type_alias(&mut self) -> Option<Decl> {
        self.bump(); // type
        let name = self.expect_ident_name()?;
        self.skip_type_args();
        if !self.eat_kind(Kind::Eq) {
            return None;
        }
        let ty = self.parse_type();
        self.eat_kind(Kind::Semi);
        Some(Decl::TypeAlias(TypeAliasDecl { name, ty }))
    }

    fn parse_enum_body(&mut self) -> Option<Decl> {
        let name = self.expect_ident_name()?;
        if !self.eat_kind(Kind::LBrace) {
            return None;
        }
        let mut members = Vec::new();
        loop {
            while self.eat_kind(Kind::Comma) || self.eat_kind(Kind::Semi) {}
            if self.eat_kind(Kind::RBrace) || self.peek().is_none() {
                break;
            }
            let member_name = match self.peek_kind() {
                Some(Kind::Ident) | Some(Kind::Str) => self.bump()?.text,
                _ => {
                    self.skip_token_or_group();
                    continue;
                }
            };
            let value = if self.eat_kind(Kind::Eq) {
                self.parse_literal_value()
            } else {
                None
            };
            members.push(EnumMember { name: member_name, value });
        }
        Some(Decl::Enum(EnumDecl { name, members }))
    }

    fn parse_const_rest(&mut self) -> Option<Decl> {
        let name = self.expect_ident_name()?;
        // type annotation
        if self.eat_kind(Kind::Colon) {
            self.parse_type();
        }
        let init = if self.eat_kind(Kind::Eq) {
            let expr = self.parse_expr();
            // `as const` / `as SomeType` / `satisfies SomeType`
            if self.eat_ident("as") || self.eat_ident("satisfies") {
                if !self.eat_ident("const") {
                    self.parse_type();
                }
            }
            Some(expr)
        } else {
            None
        };
        // further declarators in the same statement are skipped
        while self.eat_kind(Kind::Comma) {
            if self.expect_ident_name().is_none() {
                break;
            }
            if self.eat_kind(Kind::Colon) {
                self.parse_type();
            }
            if self.eat_kind(Kind::Eq) {
                self.parse_expr();
            }
        }
        self.eat_kind(Kind::Semi);
        Some(Decl::Const(ConstDecl { name, init }))
    }

    fn parse_function_rest(&mut self) -> Option<Decl> {
        let name = self.expect_ident_name()?;
        self.skip_type_args();
        if self.peek_kind() == Some(Kind::LParen) {
            self.skip_balanced(Kind::LParen, Kind::RParen);
        }
        if self.eat_kind(Kind::Colon) {
            self.parse_type();
        }
        if self.peek_kind() == Some(Kind::LBrace) {
            self.skip_balanced(Kind::LBrace, Kind::RBrace);
        }
        Some(Decl::Function(FunctionDecl { name }))
    }

    fn parse_qualified_name(&mut self) -> Option<String> {
        let mut name = self.expect_ident_name()?;
        while self.peek_kind() == Some(Kind::Dot) {
            self.bump();
            match self.expect_ident_name() {
                Some(seg) => {
                    name.push('.');
                    name.push_str(&seg);
                }
                None => break,
            }
        }
        Some(name)
    }

    // ---- members -------------------------------------------------------

    /// Parses interface/object-type members. The opening `{` must already be
    /// consumed; consumes through the matching `}`.
    fn parse_members(&mut self) -> Vec<Member> {
        let mut members = Vec::new();
        loop {
            while self.eat_kind(Kind::Semi) || self.eat_kind(Kind::Comma) {}
            if self.eat_kind(Kind::RBrace) || self.peek().is_none() {
                break;
            }
            self.eat_ident("readonly");
            // index signatures and computed keys are outside the subset
            if self.peek_kind() == Some(Kind::LBracket) {
                self.skip_balanced(Kind::LBracket, Kind::RBracket);
                if self.eat_kind(Kind::Question) {}
                if self.eat_kind(Kind::Colon) {
                    self.parse_type();
                }
                continue;
            }
            let name = match self.peek_kind() {
                Some(Kind::Ident) | Some(Kind::Str) | Some(Kind::Num) => self.bump().unwrap().text,
                _ => {
                    self.skip_token_or_group();
                    continue;
                }
            };
            // method signatures are ignored
            if matches!(self.peek_kind(), Some(Kind::LParen) | Some(Kind::Lt)) {
                self.skip_type_args();
                if self.peek_kind() == Some(Kind::LParen) {
                    self.skip_balanced(Kind::LParen, Kind::RParen);
                }
                if self.eat_kind(Kind::Colon) {
                    self.parse_type();
                }
                continue;
            }
            let optional = self.eat_kind(Kind::Question);
            if !self.eat_kind(Kind::Colon) {
                continue;
            }
            let ty = self.parse_type();
            let comment = self.trailing_comment(self.last_index());
            members.push(Member { name, optional, ty, comment });
        }
        members
    }

    // ---- types ---------------------------------------------------------

    fn parse_type(&mut self) -> TypeExpr {
        self.eat_kind(Kind::Pipe); // leading `|` of a multi-line union
        let first = self.parse_intersection_type();
        if self.peek_kind() != Some(Kind::Pipe) {
            return first;
        }
        let mut members = vec![first];
        while self.eat_kind(Kind::Pipe) {
            members.push(self.parse_intersection_type());
        }
        TypeExpr::Union(members)
    }

    fn parse_intersection_type(&mut self) -> TypeExpr {
        let first = self.parse_postfix_type();
        if self.peek_kind() != Some(Kind::Amp) {
            return first;
        }
        let mut members = vec![first];
        while self.eat_kind(Kind::Amp) {
            members.push(self.parse_postfix_type());
        }
        TypeExpr::Intersection(members)
    }

    fn parse_postfix_type(&mut self) -> TypeExpr {
        let mut ty = self.parse_primary_type();
        while self.peek_kind() == Some(Kind::LBracket) {
            if self.peek2().map(|t| t.kind) == Some(Kind::RBracket) {
                self.bump();
                self.bump();
                ty = TypeExpr::Array(Box::new(ty));
            } else {
                // indexed access `T[K]`
                self.skip_balanced(Kind::LBracket, Kind::RBracket);
                ty = TypeExpr::Unknown;
            }
        }
        ty
    }

    fn parse_primary_type(&mut self) -> TypeExpr {
        match self.peek_kind() {
            Some(Kind::LParen) => {
                self.bump();
                let ty = self.parse_type();
                self.eat_kind(Kind::RParen);
                ty
            }
            Some(Kind::LBrace) => {
                self.bump();
                TypeExpr::Object(self.parse_members())
            }
            Some(Kind::LBracket) => {
                self.bump();
                let mut elems = Vec::new();
                loop {
                    if self.eat_kind(Kind::RBracket) || self.peek().is_none() {
                        break;
                    }
                    elems.push(self.parse_type());
                    self.eat_kind(Kind::Comma);
                }
                TypeExpr::Tuple(elems)
            }
            Some(Kind::Str) | Some(Kind::Template) => {
                let text = self.bump().unwrap().text;
                TypeExpr::Literal(LiteralValue::Str(text))
            }
            Some(Kind::Num) => {
                let tok = self.bump().unwrap();
                TypeExpr::Literal(LiteralValue::Num(tok.num_value()))
            }
            Some(Kind::Minus) => {
                self.bump();
                if self.peek_kind() == Some(Kind::Num) {
                    let tok = self.bump().unwrap();
                    TypeExpr::Literal(LiteralValue::Num(-tok.num_value()))
                } else {
                    TypeExpr::Unknown
                }
            }
            Some(Kind::Ident) => self.parse_named_type(),
            Some(_) => {
                self.bump();
                TypeExpr::Unknown
            }
            None => TypeExpr::Unknown,
        }
    }

    fn parse_named_type(&mut self) -> TypeExpr {
        let head = self.peek().map(|t| t.text.clone()).unwrap_or_default();
        match head.as_str() {
            "typeof" => {
                self.bump();
                match self.parse_qualified_name() {
                    Some(name) => TypeExpr::TypeQuery(name),
                    None => TypeExpr::Unknown,
                }
            }
            "readonly" => {
                self.bump();
                self.parse_postfix_type()
            }
            "keyof" | "infer" => {
                self.bump();
                self.parse_postfix_type();
                TypeExpr::Unknown
            }
            "true" => {
                self.bump();
                TypeExpr::Literal(LiteralValue::Bool(true))
            }
            "false" => {
                self.bump();
                TypeExpr::Literal(LiteralValue::Bool(false))
            }
            "string" => self.keyword(KeywordType::String),
            "number" => self.keyword(KeywordType::Number),
            "boolean" => self.keyword(KeywordType::Boolean),
            "bigint" => self.keyword(KeywordType::BigInt),
            "null" => self.keyword(KeywordType::Null),
            "undefined" => self.keyword(KeywordType::Undefined),
            "any" => self.keyword(KeywordType::Any),
            "unknown" => self.keyword(KeywordType::Unknown),
            "void" => self.keyword(KeywordType::Void),
            "object" => self.keyword(KeywordType::Object),
            "never" => self.keyword(KeywordType::Never),
            _ => {
                let name = match self.parse_qualified_name() {
                    Some(name) => name,
                    None => return TypeExpr::Unknown,
                };
                let mut args = Vec::new();
                if self.eat_kind(Kind::Lt) {
                    loop {
                        if self.eat_kind(Kind::Gt) || self.peek().is_none() {
                            break;
                        }
                        args.push(self.parse_type());
                        if !self.eat_kind(Kind::Comma) {
                            self.eat_kind(Kind::Gt);
                            break;
                        }
                    }
                }
                TypeExpr::Named { name, args }
            }
        }
    }

    fn keyword(&mut self, kw: KeywordType) -> TypeExpr {
        self.bump();
        TypeExpr::Keyword(kw)
    }

    // ---- expressions ---------------------------------------------------

    fn parse_expr(&mut self) -> Expr {
        let mut expr = self.parse_primary_expr();
        loop {
            match self.peek_kind() {
                Some(Kind::Dot) => {
                    self.bump();
                    match self.expect_ident_name() {
                        Some(prop) => {
                            expr = Expr::Member { obj: Box::new(expr), prop };
                        }
                        None => break,
                    }
                }
                Some(Kind::LParen) => {
                    let args = self.parse_call_args();
                    expr = Expr::Call { callee: Box::new(expr), args };
                }
                Some(Kind::Bang) => {
                    self.bump();
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_call_args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        self.bump(); // (
        loop {
            if self.eat_kind(Kind::RParen) || self.peek().is_none() {
                break;
            }
            self.eat_kind(Kind::Ellipsis);
            args.push(self.parse_expr());
            // re-sync to the next separator so leftover tokens of an
            // out-of-subset argument cannot truncate the enclosing chain
            let mut depth = 0usize;
            loop {
                match self.peek_kind() {
                    Some(Kind::Comma) if depth == 0 => {
                        self.bump();
                        break;
                    }
                    Some(Kind::RParen) if depth == 0 => {
                        self.bump();
                        return args;
                    }
                    Some(Kind::LParen) | Some(Kind::LBracket) | Some(Kind::LBrace) => {
                        depth += 1;
                        self.bump();
                    }
                    Some(Kind::RParen) | Some(Kind::RBracket) | Some(Kind::RBrace) => {
                        depth = depth.saturating_sub(1);
                        self.bump();
                    }
                    Some(_) => {
                        self.bump();
                    }
                    None => return args,
                }
            }
        }
        args
    }

    fn parse_primary_expr(&mut self) -> Expr {
        match self.peek_kind() {
            Some(Kind::Str) | Some(Kind::Template) => {
                let text = self.bump().unwrap().text;
                Expr::Literal(LiteralValue::Str(text))
            }
            Some(Kind::Num) => {
                let tok = self.bump().unwrap();
                Expr::Literal(LiteralValue::Num(tok.num_value()))
            }
            Some(Kind::Minus) => {
                self.bump();
                if self.peek_kind() == Some(Kind::Num) {
                    let tok = self.bump().unwrap();
                    Expr::Literal(LiteralValue::Num(-tok.num_value()))
                } else {
                    Expr::Unknown
                }
            }
            Some(Kind::Regex) => {
                let text = self.bump().unwrap().text;
                Expr::Regex(text)
            }
            Some(Kind::LBracket) => {
                self.bump();
                let mut elems = Vec::new();
                loop {
                    if self.eat_kind(Kind::RBracket) || self.peek().is_none() {
                        break;
                    }
                    self.eat_kind(Kind::Ellipsis);
                    elems.push(self.parse_expr());
                    if !self.eat_kind(Kind::Comma) {
                        self.eat_kind(Kind::RBracket);
                        break;
                    }
                }
                Expr::Array(elems)
            }
            Some(Kind::LBrace) => self.parse_object_literal(),
            Some(Kind::LParen) => self.parse_paren_or_arrow(),
            Some(Kind::Ident) => {
                let text = self.peek().unwrap().text.clone();
                match text.as_str() {
                    "true" => {
                        self.bump();
                        Expr::Literal(LiteralValue::Bool(true))
                    }
                    "false" => {
                        self.bump();
                        Expr::Literal(LiteralValue::Bool(false))
                    }
                    "null" | "undefined" => {
                        self.bump();
                        Expr::Literal(LiteralValue::Null)
                    }
                    "async" => {
                        self.bump();
                        self.parse_primary_expr()
                    }
                    // `new Date()` parses like `Date()`
                    "new" => {
                        self.bump();
                        self.parse_expr()
                    }
                    _ => {
                        self.bump();
                        Expr::Ident(text)
                    }
                }
            }
            Some(_) => {
                self.bump();
                Expr::Unknown
            }
            None => Expr::Unknown,
        }
    }

    fn parse_object_literal(&mut self) -> Expr {
        self.bump(); // {
        let mut entries = Vec::new();
        loop {
            while self.eat_kind(Kind::Comma) || self.eat_kind(Kind::Semi) {}
            if self.eat_kind(Kind::RBrace) || self.peek().is_none() {
                break;
            }
            if self.eat_kind(Kind::Ellipsis) {
                // spread entries are not representable
                self.parse_expr();
                continue;
            }
            if self.peek_kind() == Some(Kind::LBracket) {
                // computed keys are outside the subset
                self.skip_balanced(Kind::LBracket, Kind::RBracket);
                if self.eat_kind(Kind::Colon) {
                    self.parse_expr();
                }
                continue;
            }
            let key = match self.peek_kind() {
                Some(Kind::Ident) | Some(Kind::Str) | Some(Kind::Num) => self.bump().unwrap().text,
                _ => {
                    self.skip_token_or_group();
                    continue;
                }
            };
            if self.eat_kind(Kind::Colon) {
                let value = self.parse_expr();
                entries.push((key, value));
            } else {
                // shorthand `{ key }`
                entries.push((key.clone(), Expr::Ident(key)));
            }
        }
        Expr::Object(entries)
    }

    /// Disambiguates `(expr)` from `(params) => body` by scanning ahead for
    /// a `=>` right after the matching `)`.
    fn parse_paren_or_arrow(&mut self) -> Expr {
        let open = match self.next_significant_index() {
            Some(idx) => idx,
            None => return Expr::Unknown,
        };
        let mut depth = 0usize;
        let mut idx = open;
        let mut close = None;
        while let Some(tok) = self.tokens.get(idx) {
            match tok.kind {
                Kind::LParen => depth += 1,
                Kind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(idx);
                        break;
                    }
                }
                _ => {}
            }
            idx += 1;
        }
        let close = match close {
            Some(c) => c,
            None => {
                self.skip_balanced(Kind::LParen, Kind::RParen);
                return Expr::Unknown;
            }
        };
        let mut after = close + 1;
        while self
            .tokens
            .get(after)
            .map_or(false, |t| t.kind == Kind::Comment)
        {
            after += 1;
        }
        let is_arrow = self.tokens.get(after).map_or(false, |t| t.kind == Kind::Arrow);
        if is_arrow {
            self.skip_balanced(Kind::LParen, Kind::RParen);
            self.bump(); // =>
            if self.peek_kind() == Some(Kind::LBrace) {
                self.skip_balanced(Kind::LBrace, Kind::RBrace);
                Expr::Arrow(Box::new(Expr::Unknown))
            } else {
                Expr::Arrow(Box::new(self.parse_expr()))
            }
        } else {
            self.bump(); // (
            let expr = self.parse_expr();
            self.eat_kind(Kind::RParen);
            expr
        }
    }

    fn parse_literal_value(&mut self) -> Option<LiteralValue> {
        match self.peek_kind() {
            Some(Kind::Str) | Some(Kind::Template) => Some(LiteralValue::Str(self.bump()?.text)),
            Some(Kind::Num) => Some(LiteralValue::Num(self.bump()?.num_value())),
            Some(Kind::Minus) => {
                self.bump();
                if self.peek_kind() == Some(Kind::Num) {
                    Some(LiteralValue::Num(-self.bump()?.num_value()))
                } else {
                    None
                }
            }
            Some(Kind::Ident) if self.at_ident("true") => {
                self.bump();
                Some(LiteralValue::Bool(true))
            }
            Some(Kind::Ident) if self.at_ident("false") => {
                self.bump();
                Some(LiteralValue::Bool(false))
            }
            _ => None,
        }
    }
}

fn is_decl_keyword(text: &str) -> bool {
    matches!(
        text,
        "export" | "import" | "interface" | "type" | "enum" | "const" | "let" | "var"
            | "function" | "async" | "declare" | "class"
    )
}

/// Strips comment markers and surrounding whitespace from a comment token.
pub fn clean_comment_text(text: &str) -> String {
    let text = text.trim();
    let text = text
        .strip_prefix("/**")
        .or_else(|| text.strip_prefix("/*"))
        .unwrap_or(text);
    let text = text.strip_suffix("*/").unwrap_or(text);
    let text = text.strip_prefix("//").unwrap_or(text);
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single_decl(source: &str) -> Decl {
        let module = parse_module(source);
        assert_eq!(module.items.len(), 1, "expected one item in {source:?}");
        module.items[0].decl.clone()
    }

    #[test]
    fn parses_interface_with_optional_member() {
        let decl = single_decl("export interface User { id: number; name?: string }");
        let iface = match decl {
            Decl::Interface(i) => i,
            other => panic!("expected interface, got {other:?}"),
        };
        assert_eq!(iface.name, "User");
        assert_eq!(iface.members.len(), 2);
        assert!(!iface.members[0].optional);
        assert!(iface.members[1].optional);
        assert_eq!(iface.members[1].ty, TypeExpr::Keyword(KeywordType::String));
    }

    #[test]
    fn parses_extends_clause() {
        let decl = single_decl("interface Admin extends User, Auditable { level: number }");
        match decl {
            Decl::Interface(i) => assert_eq!(i.extends, vec!["User", "Auditable"]),
            other => panic!("expected interface, got {other:?}"),
        }
    }

    #[test]
    fn parses_type_alias_union() {
        let decl = single_decl(r#"type Status = "active" | "archived";"#);
        match decl {
            Decl::TypeAlias(alias) => match alias.ty {
                TypeExpr::Union(members) => assert_eq!(members.len(), 2),
                other => panic!("expected union, got {other:?}"),
            },
            other => panic!("expected alias, got {other:?}"),
        }
    }

    #[test]
    fn parses_generic_type_reference() {
        let decl = single_decl("type Ids = Array<number>");
        match decl {
            Decl::TypeAlias(alias) => {
                assert_eq!(
                    alias.ty,
                    TypeExpr::Named {
                        name: "Array".to_string(),
                        args: vec![TypeExpr::Keyword(KeywordType::Number)],
                    }
                );
            }
            other => panic!("expected alias, got {other:?}"),
        }
    }

    #[test]
    fn parses_pick_with_literal_keys() {
        let decl = single_decl(r#"type Slim = Pick<User, "id" | "name">"#);
        match decl {
            Decl::TypeAlias(alias) => match alias.ty {
                TypeExpr::Named { name, args } => {
                    assert_eq!(name, "Pick");
                    assert_eq!(args.len(), 2);
                }
                other => panic!("expected named type, got {other:?}"),
            },
            other => panic!("expected alias, got {other:?}"),
        }
    }

    #[test]
    fn parses_array_suffix() {
        let decl = single_decl("type Tags = string[]");
        match decl {
            Decl::TypeAlias(alias) => assert_eq!(
                alias.ty,
                TypeExpr::Array(Box::new(TypeExpr::Keyword(KeywordType::String)))
            ),
            other => panic!("expected alias, got {other:?}"),
        }
    }

    #[test]
    fn parses_enum_with_initializers() {
        let decl = single_decl(r#"enum Role { Admin = "admin", User = "user" }"#);
        match decl {
            Decl::Enum(e) => {
                assert_eq!(e.name, "Role");
                assert_eq!(e.members.len(), 2);
                assert_eq!(
                    e.members[0].value,
                    Some(LiteralValue::Str("admin".to_string()))
                );
            }
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn parses_zod_chain_into_nested_calls() {
        let decl = single_decl("const s = z.string().min(3).optional();");
        let init = match decl {
            Decl::Const(c) => c.init.unwrap(),
            other => panic!("expected const, got {other:?}"),
        };
        // outermost call is .optional()
        match init {
            Expr::Call { callee, args } => {
                assert!(args.is_empty());
                match *callee {
                    Expr::Member { prop, .. } => assert_eq!(prop, "optional"),
                    other => panic!("expected member callee, got {other:?}"),
                }
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn parses_lazy_arrow_reference() {
        let decl = single_decl("const node = z.lazy(() => nodeSchema);");
        let init = match decl {
            Decl::Const(c) => c.init.unwrap(),
            other => panic!("expected const, got {other:?}"),
        };
        let args = match init {
            Expr::Call { args, .. } => args,
            other => panic!("expected call, got {other:?}"),
        };
        assert_eq!(
            args[0],
            Expr::Arrow(Box::new(Expr::Ident("nodeSchema".to_string())))
        );
    }

    #[test]
    fn attaches_leading_doc_block() {
        let module = parse_module("/**\n * List users\n * @openapi\n */\nexport async function GET() {}\n");
        assert_eq!(module.items.len(), 1);
        let item = &module.items[0];
        assert!(item.exported);
        assert!(item.doc.as_deref().unwrap().contains("@openapi"));
        match &item.decl {
            Decl::Function(f) => assert_eq!(f.name, "GET"),
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn trailing_member_comment_becomes_description() {
        let decl = single_decl("interface P {\n  id: number // the identifier\n  name: string\n}");
        match decl {
            Decl::Interface(i) => {
                assert_eq!(i.members[0].comment.as_deref(), Some("the identifier"));
                assert_eq!(i.members[1].comment, None);
            }
            other => panic!("expected interface, got {other:?}"),
        }
    }

    #[test]
    fn doc_is_not_stolen_from_previous_statement() {
        let module = parse_module("const a = 1; // trailing\nconst b = 2;");
        assert_eq!(module.items.len(), 2);
        assert!(module.items[1].doc.is_none());
    }

    #[test]
    fn skips_unrelated_statements() {
        let source = r#"
import { z } from "zod";

console.log("hello");

export const userSchema = z.object({ id: z.number() });

if (process.env.DEBUG) { doSomething(); }

interface Extra { note: string }
"#;
        let module = parse_module(source);
        let names: Vec<_> = module.items.iter().map(|i| i.decl.name().to_string()).collect();
        assert_eq!(names, vec!["userSchema", "Extra"]);
    }

    #[test]
    fn const_arrow_handler_is_a_const_decl() {
        let module = parse_module("export const POST = async (req: Request) => { return null; }");
        assert_eq!(module.items.len(), 1);
        match &module.items[0].decl {
            Decl::Const(c) => {
                assert_eq!(c.name, "POST");
                assert!(matches!(c.init, Some(Expr::Arrow(_))));
            }
            other => panic!("expected const, got {other:?}"),
        }
    }

    #[test]
    fn inline_object_type_keeps_declaration_order() {
        let decl = single_decl("type Q = { page?: number, limit?: number, q: string }");
        match decl {
            Decl::TypeAlias(alias) => match alias.ty {
                TypeExpr::Object(members) => {
                    let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
                    assert_eq!(names, vec!["page", "limit", "q"]);
                }
                other => panic!("expected object, got {other:?}"),
            },
            other => panic!("expected alias, got {other:?}"),
        }
    }

    #[test]
    fn infer_alias_shape_is_a_type_query() {
        let decl = single_decl("export type Order = z.infer<typeof orderSchema>;");
        match decl {
            Decl::TypeAlias(alias) => assert_eq!(
                alias.ty,
                TypeExpr::Named {
                    name: "z.infer".to_string(),
                    args: vec![TypeExpr::TypeQuery("orderSchema".to_string())],
                }
            ),
            other => panic!("expected alias, got {other:?}"),
        }
    }
}
