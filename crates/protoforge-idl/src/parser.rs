//! Recursive-descent parser over the token stream.
//!
//! A comment block attaches to the declaration that starts on the line right
//! after it; blocks separated from the next declaration by a blank line are
//! dropped. A comment on the same line after a declaration (or after the
//! opening brace of a body) becomes its trailing comment.

use crate::ast::{
    Comment, Comments, Constant, Element, Enum, EnumValue, Field, Import, ImportKind, Label,
    MapField, Message, MessageElement, OptionDecl, ProtoFile, Reserved, Rpc, Service,
};
use crate::error::{ParseError, Result};
use crate::lexer::{Token, TokenKind};

pub(crate) fn parse(tokens: Vec<Token>) -> Result<ProtoFile> {
    Parser {
        tokens,
        pos: 0,
        prev_line: 1,
    }
    .file()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    prev_line: usize,
}

fn comment_lines(kind: &TokenKind) -> Vec<String> {
    match kind {
        TokenKind::LineComment(text) => vec![text.clone()],
        TokenKind::BlockComment(text) => {
            let mut lines: Vec<String> = text
                .lines()
                .map(|l| {
                    let l = l.trim_start();
                    l.strip_prefix('*').unwrap_or(l).trim_end().to_string()
                })
                .collect();
            while lines.first().is_some_and(|l| l.trim().is_empty()) {
                lines.remove(0);
            }
            while lines.last().is_some_and(|l| l.trim().is_empty()) {
                lines.pop();
            }
            lines
        }
        _ => Vec::new(),
    }
}

fn parse_int(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        i64::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}

impl Parser {
    // ---- token access -------------------------------------------------

    fn skip_comments(&mut self) {
        while self
            .tokens
            .get(self.pos)
            .is_some_and(|t| t.kind.is_comment())
        {
            self.pos += 1;
        }
    }

    /// Index of the next significant token; comments stay unconsumed.
    fn significant(&self) -> usize {
        let mut index = self.pos;
        while self
            .tokens
            .get(index)
            .is_some_and(|t| t.kind.is_comment())
        {
            index += 1;
        }
        index
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.significant())
    }

    /// Consumes the significant token `peek` returned.
    fn bump(&mut self) {
        let index = self.significant();
        if let Some(token) = self.tokens.get(index) {
            self.prev_line = token.end_line;
            self.pos = index + 1;
        }
    }

    /// Kind of the `n`-th significant token ahead, without consuming.
    fn peek_nth(&self, n: usize) -> Option<&TokenKind> {
        self.tokens
            .iter()
            .skip(self.pos)
            .filter(|t| !t.kind.is_comment())
            .nth(n)
            .map(|t| &t.kind)
    }

    fn next(&mut self, expected: &str) -> Result<Token> {
        self.skip_comments();
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof {
                expected: expected.to_string(),
            })?;
        self.pos += 1;
        self.prev_line = token.end_line;
        Ok(token)
    }

    fn unexpected(token: &Token, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            line: token.line,
            expected: expected.to_string(),
            found: token.kind.describe(),
        }
    }

    fn peek_is_symbol(&self, c: char) -> bool {
        matches!(self.peek(), Some(t) if t.kind == TokenKind::Symbol(c))
    }

    fn peek_is_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Ident(w), .. }) if w == word)
    }

    fn eat_symbol(&mut self, c: char) -> bool {
        if self.peek_is_symbol(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, c: char) -> Result<()> {
        let expected = format!("'{c}'");
        let token = self.next(&expected)?;
        if token.kind == TokenKind::Symbol(c) {
            Ok(())
        } else {
            Err(Self::unexpected(&token, &expected))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<(String, usize)> {
        let token = self.next(expected)?;
        match token.kind {
            TokenKind::Ident(name) => Ok((name, token.line)),
            _ => Err(Self::unexpected(&token, expected)),
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<usize> {
        let (found, line) = self.expect_ident(&format!("'{word}'"))?;
        if found == word {
            Ok(line)
        } else {
            Err(ParseError::UnexpectedToken {
                line,
                expected: format!("'{word}'"),
                found: format!("identifier '{found}'"),
            })
        }
    }

    fn expect_string(&mut self, expected: &str) -> Result<String> {
        let token = self.next(expected)?;
        match token.kind {
            TokenKind::Str(s) => Ok(s),
            _ => Err(Self::unexpected(&token, expected)),
        }
    }

    /// `[.]ident{.ident}`; a leading dot is dropped.
    fn full_ident(&mut self, expected: &str) -> Result<String> {
        self.eat_symbol('.');
        let (mut name, _) = self.expect_ident(expected)?;
        while self.peek_is_symbol('.') {
            self.bump();
            let (part, _) = self.expect_ident(expected)?;
            name.push('.');
            name.push_str(&part);
        }
        Ok(name)
    }

    fn int_literal(&mut self, expected: &str) -> Result<i64> {
        let negative = if self.eat_symbol('-') {
            true
        } else {
            self.eat_symbol('+');
            false
        };
        let token = self.next(expected)?;
        let TokenKind::Int(text) = &token.kind else {
            return Err(Self::unexpected(&token, expected));
        };
        let value = parse_int(text).ok_or_else(|| Self::unexpected(&token, expected))?;
        Ok(if negative { -value } else { value })
    }

    // ---- comments -----------------------------------------------------

    fn leading_comment(&mut self) -> Option<Comment> {
        let mut groups: Vec<(Comment, usize)> = Vec::new();
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.kind.is_comment() {
                break;
            }
            let lines = comment_lines(&token.kind);
            match groups.last_mut() {
                Some((group, end)) if token.line <= *end + 1 => {
                    group.lines.extend(lines);
                    *end = token.end_line;
                }
                _ => groups.push((
                    Comment {
                        lines,
                        line: token.line,
                    },
                    token.end_line,
                )),
            }
            self.pos += 1;
        }
        let next_line = self.tokens.get(self.pos)?.line;
        let (comment, end) = groups.pop()?;
        (end + 1 >= next_line).then_some(comment)
    }

    fn trailing_comment(&mut self) -> Option<Comment> {
        let token = self.tokens.get(self.pos)?;
        if token.kind.is_comment() && token.line == self.prev_line {
            let comment = Comment {
                lines: comment_lines(&token.kind),
                line: token.line,
            };
            self.pos += 1;
            Some(comment)
        } else {
            None
        }
    }

    fn end_statement(&mut self) -> Result<Option<Comment>> {
        self.expect_symbol(';')?;
        Ok(self.trailing_comment())
    }

    // ---- file ---------------------------------------------------------

    fn file(mut self) -> Result<ProtoFile> {
        let mut elements = Vec::new();
        loop {
            let leading = self.leading_comment();
            let Some(token) = self.peek().cloned() else {
                break;
            };
            let TokenKind::Ident(keyword) = &token.kind else {
                if token.kind == TokenKind::Symbol(';') {
                    self.bump();
                    continue;
                }
                return Err(Self::unexpected(&token, "top-level declaration"));
            };
            let element = match keyword.as_str() {
                "syntax" | "edition" => {
                    self.bump();
                    self.expect_symbol('=')?;
                    let value = self.expect_string("syntax version")?;
                    self.end_statement()?;
                    Element::Syntax(value)
                }
                "package" => {
                    self.bump();
                    let name = self.full_ident("package name")?;
                    self.end_statement()?;
                    Element::Package(name)
                }
                "import" => {
                    self.bump();
                    let kind = if self.peek_is_ident("public") {
                        self.bump();
                        ImportKind::Public
                    } else if self.peek_is_ident("weak") {
                        self.bump();
                        ImportKind::Weak
                    } else {
                        ImportKind::Default
                    };
                    let path = self.expect_string("import path")?;
                    self.end_statement()?;
                    Element::Import(Import {
                        path,
                        kind,
                        line: token.line,
                    })
                }
                "option" => Element::Option(self.option_statement()?),
                "message" => Element::Message(self.message(leading)?),
                "enum" => Element::Enum(self.enumeration(leading)?),
                "service" => Element::Service(self.service(leading)?),
                "extend" => {
                    self.skip_extend()?;
                    continue;
                }
                _ => return Err(Self::unexpected(&token, "top-level declaration")),
            };
            elements.push(element);
        }
        Ok(ProtoFile {
            path: None,
            elements,
        })
    }

    // ---- options ------------------------------------------------------

    fn option_name(&mut self) -> Result<String> {
        let mut name = if self.eat_symbol('(') {
            let inner = self.full_ident("option name")?;
            self.expect_symbol(')')?;
            format!("({inner})")
        } else {
            self.expect_ident("option name")?.0
        };
        while self.eat_symbol('.') {
            name.push('.');
            name.push_str(&self.expect_ident("option name")?.0);
        }
        Ok(name)
    }

    fn constant(&mut self) -> Result<Constant> {
        let token = self.next("constant")?;
        let value = match &token.kind {
            TokenKind::Str(first) => {
                let mut value = first.clone();
                while let Some(Token {
                    kind: TokenKind::Str(more),
                    ..
                }) = self.peek().cloned()
                {
                    self.bump();
                    value.push_str(&more);
                }
                Constant::Str(value)
            }
            TokenKind::Int(text) => {
                Constant::Int(parse_int(text).ok_or_else(|| Self::unexpected(&token, "integer"))?)
            }
            TokenKind::Float(text) => Constant::Float(
                text.parse()
                    .map_err(|_| Self::unexpected(&token, "float"))?,
            ),
            TokenKind::Symbol(sign @ ('-' | '+')) => {
                let negative = *sign == '-';
                match self.constant()? {
                    Constant::Int(v) => Constant::Int(if negative { -v } else { v }),
                    Constant::Float(v) => Constant::Float(if negative { -v } else { v }),
                    Constant::Ident(word) if word == "inf" || word == "nan" => {
                        let v: f64 = word.parse().unwrap_or(f64::NAN);
                        Constant::Float(if negative { -v } else { v })
                    }
                    _ => return Err(Self::unexpected(&token, "numeric constant")),
                }
            }
            TokenKind::Symbol('{') => Constant::Aggregate(self.aggregate_body()?),
            TokenKind::Ident(word) => match word.as_str() {
                "true" => Constant::Bool(true),
                "false" => Constant::Bool(false),
                _ => {
                    let mut name = word.clone();
                    while self.eat_symbol('.') {
                        name.push('.');
                        name.push_str(&self.expect_ident("identifier")?.0);
                    }
                    Constant::Ident(name)
                }
            },
            _ => return Err(Self::unexpected(&token, "constant")),
        };
        Ok(value)
    }

    /// Reads a text-format aggregate after its opening brace.
    fn aggregate_body(&mut self) -> Result<String> {
        let mut depth = 1usize;
        let mut parts = Vec::new();
        loop {
            let token = self.next("'}'")?;
            match &token.kind {
                TokenKind::Symbol('{') => depth += 1,
                TokenKind::Symbol('}') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            parts.push(match &token.kind {
                TokenKind::Ident(s) | TokenKind::Int(s) | TokenKind::Float(s) => s.clone(),
                TokenKind::Str(s) => format!("{s:?}"),
                TokenKind::Symbol(c) => c.to_string(),
                TokenKind::LineComment(_) | TokenKind::BlockComment(_) => continue,
            });
        }
        Ok(parts.join(" "))
    }

    fn option_statement(&mut self) -> Result<OptionDecl> {
        let line = self.expect_keyword("option")?;
        let name = self.option_name()?;
        self.expect_symbol('=')?;
        let value = self.constant()?;
        self.end_statement()?;
        Ok(OptionDecl { name, value, line })
    }

    fn field_options(&mut self) -> Result<Vec<OptionDecl>> {
        let mut options = Vec::new();
        if !self.eat_symbol('[') {
            return Ok(options);
        }
        loop {
            let fallback = self.prev_line;
            let line = self.peek().map_or(fallback, |t| t.line);
            let name = self.option_name()?;
            self.expect_symbol('=')?;
            let value = self.constant()?;
            options.push(OptionDecl { name, value, line });
            if !self.eat_symbol(',') {
                break;
            }
        }
        self.expect_symbol(']')?;
        Ok(options)
    }

    // ---- messages -----------------------------------------------------

    fn open_body(&mut self) -> Result<Option<Comment>> {
        self.expect_symbol('{')?;
        Ok(self.trailing_comment())
    }

    fn close_body(&mut self, comments: &mut Comments) {
        self.eat_symbol(';');
        if let Some(trailing) = self.trailing_comment() {
            match comments.trailing.as_mut() {
                Some(existing) => existing.lines.extend(trailing.lines),
                None => comments.trailing = Some(trailing),
            }
        }
    }

    fn message(&mut self, leading: Option<Comment>) -> Result<Message> {
        let line = self.expect_keyword("message")?;
        let (name, _) = self.expect_ident("message name")?;
        let mut comments = Comments {
            leading,
            trailing: self.open_body()?,
        };
        let mut elements = Vec::new();
        loop {
            let leading = self.leading_comment();
            let token = self.next("'}'")?;
            match &token.kind {
                TokenKind::Symbol('}') => break,
                TokenKind::Symbol(';') => {}
                TokenKind::Symbol('.') => {
                    self.pos -= 1;
                    elements.push(self.field(leading, None)?);
                }
                TokenKind::Ident(word) => {
                    self.pos -= 1;
                    match word.as_str() {
                        "message" => elements.push(MessageElement::Message(self.message(leading)?)),
                        "enum" => elements.push(MessageElement::Enum(self.enumeration(leading)?)),
                        "option" => elements.push(MessageElement::Option(self.option_statement()?)),
                        "reserved" => elements.push(MessageElement::Reserved(self.reserved()?)),
                        "extensions" => self.skip_statement()?,
                        "extend" => self.skip_extend()?,
                        "oneof" => elements.extend(self.oneof()?),
                        "group" => {
                            return Err(ParseError::Unsupported {
                                line: token.line,
                                what: "group field",
                            });
                        }
                        _ => elements.push(self.field(leading, None)?),
                    }
                }
                _ => return Err(Self::unexpected(&token, "message body declaration")),
            }
        }
        self.close_body(&mut comments);
        Ok(Message {
            name,
            elements,
            comments,
            line,
        })
    }

    fn field(&mut self, leading: Option<Comment>, oneof: Option<&str>) -> Result<MessageElement> {
        let fallback = self.prev_line;
        let line = self.peek().map_or(fallback, |t| t.line);
        let label = match self.peek_nth(0) {
            Some(TokenKind::Ident(w)) if w == "repeated" => Label::Repeated,
            Some(TokenKind::Ident(w)) if w == "optional" => Label::Optional,
            Some(TokenKind::Ident(w)) if w == "required" => Label::Required,
            _ => Label::None,
        };
        if label != Label::None {
            self.bump();
        }

        if self.peek_is_ident("map") && self.peek_nth(1) == Some(&TokenKind::Symbol('<')) {
            self.bump();
            self.expect_symbol('<')?;
            let key_type = self.full_ident("map key type")?;
            self.expect_symbol(',')?;
            let value_type = self.full_ident("map value type")?;
            self.expect_symbol('>')?;
            let (name, _) = self.expect_ident("field name")?;
            self.expect_symbol('=')?;
            let number = self.int_literal("field number")?;
            let options = self.field_options()?;
            let trailing = self.end_statement()?;
            return Ok(MessageElement::Map(MapField {
                name,
                key_type,
                value_type,
                number,
                options,
                comments: Comments { leading, trailing },
                line,
            }));
        }

        if self.peek_is_ident("group") {
            return Err(ParseError::Unsupported {
                line,
                what: "group field",
            });
        }

        let type_name = self.full_ident("field type")?;
        let (name, _) = self.expect_ident("field name")?;
        self.expect_symbol('=')?;
        let number = self.int_literal("field number")?;
        let options = self.field_options()?;
        let trailing = self.end_statement()?;
        Ok(MessageElement::Field(Field {
            name,
            type_name,
            number,
            label,
            options,
            comments: Comments { leading, trailing },
            oneof: oneof.map(str::to_string),
            line,
        }))
    }

    fn oneof(&mut self) -> Result<Vec<MessageElement>> {
        self.expect_keyword("oneof")?;
        let (name, _) = self.expect_ident("oneof name")?;
        self.open_body()?;
        let mut fields = Vec::new();
        loop {
            let leading = self.leading_comment();
            if self.eat_symbol('}') {
                break;
            }
            if self.eat_symbol(';') {
                continue;
            }
            if self.peek_is_ident("option") {
                self.option_statement()?;
                continue;
            }
            fields.push(self.field(leading, Some(&name))?);
        }
        self.trailing_comment();
        Ok(fields)
    }

    fn reserved(&mut self) -> Result<Reserved> {
        self.expect_keyword("reserved")?;
        let mut reserved = Reserved::default();
        loop {
            let token = self.peek().cloned().ok_or_else(|| ParseError::UnexpectedEof {
                expected: "reserved range or name".to_string(),
            })?;
            match token.kind {
                TokenKind::Str(_) => reserved.names.push(self.expect_string("reserved name")?),
                TokenKind::Ident(name) => {
                    // editions allow bare identifiers
                    self.bump();
                    reserved.names.push(name);
                }
                _ => {
                    let start = self.int_literal("reserved range")?;
                    let end = if self.peek_is_ident("to") {
                        self.bump();
                        if self.peek_is_ident("max") {
                            self.bump();
                            i64::MAX
                        } else {
                            self.int_literal("reserved range end")?
                        }
                    } else {
                        start
                    };
                    reserved.ranges.push((start, end));
                }
            }
            if !self.eat_symbol(',') {
                break;
            }
        }
        self.end_statement()?;
        Ok(reserved)
    }

    fn skip_statement(&mut self) -> Result<()> {
        while self.next("';'")?.kind != TokenKind::Symbol(';') {}
        self.trailing_comment();
        Ok(())
    }

    fn skip_extend(&mut self) -> Result<()> {
        self.expect_keyword("extend")?;
        self.full_ident("extended type")?;
        self.expect_symbol('{')?;
        self.aggregate_body()?;
        self.trailing_comment();
        Ok(())
    }

    // ---- enums --------------------------------------------------------

    fn enumeration(&mut self, leading: Option<Comment>) -> Result<Enum> {
        let line = self.expect_keyword("enum")?;
        let (name, _) = self.expect_ident("enum name")?;
        let mut comments = Comments {
            leading,
            trailing: self.open_body()?,
        };
        let mut values = Vec::new();
        let mut options = Vec::new();
        let mut reserved = Vec::new();
        loop {
            let leading = self.leading_comment();
            if self.eat_symbol('}') {
                break;
            }
            if self.eat_symbol(';') {
                continue;
            }
            if self.peek_is_ident("option") {
                options.push(self.option_statement()?);
                continue;
            }
            if self.peek_is_ident("reserved") {
                reserved.push(self.reserved()?);
                continue;
            }
            let (value_name, value_line) = self.expect_ident("enum value name")?;
            self.expect_symbol('=')?;
            let number = self.int_literal("enum value")?;
            let value_options = self.field_options()?;
            let trailing = self.end_statement()?;
            values.push(EnumValue {
                name: value_name,
                number,
                options: value_options,
                comments: Comments { leading, trailing },
                line: value_line,
            });
        }
        self.close_body(&mut comments);
        Ok(Enum {
            name,
            values,
            options,
            reserved,
            comments,
            line,
        })
    }

    // ---- services -----------------------------------------------------

    fn service(&mut self, leading: Option<Comment>) -> Result<Service> {
        let line = self.expect_keyword("service")?;
        let (name, _) = self.expect_ident("service name")?;
        let mut comments = Comments {
            leading,
            trailing: self.open_body()?,
        };
        let mut rpcs = Vec::new();
        let mut options = Vec::new();
        loop {
            let leading = self.leading_comment();
            if self.eat_symbol('}') {
                break;
            }
            if self.eat_symbol(';') {
                continue;
            }
            if self.peek_is_ident("option") {
                options.push(self.option_statement()?);
                continue;
            }
            rpcs.push(self.rpc(leading)?);
        }
        self.close_body(&mut comments);
        Ok(Service {
            name,
            rpcs,
            options,
            comments,
            line,
        })
    }

    fn rpc_type(&mut self) -> Result<(String, bool)> {
        self.expect_symbol('(')?;
        let stream = self.peek_is_ident("stream")
            && !matches!(self.peek_nth(1), Some(TokenKind::Symbol(')' | '.')));
        if stream {
            self.bump();
        }
        let type_name = self.full_ident("message type")?;
        self.expect_symbol(')')?;
        Ok((type_name, stream))
    }

    fn rpc(&mut self, leading: Option<Comment>) -> Result<Rpc> {
        let line = self.expect_keyword("rpc")?;
        let (name, _) = self.expect_ident("rpc name")?;
        let (request_type, request_stream) = self.rpc_type()?;
        self.expect_keyword("returns")?;
        let (returns_type, returns_stream) = self.rpc_type()?;

        let mut options = Vec::new();
        let mut comments = Comments {
            leading,
            trailing: None,
        };
        if self.eat_symbol('{') {
            comments.trailing = self.trailing_comment();
            loop {
                self.leading_comment();
                if self.eat_symbol('}') {
                    break;
                }
                if self.eat_symbol(';') {
                    continue;
                }
                options.push(self.option_statement()?);
            }
            self.close_body(&mut comments);
        } else {
            comments.trailing = self.end_statement()?;
        }

        Ok(Rpc {
            name,
            request_type,
            request_stream,
            returns_type,
            returns_stream,
            options,
            comments,
            line,
        })
    }
}
