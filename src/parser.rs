use std::fmt::{self, Display, Formatter};

use crate::{
    compiler::Context,
    scanner::{Kind, Scanner, Token},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// Lexer errors carry their message in place of a lexeme.
    None,
    AtEnd,
    At(String),
}

/// A single reported compile error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct Diagnostic {
    pub line: usize,
    pub location: Location,
    pub message: String,
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Location::None => Ok(()),
            Location::AtEnd => write!(f, " at end"),
            Location::At(lexeme) => write!(f, " at '{}'", lexeme),
        }
    }
}

/// The first diagnostic of a failed compile. Anything after it was swallowed
/// by panic mode and only counted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{first}")]
pub struct CompileError {
    pub first: Diagnostic,
    pub suppressed: usize,
}

#[derive(Debug)]
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    pub current: Token<'a>,
    pub previous: Token<'a>,
    pub panic_mode: bool,
    first_error: Option<Diagnostic>,
    suppressed: usize,
}

impl<'a> Parser<'a> {
    pub fn new(scanner: Scanner<'a>) -> Parser<'a> {
        Parser {
            scanner,
            current: Token::fake(),
            previous: Token::fake(),
            panic_mode: false,
            first_error: None,
            suppressed: 0,
        }
    }

    pub fn had_error(&self) -> bool {
        self.first_error.is_some()
    }

    pub fn advance(&mut self) {
        self.previous = self.current;

        loop {
            self.current = self.scanner.token();

            if self.current.kind != Kind::Error {
                break;
            }

            self.error_at_current(self.current.lexeme);
        }
    }

    pub fn check(&self, kind: Kind) -> bool {
        self.current.kind == kind
    }

    pub fn consume(&mut self, kind: Kind, message: &str) {
        if self.check(kind) {
            self.advance();
        } else {
            self.error_at_current(message)
        }
    }

    pub fn error_at_current(&mut self, message: &str) {
        self.error_at(self.current, message)
    }

    pub fn error(&mut self, message: &str) {
        self.error_at(self.previous, message)
    }

    // There are no statements to resynchronize on, so panic mode lasts for
    // the rest of the compile.
    fn error_at(&mut self, token: Token<'a>, message: &str) {
        if self.panic_mode {
            self.suppressed += 1;
            return;
        }

        self.panic_mode = true;

        let location = match token.kind {
            Kind::Eof => Location::AtEnd,
            Kind::Error => Location::None,
            _ => Location::At(token.lexeme.to_owned()),
        };

        let diagnostic = Diagnostic {
            line: token.line,
            location,
            message: message.to_owned(),
        };

        eprintln!("{}", diagnostic);
        self.first_error = Some(diagnostic);
    }

    pub fn finish(self) -> Result<(), CompileError> {
        match self.first_error {
            Some(first) => Err(CompileError {
                first,
                suppressed: self.suppressed,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum Precedence {
    None = 0,
    Assignment = 1,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
}

impl Precedence {
    pub fn next(self) -> Precedence {
        use Precedence::*;
        match self {
            None => Assignment,
            Assignment => Equality,
            Equality => Comparison,
            Comparison => Term,
            Term => Factor,
            Factor => Unary,
            Unary => Unary,
        }
    }
}

pub type ParseFn<'s, 'h> = Option<fn(&mut Context<'s, 'h>)>;

#[derive(Clone, Copy)]
pub struct Rule<'s, 'h>(
    pub ParseFn<'s, 'h>,
    pub ParseFn<'s, 'h>,
    pub Precedence,
);

impl<'s, 'h> Rule<'s, 'h> {
    pub fn prefix(&self) -> ParseFn<'s, 'h> {
        self.0
    }

    pub fn infix(&self) -> ParseFn<'s, 'h> {
        self.1
    }

    pub fn precedence(&self) -> Precedence {
        self.2
    }

    pub fn get(kind: Kind) -> Self {
        #[rustfmt::skip]
        let rules: &[Rule<'s, 'h>] = {
            use std::option::Option::{None as N, Some as S};
            use crate::parser::Precedence::*;
            use crate::compiler::Context as C;
            &[
                // Single-character tokens.
                Rule(S(C::group),   N,            None),       // LeftParen,
                Rule(N,             N,            None),       // RightParen,
                Rule(N,             N,            None),       // LeftBrace,
                Rule(N,             N,            None),       // RightBrace,
                Rule(N,             N,            None),       // Comma,
                Rule(N,             N,            None),       // Dot,
                Rule(S(C::unary),   S(C::binary), Term),       // Minus,
                Rule(N,             S(C::binary), Term),       // Plus,
                Rule(N,             N,            None),       // Semicolon,
                Rule(N,             S(C::binary), Factor),     // Slash,
                Rule(N,             S(C::binary), Factor),     // Star,

                // One or two character tokens.
                Rule(S(C::unary),   N,            None),       // Bang,
                Rule(N,             S(C::binary), Equality),   // BangEqual,
                Rule(N,             N,            None),       // Equal,
                Rule(N,             S(C::binary), Equality),   // EqualEqual,
                Rule(N,             S(C::binary), Comparison), // Greater,
                Rule(N,             S(C::binary), Comparison), // GreaterEqual,
                Rule(N,             S(C::binary), Comparison), // Less,
                Rule(N,             S(C::binary), Comparison), // LessEqual,

                // Literals.
                Rule(N,             N,            None),       // Identifier,
                Rule(S(C::string),  N,            None),       // String,
                Rule(S(C::number),  N,            None),       // Number,

                // Keywords.
                Rule(S(C::literal), N,            None),       // False,
                Rule(S(C::literal), N,            None),       // Nil,
                Rule(N,             N,            None),       // Print,
                Rule(N,             N,            None),       // Return,
                Rule(S(C::literal), N,            None),       // True,
                Rule(N,             N,            None),       // Var,
                Rule(N,             N,            None),       // Error,
                Rule(N,             N,            None),       // Eof,
            ]
        };

        rules[kind as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_climbs_in_order() {
        assert!(Precedence::Assignment < Precedence::Equality);
        assert!(Precedence::Equality < Precedence::Comparison);
        assert!(Precedence::Comparison < Precedence::Term);
        assert!(Precedence::Term < Precedence::Factor);
        assert!(Precedence::Factor < Precedence::Unary);
        assert_eq!(Precedence::Term.next(), Precedence::Factor);
    }

    #[test]
    fn rule_table_lines_up_with_token_kinds() {
        assert_eq!(Rule::get(Kind::Plus).precedence(), Precedence::Term);
        assert_eq!(Rule::get(Kind::Star).precedence(), Precedence::Factor);
        assert_eq!(
            Rule::get(Kind::LessEqual).precedence(),
            Precedence::Comparison
        );
        assert_eq!(Rule::get(Kind::BangEqual).precedence(), Precedence::Equality);
        assert!(Rule::get(Kind::Number).prefix().is_some());
        assert!(Rule::get(Kind::True).prefix().is_some());
        assert!(Rule::get(Kind::Nil).prefix().is_some());
        assert!(Rule::get(Kind::Identifier).prefix().is_none());
        assert!(Rule::get(Kind::Eof).prefix().is_none());
        assert!(Rule::get(Kind::Bang).infix().is_none());
    }

    #[test]
    fn only_the_first_error_is_kept() {
        let mut parser = Parser::new(Scanner::new("@ #"));
        parser.advance();
        parser.advance();
        parser.error_at_current("Something else.");

        let err = parser.finish().unwrap_err();
        assert_eq!(err.first.message, "Unexpected character.");
        assert_eq!(err.first.location, Location::None);
        assert_eq!(err.suppressed, 2);
    }

    #[test]
    fn diagnostics_render_their_location() {
        let at = Diagnostic {
            line: 3,
            location: Location::At(String::from("+")),
            message: String::from("Expect expression."),
        };
        assert_eq!(at.to_string(), "[line 3] Error at '+': Expect expression.");

        let end = Diagnostic {
            line: 1,
            location: Location::AtEnd,
            message: String::from("Expect expression."),
        };
        assert_eq!(end.to_string(), "[line 1] Error at end: Expect expression.");
    }
}
