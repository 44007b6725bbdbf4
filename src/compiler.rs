use log::debug;

use crate::{
    chunk::{Chunk, Opcode},
    heap::Heap,
    parser::{CompileError, Parser, Precedence, Rule},
    scanner::{Kind, Scanner},
    value::Value,
};

/// Compiles a single expression into `chunk`. Strings are interned into
/// `heap` as they're found, even if compilation fails later on.
pub fn compile(
    source: &str,
    chunk: &mut Chunk,
    heap: &mut Heap,
) -> Result<(), CompileError> {
    let mut parser = Parser::new(Scanner::new(source));
    parser.advance(); // prime the pump

    let mut context = Context {
        parser,
        chunk,
        heap,
        depth: 0,
    };

    context.expression();
    context
        .parser
        .consume(Kind::Eof, "Expect end of expression.");
    context.end_compiler();

    context.parser.finish()
}

/// How many `parse_precedence` calls may be live at once.
pub const MAX_DEPTH: usize = 1024;

pub struct Context<'src, 'heap> {
    parser: Parser<'src>,
    chunk: &'heap mut Chunk,
    heap: &'heap mut Heap,
    depth: usize,
}

impl<'src, 'heap> Context<'src, 'heap> {
    fn end_compiler(&mut self) {
        self.emit_byte(Opcode::Return);

        if cfg!(feature = "debug_trace") && !self.parser.had_error() {
            debug!("{}", self.chunk.disassemble("code", &*self.heap));
        }
    }

    fn emit_byte(&mut self, byte: impl Into<u8>) {
        let line = self.parser.previous.line;
        self.chunk.write(byte, line);
    }

    fn emit_bytes(&mut self, byte1: impl Into<u8>, byte2: impl Into<u8>) {
        self.emit_byte(byte1);
        self.emit_byte(byte2);
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit_bytes(Opcode::Constant, index)
    }

    fn make_constant(&mut self, value: impl Into<Value>) -> u8 {
        if self.chunk.constants.len() >= Chunk::MAX_CONSTANTS {
            self.parser.error("Too many constants in one chunk.");
            0
        } else {
            self.chunk.add_constant(value.into())
        }
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        if self.depth == MAX_DEPTH {
            self.parser.error_at_current("Expression nested too deeply.");
            return;
        }

        self.depth += 1;
        self.parser.advance();
        let prefix_rule = Rule::get(self.parser.previous.kind).prefix();

        let prefix_rule = match prefix_rule {
            Some(rule) => rule,
            None => {
                self.parser.error("Expect expression.");
                self.depth -= 1;
                return;
            }
        };

        prefix_rule(self);

        while precedence <= Rule::get(self.parser.current.kind).precedence() {
            self.parser.advance();
            let infix_rule = Rule::get(self.parser.previous.kind).infix();

            // Anything with a precedence above `None` has an infix rule.
            if let Some(infix_rule) = infix_rule {
                infix_rule(self);
            }
        }

        self.depth -= 1;
    }
}

// parse/visit methods
impl<'src, 'heap> Context<'src, 'heap> {
    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    pub fn number(&mut self) {
        match self.parser.previous.lexeme.parse::<f64>() {
            Ok(number) => self.emit_constant(Value::from(number)),
            Err(_) => self.parser.error("Invalid number literal."),
        }
    }

    pub fn string(&mut self) {
        let obj = {
            let body = self.parser.previous.lexeme;
            self.heap.copy_string(&body[1..body.len() - 1])
        };

        self.emit_constant(Value::from(obj))
    }

    pub fn literal(&mut self) {
        match self.parser.previous.kind {
            Kind::False => self.emit_byte(Opcode::False),
            Kind::Nil => self.emit_byte(Opcode::Nil),
            Kind::True => self.emit_byte(Opcode::True),
            _ => {}
        }
    }

    pub fn group(&mut self) {
        self.expression();
        self.parser
            .consume(Kind::RightParen, "Expect ')' after expression.");
    }

    pub fn unary(&mut self) {
        let operator_kind = self.parser.previous.kind;

        self.parse_precedence(Precedence::Unary);

        match operator_kind {
            Kind::Bang => self.emit_byte(Opcode::Not),
            Kind::Minus => self.emit_byte(Opcode::Negate),
            _ => {}
        }
    }

    pub fn binary(&mut self) {
        let operator_kind = self.parser.previous.kind;
        let rule = Rule::get(operator_kind);

        self.parse_precedence(rule.precedence().next());

        {
            use Kind as K;
            use Opcode::*;
            match operator_kind {
                K::BangEqual => self.emit_bytes(Equal, Not),
                K::EqualEqual => self.emit_byte(Equal),
                K::Greater => self.emit_byte(Greater),
                K::GreaterEqual => self.emit_bytes(Less, Not),
                K::Less => self.emit_byte(Less),
                K::LessEqual => self.emit_bytes(Greater, Not),
                K::Plus => self.emit_byte(Add),
                K::Minus => self.emit_byte(Sub),
                K::Star => self.emit_byte(Mul),
                K::Slash => self.emit_byte(Div),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::Location, string::ObjString};

    fn code(source: &str) -> (Chunk, Heap) {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        compile(source, &mut chunk, &mut heap).unwrap();
        (chunk, heap)
    }

    fn error(source: &str) -> CompileError {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        compile(source, &mut chunk, &mut heap).unwrap_err()
    }

    fn op(op: Opcode) -> u8 {
        op.into()
    }

    #[test]
    fn factor_binds_tighter_than_term() {
        let (chunk, _) = code("1 + 2 * 3");
        assert_eq!(
            chunk.code,
            vec![
                op(Opcode::Constant),
                0,
                op(Opcode::Constant),
                1,
                op(Opcode::Constant),
                2,
                op(Opcode::Mul),
                op(Opcode::Add),
                op(Opcode::Return),
            ]
        );
        assert_eq!(
            chunk.constants,
            vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]
        );
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let (chunk, _) = code("1 - 2 - 3");
        assert_eq!(
            chunk.code,
            vec![
                op(Opcode::Constant),
                0,
                op(Opcode::Constant),
                1,
                op(Opcode::Sub),
                op(Opcode::Constant),
                2,
                op(Opcode::Sub),
                op(Opcode::Return),
            ]
        );
    }

    #[test]
    fn negated_comparisons_lower_to_two_instructions() {
        let (ne, _) = code("1 != 2");
        assert_eq!(&ne.code[4..], &[op(Opcode::Equal), op(Opcode::Not), op(Opcode::Return)]);

        let (ge, _) = code("1 >= 2");
        assert_eq!(&ge.code[4..], &[op(Opcode::Less), op(Opcode::Not), op(Opcode::Return)]);

        let (le, _) = code("1 <= 2");
        assert_eq!(
            &le.code[4..],
            &[op(Opcode::Greater), op(Opcode::Not), op(Opcode::Return)]
        );
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        let (chunk, _) = code("-1 * !true");
        assert_eq!(
            chunk.code,
            vec![
                op(Opcode::Constant),
                0,
                op(Opcode::Negate),
                op(Opcode::True),
                op(Opcode::Not),
                op(Opcode::Mul),
                op(Opcode::Return),
            ]
        );
    }

    #[test]
    fn literals_have_their_own_opcodes() {
        let (chunk, _) = code("nil == false");
        assert_eq!(
            chunk.code,
            vec![op(Opcode::Nil), op(Opcode::False), op(Opcode::Equal), op(Opcode::Return)]
        );
        assert!(chunk.constants.is_empty());
    }

    #[test]
    fn string_literals_are_interned_without_quotes() {
        let (chunk, heap) = code("\"ab\" + \"ab\"");
        assert_eq!(chunk.constants.len(), 2);
        assert_eq!(chunk.constants[0], chunk.constants[1]);

        let obj = chunk.constants[0].as_obj().unwrap();
        assert_eq!(heap.get::<ObjString>(obj).unwrap().as_str(), "ab");
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn lines_follow_the_source() {
        let (chunk, _) = code("1 +\n2");
        assert_eq!(chunk.lines, vec![1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn missing_operand_reports_at_end() {
        let err = error("1 +");
        assert_eq!(err.first.message, "Expect expression.");
        assert_eq!(err.first.location, Location::AtEnd);
        assert_eq!(err.first.line, 1);
    }

    #[test]
    fn unclosed_group() {
        let err = error("(1 + 2");
        assert_eq!(err.first.message, "Expect ')' after expression.");
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = error("1 2");
        assert_eq!(err.first.message, "Expect end of expression.");
        assert_eq!(err.first.location, Location::At(String::from("2")));
    }

    #[test]
    fn keywords_without_rules_are_not_expressions() {
        let err = error("var");
        assert_eq!(err.first.message, "Expect expression.");
        assert_eq!(err.first.location, Location::At(String::from("var")));
    }

    #[test]
    fn lexer_errors_surface_without_a_lexeme() {
        let err = error("\"open");
        assert_eq!(err.first.message, "Unterminated string.");
        assert_eq!(err.first.location, Location::None);
    }

    #[test]
    fn later_errors_are_suppressed() {
        let err = error(") )");
        assert_eq!(err.first.location, Location::At(String::from(")")));
        assert!(err.suppressed > 0);
    }

    #[test]
    fn constant_pool_overflow_is_a_compile_error() {
        let source = vec!["1"; Chunk::MAX_CONSTANTS + 1].join(" + ");
        let err = error(&source);
        assert_eq!(err.first.message, "Too many constants in one chunk.");

        let source = vec!["1"; Chunk::MAX_CONSTANTS].join(" + ");
        let (chunk, _) = code(&source);
        assert_eq!(chunk.constants.len(), Chunk::MAX_CONSTANTS);
    }

    #[test]
    fn nesting_is_limited() {
        let err = error(&format!("{}1", "-".repeat(200_000)));
        assert_eq!(err.first.message, "Expression nested too deeply.");
        assert_eq!(err.first.location, Location::At(String::from("-")));

        let depth = MAX_DEPTH - 1;
        let source =
            format!("{}1{}", "(".repeat(depth / 2), ")".repeat(depth / 2));
        code(&source);
    }
}
