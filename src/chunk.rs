use std::{
    convert::{TryFrom, TryInto},
    fmt::Write,
};

use crate::{heap::Heap, value::Value};

/// Instruction set. Every instruction is a single opcode byte; only
/// `Constant` is followed by a one byte constant pool index.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum Opcode {
    Constant,
    Return,
    Negate,
    Add,
    Sub,
    Mul,
    Div,
    Not,
    Equal,
    Greater,
    Less,
    True,
    False,
    Nil,
}

impl Opcode {
    pub fn to_str(self) -> &'static str {
        match self {
            Opcode::Constant => "Constant",
            Opcode::Return => "Return",
            Opcode::Negate => "Negate",
            Opcode::Add => "Add",
            Opcode::Sub => "Sub",
            Opcode::Mul => "Mul",
            Opcode::Div => "Div",
            Opcode::Not => "Not",
            Opcode::Equal => "Equal",
            Opcode::Greater => "Greater",
            Opcode::Less => "Less",
            Opcode::True => "True",
            Opcode::False => "False",
            Opcode::Nil => "Nil",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as _
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Opcode::Constant),
            1 => Ok(Opcode::Return),
            2 => Ok(Opcode::Negate),
            3 => Ok(Opcode::Add),
            4 => Ok(Opcode::Sub),
            5 => Ok(Opcode::Mul),
            6 => Ok(Opcode::Div),
            7 => Ok(Opcode::Not),
            8 => Ok(Opcode::Equal),
            9 => Ok(Opcode::Greater),
            10 => Ok(Opcode::Less),
            11 => Ok(Opcode::True),
            12 => Ok(Opcode::False),
            13 => Ok(Opcode::Nil),
            n => Err(n),
        }
    }
}

#[derive(Debug, Default)]
pub struct Chunk {
    pub code: Vec<u8>,
    pub lines: Vec<usize>,
    pub constants: Vec<Value>,
}

impl Chunk {
    /// The constant operand is a single byte.
    pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

    pub fn new() -> Chunk {
        Chunk {
            code: Vec::new(),
            lines: Vec::new(),
            constants: Vec::new(),
        }
    }

    pub fn write(&mut self, byte: impl Into<u8>, line: usize) {
        if self.code.len() == self.code.capacity() {
            let capacity = grow_capacity(self.code.capacity());
            self.code.reserve_exact(capacity - self.code.len());
            self.lines.reserve_exact(capacity - self.lines.len());
        }

        self.code.push(byte.into());
        self.lines.push(line);
    }

    /// Callers must check [`Chunk::MAX_CONSTANTS`] first, the compiler
    /// reports it as an error before it gets here.
    pub fn add_constant(&mut self, value: Value) -> u8 {
        debug_assert!(
            self.constants.len() < Chunk::MAX_CONSTANTS,
            "constant pool overflow"
        );

        self.constants.push(value);
        (self.constants.len() - 1) as u8
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

fn grow_capacity(capacity: usize) -> usize {
    if capacity < 10 {
        10
    } else {
        capacity * 2
    }
}

// Debug helpers
impl Chunk {
    pub fn disassemble(&self, name: &str, heap: &Heap) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== {} ==", name);

        for (row, bytes) in self.code.chunks(8).enumerate() {
            let _ = write!(out, "{:04} >", row * 8);
            for byte in bytes {
                let _ = write!(out, " {:02X}", byte);
            }
            out.push('\n');
        }

        let mut offset = 0;
        while offset < self.code.len() {
            offset = self.disassemble_instruction(offset, heap, &mut out);
        }

        out
    }

    pub fn disassemble_instruction(
        &self,
        offset: usize,
        heap: &Heap,
        out: &mut String,
    ) -> usize {
        let _ = write!(out, "{:04} ", offset);

        if offset > 0 && self.lines[offset] == self.lines[offset - 1] {
            out.push_str("   | ");
        } else {
            let _ = write!(out, "{:>4} ", self.lines[offset]);
        }

        let opcode: Result<Opcode, _> = self.code[offset].try_into();

        match opcode {
            Ok(op @ Opcode::Constant) => {
                self.constant_instruction(op, offset, heap, out)
            }
            Ok(op) => {
                let _ = writeln!(out, "{}", op.to_str());
                offset + 1
            }
            Err(n) => {
                let _ = writeln!(out, "Unknown opcode {}", n);
                offset + 1
            }
        }
    }

    fn constant_instruction(
        &self,
        op: Opcode,
        offset: usize,
        heap: &Heap,
        out: &mut String,
    ) -> usize {
        match self.code.get(offset + 1) {
            Some(&index) => {
                let _ = write!(out, "{:<16} {:4} ", op.to_str(), index);
                match self.constants.get(index as usize) {
                    Some(value) => {
                        let _ = writeln!(out, "'{}'", value.display(heap));
                    }
                    None => out.push_str("<bad constant>\n"),
                }
                offset + 2
            }
            None => {
                let _ = writeln!(out, "{:<16} <missing operand>", op.to_str());
                offset + 1
            }
        }
    }
}
