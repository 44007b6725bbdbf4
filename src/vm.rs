use std::convert::TryFrom;

use log::{debug, trace};

use crate::{
    chunk::{Chunk, Opcode},
    compiler::compile,
    heap::Heap,
    parser::CompileError,
    value::{values_equal, TypeError, Value, ValueDisplay},
};

macro_rules! binop {
    ($vm:expr, $op:expr) => {{
        let r = $vm.pop();
        let l = $vm.pop();
        match $op(l, r) {
            Ok(v) => $vm.push(v)?,
            Err(e) => return Err($vm.runtime_error(e)),
        }
    }};
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpretError {
    #[error("{0}")]
    Compile(#[from] CompileError),
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Fault {
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error("Stack overflow.")]
    StackOverflow,
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("[line {line}] {fault}")]
pub struct RuntimeError {
    pub line: usize,
    pub fault: Fault,
}

/// Compiles and runs one expression at a time.
///
/// The VM owns the chunk it executes, the value stack, and (through its
/// [`Heap`]) every object created along the way. Objects stay alive until
/// [`VM::reset`] or drop.
pub struct VM {
    chunk: Chunk,
    ip: usize,
    stack: [Value; VM::STACK_MAX],
    stack_top: usize,
    heap: Heap,
}

impl Default for VM {
    fn default() -> Self {
        VM::new()
    }
}

impl Drop for VM {
    fn drop(&mut self) {
        self.free();
    }
}

impl VM {
    pub const STACK_MAX: usize = 256;

    pub fn new() -> VM {
        VM {
            chunk: Chunk::new(),
            ip: 0,
            stack: [Value::Nil; VM::STACK_MAX],
            stack_top: 0,
            heap: Heap::new(),
        }
    }

    /// An empty source is a successful no-op.
    pub fn interpret(&mut self, source: &str) -> Result<(), InterpretError> {
        if source.is_empty() {
            return Ok(());
        }

        self.chunk = Chunk::new();
        self.ip = 0;
        self.reset_stack();

        debug!("compiling {} bytes", source.len());
        compile(source, &mut self.chunk, &mut self.heap)?;

        debug!("running {} bytes of code", self.chunk.len());
        self.run()?;

        Ok(())
    }

    /// Tears everything down and leaves the VM ready for the next
    /// [`VM::interpret`].
    pub fn reset(&mut self) {
        self.free();
        self.ip = 0;
        self.reset_stack();
    }

    fn free(&mut self) {
        self.heap.free_objects();
        self.chunk = Chunk::new();
        self.heap.free_strings();
    }

    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack[..self.stack_top]
    }

    /// The value the last run left on top of the stack.
    pub fn result(&self) -> Option<Value> {
        self.stack().last().copied()
    }

    pub fn display(&self, value: Value) -> ValueDisplay<'_> {
        value.display(&self.heap)
    }

    fn reset_stack(&mut self) {
        self.stack_top = 0;
    }

    fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack_top == VM::STACK_MAX {
            return Err(self.runtime_error(Fault::StackOverflow));
        }

        self.stack[self.stack_top] = value;
        self.stack_top += 1;
        Ok(())
    }

    fn peek(&self, distance: usize) -> Value {
        self.stack[self.stack_top - 1 - distance]
    }

    fn pop(&mut self) -> Value {
        if self.stack_top == 0 {
            panic!("stack underflow at offset {}", self.ip - 1);
        }

        self.stack_top -= 1;
        self.stack[self.stack_top]
    }

    fn run(&mut self) -> Result<(), RuntimeError> {
        loop {
            if cfg!(feature = "debug_trace") {
                let mut line = String::new();
                self.chunk
                    .disassemble_instruction(self.ip, &self.heap, &mut line);
                let stack: Vec<String> = self
                    .stack()
                    .iter()
                    .map(|v| format!("[ {} ]", self.display(*v)))
                    .collect();
                trace!("{}  {}", stack.join(" "), line.trim_end());
            }

            let byte = self.read_byte();
            let instruction = match Opcode::try_from(byte) {
                Ok(op) => op,
                Err(n) => panic!("unknown opcode {} at offset {}", n, self.ip - 1),
            };

            match instruction {
                Opcode::Constant => {
                    let constant = self.read_constant();
                    self.push(constant)?;
                }

                Opcode::Return => return Ok(()),

                Opcode::Negate => match self.peek(0).negate() {
                    Ok(v) => {
                        self.pop();
                        self.push(v)?;
                    }
                    Err(e) => return Err(self.runtime_error(e)),
                },

                Opcode::Not => {
                    let b = self.pop();
                    self.push(b.is_falsey().into())?;
                }

                Opcode::Add => {
                    let r = self.peek(0);
                    let l = self.peek(1);

                    match l.add(r, &mut self.heap) {
                        Ok(v) => {
                            self.pop();
                            self.pop();
                            self.push(v)?;
                        }
                        Err(e) => return Err(self.runtime_error(e)),
                    }
                }

                Opcode::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    let equal = values_equal(a, b, &self.heap);
                    self.push(equal.into())?;
                }

                Opcode::Nil => self.push(Value::Nil)?,
                Opcode::True => self.push(Value::from(true))?,
                Opcode::False => self.push(Value::from(false))?,
                Opcode::Sub => binop!(self, std::ops::Sub::sub),
                Opcode::Mul => binop!(self, std::ops::Mul::mul),
                Opcode::Div => binop!(self, std::ops::Div::div),
                Opcode::Greater => binop!(self, Value::greater_than),
                Opcode::Less => binop!(self, Value::less_than),
            }
        }
    }

    fn read_byte(&mut self) -> u8 {
        let byte = self.chunk.code[self.ip];
        self.ip += 1;
        byte
    }

    fn read_constant(&mut self) -> Value {
        let index = self.read_byte() as usize;
        self.chunk.constants[index]
    }

    /// Reports against the line of the instruction that just executed and
    /// clears the stack.
    fn runtime_error(&mut self, fault: impl Into<Fault>) -> RuntimeError {
        let error = RuntimeError {
            line: self.chunk.lines[self.ip - 1],
            fault: fault.into(),
        };

        eprintln!("{}", error);
        self.reset_stack();
        error
    }
}
