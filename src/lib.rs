//! A compiler and stack VM for a small expression language: numbers,
//! booleans, `nil` and interned strings, with arithmetic, comparison and
//! concatenation.
//!
//! ```
//! use velo::{Value, VM};
//!
//! let mut vm = VM::new();
//! vm.interpret("(1 + 2) * 3").unwrap();
//! assert_eq!(vm.result(), Some(Value::Number(9.0)));
//! ```

pub mod chunk;
pub mod compiler;
pub mod heap;
pub mod object;
pub mod parser;
pub mod scanner;
pub mod string;
pub mod table;
pub mod value;
pub mod vm;

pub use chunk::{Chunk, Opcode};
pub use compiler::compile;
pub use heap::{Heap, ObjRef};
pub use parser::{CompileError, Diagnostic};
pub use value::{values_equal, Value};
pub use vm::{InterpretError, RuntimeError, VM};
