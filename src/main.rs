use std::{env::args, fs::read_to_string, process::exit};

use rustyline::{error::ReadlineError, DefaultEditor};
use velo::{InterpretError, VM};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = args().collect();
    match args.len() {
        1 => repl(),
        2 => run_file(&args[1]),
        _ => {
            eprintln!("Usage: velo [path]");
            exit(64);
        }
    }
}

fn repl() -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;

    loop {
        let line = match editor.readline("velo> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                return Ok(())
            }
            Err(e) => return Err(e.into()),
        };

        if line == "exit" {
            return Ok(());
        }

        let _ = editor.add_history_entry(line.as_str());

        // Nothing carries over from one line to the next.
        let mut vm = VM::new();
        if vm.interpret(&line).is_ok() {
            if let Some(value) = vm.result() {
                println!("{}", vm.display(value));
            }
        }
    }
}

fn run_file(path: &str) -> anyhow::Result<()> {
    let source = read_file(path);
    let mut vm = VM::new();

    let result = vm.interpret(&source);
    drop(vm);

    match result {
        Err(InterpretError::Compile(_)) => exit(65),
        Err(InterpretError::Runtime(_)) => exit(70),
        Ok(()) => Ok(()),
    }
}

fn read_file(path: &str) -> String {
    match read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading file {}: {}", path, e);
            exit(74);
        }
    }
}
