//! Intérprete mínimo del subconjunto de MIPS que produce el compilador.
//!
//! Los saltos se ejecutan sin delay slot; esto es equivalente a la
//! semántica real porque el compilador siempre llena el delay slot
//! con `nop`. `print_int` y `print_str` se resuelven aquí mismo.

#![allow(dead_code)]

use std::collections::HashMap;

/// Dirección de retorno ficticia con la que se invoca a `main`.
const EXIT: i32 = -1;

/// Base de las direcciones asignadas a strings de `.data`.
const DATA_BASE: i32 = 0x1000_0000;

/// Resultado de ejecutar un programa.
#[derive(Debug)]
pub struct Run {
    pub exit_code: i32,
    pub output: String,
}

/// Compila y ejecuta un programa completo.
pub fn run(source: &str) -> Run {
    let asm = mipscc::compile(source).unwrap_or_else(|error| panic!("{}", error));
    execute(&asm)
}

/// Ejecuta el cuerpo de `main` dado.
pub fn run_main(body: &str) -> Run {
    run(&format!("int main() {{\n{}\n}}", body))
}

/// Valor de retorno de un `main` con el cuerpo dado.
pub fn returns(body: &str) -> i32 {
    run_main(body).exit_code
}

enum Line {
    Label(String),
    Instruction(String, Vec<String>),
}

pub fn execute(asm: &str) -> Run {
    let mut strings = HashMap::new();
    let mut program = Vec::new();
    let mut in_data = false;

    for line in asm.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match line {
            ".data" => in_data = true,
            ".text" => in_data = false,
            _ if line.starts_with(".globl") => (),

            _ if in_data => {
                let (label, directive) = line.split_once(':').expect("bad data line");
                let literal = directive
                    .trim()
                    .strip_prefix(".asciiz")
                    .expect("unknown directive")
                    .trim();

                let address = DATA_BASE + 0x100 * strings.len() as i32;
                strings.insert(label.to_string(), (address, unescape(literal)));
            }

            _ if line.ends_with(':') => {
                program.push(Line::Label(line.trim_end_matches(':').to_string()))
            }

            _ => {
                let (opcode, operands) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
                let operands = operands
                    .split(',')
                    .map(|operand| operand.trim().to_string())
                    .filter(|operand| !operand.is_empty())
                    .collect();

                program.push(Line::Instruction(opcode.to_string(), operands));
            }
        }
    }

    Machine::new(program, strings).run()
}

struct Machine {
    program: Vec<Line>,
    labels: HashMap<String, usize>,
    strings: HashMap<String, (i32, String)>,
    regs: HashMap<String, i32>,
    memory: HashMap<i32, i32>,
    hi: i32,
    lo: i32,
    output: String,
}

impl Machine {
    fn new(program: Vec<Line>, strings: HashMap<String, (i32, String)>) -> Self {
        let labels = program
            .iter()
            .enumerate()
            .filter_map(|(index, line)| match line {
                Line::Label(label) => Some((label.clone(), index)),
                _ => None,
            })
            .collect();

        let mut regs = HashMap::new();
        regs.insert("$sp".to_string(), 0x7fff_eff0);
        regs.insert("$fp".to_string(), 0x7fff_eff0);
        regs.insert("$ra".to_string(), EXIT);

        Machine {
            program,
            labels,
            strings,
            regs,
            memory: HashMap::new(),
            hi: 0,
            lo: 0,
            output: String::new(),
        }
    }

    fn run(mut self) -> Run {
        let mut pc = self.labels["main"];

        for _ in 0..1_000_000 {
            let (opcode, operands) = match &self.program[pc] {
                Line::Label(_) => {
                    pc += 1;
                    continue;
                }

                Line::Instruction(opcode, operands) => (opcode.clone(), operands.clone()),
            };

            pc += 1;
            let op = |i: usize| operands[i].as_str();

            match opcode.as_str() {
                "nop" => (),
                "li" => self.set(op(0), op(1).parse().expect("bad immediate")),
                "la" => {
                    let address = self.strings[op(1)].0;
                    self.set(op(0), address);
                }

                "move" => {
                    let value = self.get(op(1));
                    self.set(op(0), value);
                }

                "lw" => {
                    let address = self.address(op(1));
                    let value = *self.memory.get(&address).unwrap_or(&0);
                    self.set(op(0), value);
                }

                "sw" => {
                    let address = self.address(op(1));
                    let value = self.get(op(0));
                    self.memory.insert(address, value);
                }

                "addi" => self.trapping(op(0), self.get(op(1)).checked_add(op(2).parse().unwrap())),
                "xori" => self.set(op(0), self.get(op(1)) ^ op(2).parse::<i32>().unwrap()),
                "sltiu" => {
                    let less = (self.get(op(1)) as u32) < op(2).parse::<u32>().unwrap();
                    self.set(op(0), less as i32);
                }

                "add" => self.trapping(op(0), self.get(op(1)).checked_add(self.get(op(2)))),
                "sub" => self.trapping(op(0), self.get(op(1)).checked_sub(self.get(op(2)))),
                "subu" => self.set(op(0), self.get(op(1)).wrapping_sub(self.get(op(2)))),
                "mul" => self.set(op(0), self.get(op(1)).wrapping_mul(self.get(op(2)))),
                "slt" => self.set(op(0), (self.get(op(1)) < self.get(op(2))) as i32),
                "sltu" => {
                    let less = (self.get(op(1)) as u32) < (self.get(op(2)) as u32);
                    self.set(op(0), less as i32);
                }

                "div" => {
                    let (dividend, divisor) = (self.get(op(0)), self.get(op(1)));
                    assert_ne!(divisor, 0, "division by zero");
                    self.lo = dividend.wrapping_div(divisor);
                    self.hi = dividend.wrapping_rem(divisor);
                }

                "mflo" => self.set(op(0), self.lo),
                "mfhi" => self.set(op(0), self.hi),

                "beq" => {
                    if self.get(op(0)) == self.get(op(1)) {
                        pc = self.labels[op(2)];
                    }
                }

                "j" => pc = self.labels[op(0)],
                "jal" => self.intrinsic(op(0)),
                "jr" => {
                    let target = self.get(op(0));
                    assert_eq!(target, EXIT, "jr to unknown address");

                    return Run {
                        exit_code: self.get("$v0"),
                        output: self.output,
                    };
                }

                other => panic!("unsupported instruction `{}`", other),
            }
        }

        panic!("program did not terminate");
    }

    fn intrinsic(&mut self, name: &str) {
        let argument = self.get("$a0");
        match name {
            "print_int" => self.output.push_str(&argument.to_string()),
            "print_str" => {
                let (_, string) = self
                    .strings
                    .values()
                    .find(|(address, _)| *address == argument)
                    .expect("print_str of unknown address");

                let string = string.clone();
                self.output.push_str(&string);
            }

            other => panic!("call to unknown function `{}`", other),
        }

        // Registros temporales no se preservan entre llamadas
        for t in 0..8 {
            self.regs.insert(format!("$t{}", t), 0x0bad_0bad);
        }
    }

    /// `add`, `addi` y `sub` generan una excepción en overflow.
    fn trapping(&mut self, reg: &str, result: Option<i32>) {
        let value = result.unwrap_or_else(|| panic!("integer overflow exception"));
        self.set(reg, value);
    }

    fn address(&self, operand: &str) -> i32 {
        let (offset, base) = operand
            .trim_end_matches(')')
            .split_once('(')
            .expect("bad memory operand");

        let address = self.get(base) + offset.parse::<i32>().expect("bad offset");
        assert_eq!(address % 4, 0, "unaligned access");
        address
    }

    fn get(&self, reg: &str) -> i32 {
        match reg {
            "$zero" => 0,
            _ => *self.regs.get(reg).unwrap_or(&0),
        }
    }

    fn set(&mut self, reg: &str, value: i32) {
        assert_ne!(reg, "$zero", "write to $zero");
        self.regs.insert(reg.to_string(), value);
    }
}

/// Revierte el escape de `.asciiz`.
fn unescape(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];

    let mut string = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            string.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => string.push('\n'),
            Some(other) => string.push(other),
            None => panic!("dangling escape"),
        }
    }

    string
}
