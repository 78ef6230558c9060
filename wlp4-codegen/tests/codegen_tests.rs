//! End-to-end tests: compile, assemble, link against a stub runtime and run
//! the result on a small MIPS interpreter.

use mips_asm::{assemble, link, Entry, MerlModule};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use wlp4_codegen::{generate, Assembly, CodeGenerator, CodegenOptions};
use wlp4_frontend::{Frontend, Grammar};

/// Runtime routines; the interpreter intercepts calls to them
const RUNTIME: &str = "\
.export init
.export new
.export delete
.export print
init: jr $31
new: jr $31
delete: jr $31
print: jr $31
";

const MEMORY_BYTES: u32 = 0x0010_0000;
const HEAP_START: u32 = 0x0004_0000;
const ARRAY_START: u32 = 0x0008_0000;
const RETURN_SENTINEL: u32 = 0x8123_456c;
const STEP_LIMIT: usize = 2_000_000;

fn compile(source: &str) -> Assembly {
    let grammar = Grammar::wlp4().unwrap();
    let checked = Frontend::analyze(source, &grammar).unwrap();
    CodeGenerator::new(&checked).generate().unwrap()
}

fn build(source: &str) -> MerlModule {
    let text = compile(source).to_text(&CodegenOptions::default());
    let program = assemble(&text).unwrap();
    link(vec![program, assemble(RUNTIME).unwrap()]).unwrap()
}

struct Machine {
    regs: [u32; 32],
    hi: u32,
    lo: u32,
    pc: u32,
    memory: Vec<u32>,
    routines: BTreeMap<u32, String>,
    heap: u32,
    printed: Vec<i32>,
    freed: Vec<u32>,
}

impl Machine {
    fn load(module: &MerlModule) -> Self {
        let mut memory = vec![0u32; (MEMORY_BYTES / 4) as usize];
        let bytes = module.to_bytes();
        for (i, chunk) in bytes.chunks_exact(4).enumerate() {
            memory[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        let routines = module
            .exports()
            .into_iter()
            .map(|(name, address)| (address, name.to_string()))
            .collect();
        let mut regs = [0u32; 32];
        regs[30] = MEMORY_BYTES;
        regs[31] = RETURN_SENTINEL;
        Machine {
            regs,
            hi: 0,
            lo: 0,
            pc: 0,
            memory,
            routines,
            heap: HEAP_START,
            printed: Vec::new(),
            freed: Vec::new(),
        }
    }

    fn read(&self, address: u32) -> u32 {
        assert_eq!(address % 4, 0, "unaligned load from {:#x}", address);
        self.memory[(address / 4) as usize]
    }

    fn write(&mut self, address: u32, value: u32) {
        assert_eq!(address % 4, 0, "unaligned store to {:#x}", address);
        self.memory[(address / 4) as usize] = value;
    }

    fn runtime_call(&mut self, name: &str) {
        match name {
            "init" => {}
            "new" => {
                self.regs[3] = self.heap;
                self.heap += self.regs[1] * 4;
            }
            "delete" => self.freed.push(self.regs[1]),
            "print" => self.printed.push(self.regs[1] as i32),
            other => panic!("unexpected routine {}", other),
        }
        self.pc = self.regs[31];
    }

    /// Run to completion and return `$3`
    fn run(&mut self, first: u32, second: u32) -> i32 {
        self.regs[1] = first;
        self.regs[2] = second;
        for _ in 0..STEP_LIMIT {
            if self.pc == RETURN_SENTINEL {
                return self.regs[3] as i32;
            }
            if let Some(name) = self.routines.get(&self.pc).cloned() {
                self.runtime_call(&name);
                continue;
            }
            let word = self.read(self.pc);
            self.pc = self.pc.wrapping_add(4);
            self.step(word);
            self.regs[0] = 0;
        }
        panic!("program did not finish in {} steps", STEP_LIMIT);
    }

    fn step(&mut self, word: u32) {
        let s = ((word >> 21) & 31) as usize;
        let t = ((word >> 16) & 31) as usize;
        let d = ((word >> 11) & 31) as usize;
        let imm = (word & 0xffff) as u16 as i16 as i32;
        let (rs, rt) = (self.regs[s], self.regs[t]);

        match word >> 26 {
            0 => match word & 0x3f {
                32 => self.regs[d] = rs.wrapping_add(rt),
                34 => self.regs[d] = rs.wrapping_sub(rt),
                42 => self.regs[d] = ((rs as i32) < (rt as i32)) as u32,
                43 => self.regs[d] = (rs < rt) as u32,
                24 => {
                    let product = (rs as i32 as i64) * (rt as i32 as i64);
                    self.lo = product as u32;
                    self.hi = (product >> 32) as u32;
                }
                25 => {
                    let product = (rs as u64) * (rt as u64);
                    self.lo = product as u32;
                    self.hi = (product >> 32) as u32;
                }
                26 => {
                    self.lo = (rs as i32).wrapping_div(rt as i32) as u32;
                    self.hi = (rs as i32).wrapping_rem(rt as i32) as u32;
                }
                27 => {
                    self.lo = rs / rt;
                    self.hi = rs % rt;
                }
                16 => self.regs[d] = self.hi,
                18 => self.regs[d] = self.lo,
                20 => {
                    self.regs[d] = self.read(self.pc);
                    self.pc = self.pc.wrapping_add(4);
                }
                8 => self.pc = rs,
                9 => {
                    self.regs[31] = self.pc;
                    self.pc = rs;
                }
                funct => panic!("bad function {} in {:#010x}", funct, word),
            },
            0x23 => self.regs[t] = self.read(rs.wrapping_add(imm as u32)),
            0x2b => self.write(rs.wrapping_add(imm as u32), rt),
            0x04 if rs == rt => self.pc = self.pc.wrapping_add((imm * 4) as u32),
            0x05 if rs != rt => self.pc = self.pc.wrapping_add((imm * 4) as u32),
            0x04 | 0x05 => {}
            op => panic!("bad opcode {:#x} in {:#010x}", op, word),
        }
    }
}

fn run_ints(source: &str, a: i32, b: i32) -> (i32, Vec<i32>) {
    let mut machine = Machine::load(&build(source));
    let result = machine.run(a as u32, b as u32);
    (result, machine.printed)
}

fn run_array(source: &str, values: &[i32]) -> (i32, Machine) {
    let mut machine = Machine::load(&build(source));
    for (i, value) in values.iter().enumerate() {
        machine.write(ARRAY_START + 4 * i as u32, *value as u32);
    }
    let result = machine.run(ARRAY_START, values.len() as u32);
    (result, machine)
}

#[test]
fn test_wain_parameters_have_positive_offsets() {
    let assembly = compile("int wain(int a, int b) { return a + b; }");
    let frame = assembly.frame("wain").unwrap();
    assert_eq!(frame.slot("a"), Ok(8));
    assert_eq!(frame.slot("b"), Ok(4));

    let text = assembly.to_text(&CodegenOptions { comments: false });
    assert!(text.contains("lw $3, 8($29)"));
    assert!(text.contains("lw $3, 4($29)"));
    assert_eq!(run_ints("int wain(int a, int b) { return a + b; }", 3, 4).0, 7);
}

#[test]
fn test_first_local_sits_at_the_frame_pointer() {
    let assembly = compile("int wain(int a, int b) { int c = 1; return c; }");
    assert_eq!(assembly.frame("wain").unwrap().slot("c"), Ok(0));
    assert_eq!(run_ints("int wain(int a, int b) { int c = 1; return c; }", 0, 0).0, 1);
}

#[test]
fn test_procedure_frames() {
    let assembly = compile(
        "int f(int x, int y, int z) { int u = 0; int v = 0; return x; } \
         int wain(int a, int b) { return f(a, b, 3); }",
    );
    let slots = assembly.frame("f").unwrap().slots().clone();
    let expected: BTreeMap<String, i32> = [("x", 12), ("y", 8), ("z", 4), ("u", 0), ("v", -4)]
        .into_iter()
        .map(|(name, offset)| (name.to_string(), offset))
        .collect();
    assert_eq!(slots, expected);
    assert_eq!(assembly.frames.last().map(|f| f.procedure()), Some("wain"));
}

#[test]
fn test_arithmetic_and_division() {
    let source = "int wain(int a, int b) { \
                    println(a * b); println(a / b); println(a % b); println(a - b); \
                    return a + b * 2; }";
    let (result, printed) = run_ints(source, -17, 5);
    assert_eq!(printed, vec![-85, -3, -2, -22]);
    assert_eq!(result, -7);
}

#[test]
fn test_comparisons() {
    let source = "int wain(int a, int b) { \
                    if (a < b) { println(1); } else { println(0); } \
                    if (a <= b) { println(1); } else { println(0); } \
                    if (a > b) { println(1); } else { println(0); } \
                    if (a >= b) { println(1); } else { println(0); } \
                    if (a == b) { println(1); } else { println(0); } \
                    if (a != b) { println(1); } else { println(0); } \
                    return 0; }";
    assert_eq!(run_ints(source, -1, 2).1, vec![1, 1, 0, 0, 0, 1]);
    assert_eq!(run_ints(source, 2, 2).1, vec![0, 1, 0, 1, 1, 0]);
    assert_eq!(run_ints(source, 3, 2).1, vec![0, 0, 1, 1, 0, 1]);
}

#[test]
fn test_recursion_preserves_frames() {
    let source = "int fib(int n) { int r = 0; \
                    if (n < 2) { r = n; } else { r = fib(n - 1) + fib(n - 2); } \
                    return r; } \
                  int wain(int a, int b) { println(fib(a)); return fib(b); }";
    let (result, printed) = run_ints(source, 10, 12);
    assert_eq!(printed, vec![55]);
    assert_eq!(result, 144);
}

#[test]
fn test_sum_array() {
    let source = "int wain(int* a, int n) { \
                    int s = 0; int i = 0; \
                    while (i < n) { s = s + *(a + i); i = i + 1; } \
                    return s; }";
    assert_eq!(run_array(source, &[4, 8, 15, 16, 23, 42]).0, 108);
}

#[test]
fn test_pointer_writes_and_difference() {
    let source = "int wain(int* a, int n) { \
                    int* last = NULL; \
                    last = a + n - 1; \
                    *a = *last; \
                    *(&n) = 100; \
                    println(n); \
                    return last - a; }";
    let (result, machine) = run_array(source, &[1, 2, 3, 9]);
    assert_eq!(result, 3);
    assert_eq!(machine.read(ARRAY_START), 9);
    assert_eq!(machine.printed, vec![100]);
}

#[test]
fn test_new_and_delete() {
    let source = "int wain(int a, int b) { \
                    int* p = NULL; int* q = NULL; \
                    p = new int[a]; \
                    *(p + 2) = b; \
                    println(*(p + 2)); \
                    delete [] p; \
                    delete [] q; \
                    if (q == NULL) { println(1); } else { println(0); } \
                    return p - q; }";
    let mut machine = Machine::load(&build(source));
    machine.run(5, 77);
    assert_eq!(machine.printed, vec![77, 1]);
    assert_eq!(machine.freed, vec![HEAP_START]);
}

#[test]
fn test_calls_pass_pointers() {
    let source = "int set(int* p, int v) { *p = v; return 0; } \
                  int get(int* p) { return *p; } \
                  int wain(int a, int b) { int x = 0; int y = 0; \
                    y = set(&x, a + b); return get(&x) + y; }";
    assert_eq!(run_ints(source, 20, 22).0, 42);
}

#[test]
fn test_program_imports_the_runtime() {
    let text = compile(
        "int wain(int a, int b) { int* p = NULL; p = new int[a]; delete [] p; return a; }",
    )
    .to_text(&CodegenOptions::default());
    let module = assemble(&text).unwrap();
    let mut imports: Vec<&str> = module.imports().map(|(name, _)| name).collect();
    imports.sort();
    imports.dedup();
    assert_eq!(imports, vec!["delete", "init", "new", "print"]);
    assert!(module
        .table
        .iter()
        .any(|entry| matches!(entry, Entry::Rel { .. })));
}

#[test]
fn test_comments_do_not_change_code() {
    let source = "int wain(int* a, int n) { int s = 0; while (n > 0) { n = n - 1; s = s + *(a + n); } return s; }";
    let grammar = Grammar::wlp4().unwrap();
    let checked = Frontend::analyze(source, &grammar).unwrap();
    let commented = generate(&checked, &CodegenOptions { comments: true }).unwrap();
    let bare = generate(&checked, &CodegenOptions { comments: false }).unwrap();
    assert!(commented.contains(';'));
    assert!(!bare.contains(';'));
    assert_eq!(assemble(&commented).unwrap(), assemble(&bare).unwrap());
}
