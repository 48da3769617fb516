//! Processor execution engine.
//!
//! Implements the INIT/FETCH/LOAD/EXECUTE/STORE control FSM. Each call to
//! [`Processor::step`] is one clock cycle and performs exactly one state
//! transition; an instruction therefore takes four cycles.

use std::fmt;
use crate::logic::{alu, AluOp, AluOutput, Word4};
use crate::cpu::Memory;
use crate::cpu::decode::{self, DecodeError, Instruction, Opcode};
use crate::cpu::trace::{AccessKind, CycleRecord, MemAccess, Trace};
use serde::{Serialize, Deserialize};

/// Control FSM state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControlState {
    /// Power-on state. Left on the first cycle, re-entered only by reset.
    #[default]
    Init,
    /// Latch the next instruction, or detect the end of the program.
    Fetch,
    /// Decode and read the source operand from memory.
    Load,
    /// Route operands through the ALU.
    Execute,
    /// Write the ALU result back to memory.
    Store,
}

impl ControlState {
    /// Numeric encoding, as carried on the state bus.
    pub const fn ordinal(self) -> u8 {
        match self {
            ControlState::Init => 0,
            ControlState::Fetch => 1,
            ControlState::Load => 2,
            ControlState::Execute => 3,
            ControlState::Store => 4,
        }
    }

    /// Upper-case state name.
    pub const fn name(self) -> &'static str {
        match self {
            ControlState::Init => "INIT",
            ControlState::Fetch => "FETCH",
            ControlState::Load => "LOAD",
            ControlState::Execute => "EXECUTE",
            ControlState::Store => "STORE",
        }
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields latched by LOAD and consumed by EXECUTE and STORE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Decoded {
    pub opcode: Opcode,
    pub addr: Word4,
    pub imm: Word4,
    /// `M[addr]` as read during LOAD.
    pub operand: Word4,
}

/// ALU control and operand routing for one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluInputs {
    pub a: Word4,
    pub b: Word4,
    pub op: AluOp,
    pub cin: bool,
}

impl Decoded {
    /// Route the latched fields into the ALU.
    ///
    /// STO passes `imm` through on A; every other opcode takes the memory
    /// operand on A and `imm` on B. Only SUB raises carry-in.
    pub fn alu_inputs(&self) -> AluInputs {
        let a = match self.opcode {
            Opcode::Sto => self.imm,
            _ => self.operand,
        };
        AluInputs {
            a,
            b: self.imm,
            op: self.opcode.alu_op(),
            cin: self.opcode == Opcode::Sub,
        }
    }
}

/// Result of a single clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum StepOutcome {
    /// The FSM moved to the given state.
    Advanced(ControlState),
    /// FETCH found no instruction at PC. The program is finished.
    Halted,
}

/// Result of [`Processor::run_to_completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum RunOutcome {
    /// The program ran off its end after `cycles` steps.
    Completed { cycles: u64 },
    /// The cycle budget ran out first.
    TimedOut { cycles: u64 },
}

impl RunOutcome {
    /// Check if the program finished within budget.
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    /// Steps taken by the run.
    pub fn cycles(&self) -> u64 {
        match *self {
            RunOutcome::Completed { cycles } | RunOutcome::TimedOut { cycles } => cycles,
        }
    }
}

/// The 4-bit processor.
#[derive(Clone, Serialize, Deserialize)]
pub struct Processor {
    mem: Memory,
    state: ControlState,
    /// Index of the next instruction in `program`.
    pc: usize,
    /// Instruction register.
    instruction: Instruction,
    decoded: Decoded,
    alu: AluOutput,
    cycles: u64,
    halted: bool,
    program: Vec<Instruction>,
    trace: Trace,
}

impl Processor {
    /// Create a processor in INIT with zeroed memory and no program.
    pub fn new() -> Self {
        Self {
            mem: Memory::new(),
            state: ControlState::Init,
            pc: 0,
            instruction: Instruction::default(),
            decoded: Decoded::default(),
            alu: AluOutput::default(),
            cycles: 0,
            halted: false,
            program: Vec::new(),
            trace: Trace::new(),
        }
    }

    /// Return every register, memory cell and the history to power-on
    /// values. The loaded program is kept.
    pub fn reset(&mut self) {
        self.mem.clear();
        self.state = ControlState::Init;
        self.pc = 0;
        self.instruction = Instruction::default();
        self.decoded = Decoded::default();
        self.alu = AluOutput::default();
        self.cycles = 0;
        self.halted = false;
        self.trace.clear();
        tracing::debug!("processor reset");
    }

    /// Install a program and reset, so nothing latched from a previous
    /// run survives into the new one.
    pub fn load_program(&mut self, program: &[Instruction]) {
        self.program = program.to_vec();
        self.reset();
        tracing::debug!(instructions = program.len(), "program loaded");
    }

    /// Decode raw 11-bit words and load them.
    pub fn load_words(&mut self, words: &[u16]) -> Result<(), DecodeError> {
        let program = words
            .iter()
            .map(|&w| decode::decode(w))
            .collect::<Result<Vec<_>, _>>()?;
        self.load_program(&program);
        Ok(())
    }

    /// Advance one clock cycle.
    ///
    /// Once FETCH has reported [`StepOutcome::Halted`], further calls are
    /// no-ops that keep returning `Halted` without recording a cycle.
    pub fn step(&mut self) -> StepOutcome {
        if self.halted {
            return StepOutcome::Halted;
        }

        self.cycles += 1;
        let mut record = CycleRecord {
            cycle: self.cycles,
            state: self.state,
            pc: self.pc,
            instruction: self.instruction.encode(),
            alu_result: self.alu.result,
            alu_carry: self.alu.carry,
            access: None,
        };

        let outcome = match self.state {
            ControlState::Init => {
                tracing::debug!(cycle = self.cycles, "INIT: initializing processor");
                self.transition(ControlState::Fetch)
            }

            ControlState::Fetch => {
                match self.program.get(self.pc).copied() {
                    None => {
                        tracing::debug!(cycle = self.cycles, pc = self.pc, "FETCH: program complete");
                        self.halted = true;
                        StepOutcome::Halted
                    }
                    Some(instr) => {
                        tracing::debug!(
                            cycle = self.cycles,
                            pc = self.pc,
                            word = format_args!("{:011b}", instr.encode()),
                            "FETCH: {instr}"
                        );
                        self.instruction = instr;
                        self.pc += 1;
                        self.transition(ControlState::Load)
                    }
                }
            }

            ControlState::Load => {
                let Instruction { opcode, addr, imm } = self.instruction;
                let operand = self.mem.read(addr);
                self.decoded = Decoded { opcode, addr, imm, operand };
                record.access = Some(MemAccess {
                    kind: AccessKind::Read,
                    addr,
                    value: operand,
                });
                tracing::debug!(cycle = self.cycles, "LOAD: M[{addr:X}] = {operand:X}");
                self.transition(ControlState::Execute)
            }

            ControlState::Execute => {
                let inputs = self.decoded.alu_inputs();
                if self.decoded.opcode == Opcode::Reserved {
                    tracing::warn!(
                        cycle = self.cycles,
                        addr = %self.decoded.addr,
                        "reserved opcode 7: ALU outputs zero"
                    );
                }
                self.alu = alu::compute(inputs.a, inputs.b, inputs.op, inputs.cin);
                tracing::trace!(cin = inputs.cin, carry = self.alu.carry, "ALU select {}", inputs.op);
                tracing::debug!(
                    cycle = self.cycles,
                    "EXECUTE: {} A={:X} B={:X} S={} -> {:X}",
                    self.decoded.opcode, inputs.a, inputs.b, inputs.op, self.alu.result
                );
                self.transition(ControlState::Store)
            }

            ControlState::Store => {
                let addr = self.decoded.addr;
                self.mem.write(addr, self.alu.result);
                record.access = Some(MemAccess {
                    kind: AccessKind::Write,
                    addr,
                    value: self.alu.result,
                });
                tracing::debug!(cycle = self.cycles, "STORE: M[{addr:X}] <- {:X}", self.alu.result);
                self.transition(ControlState::Fetch)
            }
        };

        self.trace.push(record);
        outcome
    }

    /// Step until the program halts or `max_cycles` steps have been taken.
    pub fn run_to_completion(&mut self, max_cycles: u64) -> RunOutcome {
        for taken in 0..max_cycles {
            if self.step() == StepOutcome::Halted {
                return RunOutcome::Completed { cycles: taken + 1 };
            }
        }
        tracing::warn!(max_cycles, "cycle budget exhausted before program end");
        RunOutcome::TimedOut { cycles: max_cycles }
    }

    fn transition(&mut self, next: ControlState) -> StepOutcome {
        self.state = next;
        StepOutcome::Advanced(next)
    }

    /// Current FSM state.
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Index of the next instruction to fetch.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// PC as it appears on the 4-bit register bus.
    pub fn pc_word(&self) -> Word4 {
        Word4::truncate(self.pc as u8)
    }

    /// Data memory.
    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Instruction register.
    pub fn instruction(&self) -> Instruction {
        self.instruction
    }

    /// Latched decode fields. Only meaningful between LOAD and STORE, so
    /// this is `None` in every other state.
    pub fn decoded(&self) -> Option<&Decoded> {
        match self.state {
            ControlState::Execute | ControlState::Store => Some(&self.decoded),
            _ => None,
        }
    }

    /// Last ALU result.
    pub fn alu_result(&self) -> Word4 {
        self.alu.result
    }

    /// Last ALU carry-out.
    pub fn alu_carry(&self) -> bool {
        self.alu.carry
    }

    /// Clock cycles executed since reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Check if the program has run off its end.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The loaded program.
    pub fn program(&self) -> &[Instruction] {
        &self.program
    }

    /// Per-cycle history.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("state", &self.state)
            .field("pc", &self.pc)
            .field("cycles", &self.cycles)
            .field("halted", &self.halted)
            .field("mem", &self.mem)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(v: u8) -> Word4 {
        Word4::truncate(v)
    }

    fn ins(opcode: Opcode, addr: u8, imm: u8) -> Instruction {
        Instruction::new(opcode, w(addr), w(imm))
    }

    fn run(program: &[Instruction]) -> Processor {
        let mut cpu = Processor::new();
        cpu.load_program(program);
        let outcome = cpu.run_to_completion(1000);
        assert!(outcome.is_completed(), "program did not finish: {outcome:?}");
        cpu
    }

    #[test]
    fn test_init_moves_to_fetch() {
        let mut cpu = Processor::new();
        assert_eq!(cpu.state(), ControlState::Init);
        assert_eq!(cpu.step(), StepOutcome::Advanced(ControlState::Fetch));
        assert_eq!(cpu.cycles(), 1);
    }

    #[test]
    fn test_reference_program() {
        let cpu = run(&[
            ins(Opcode::Sto, 0x4, 0x5),
            ins(Opcode::Add, 0x4, 0x6),
            ins(Opcode::Sto, 0x1, 0xF),
            ins(Opcode::Sub, 0x1, 0x7),
            ins(Opcode::Not, 0xF, 0x0),
        ]);

        assert_eq!(cpu.memory().read(w(0x4)).value(), 0xB);
        assert_eq!(cpu.memory().read(w(0x1)).value(), 0x8);
        assert_eq!(cpu.memory().read(w(0xF)).value(), 0xF);
        assert_eq!(cpu.memory().non_zero().len(), 3);
        // INIT + 5 × 4 + the halting FETCH
        assert_eq!(cpu.cycles(), 22);
    }

    #[test]
    fn test_overflow_sets_carry() {
        let cpu = run(&[ins(Opcode::Sto, 0xA, 0xF), ins(Opcode::Add, 0xA, 0x1)]);
        assert_eq!(cpu.memory().read(w(0xA)).value(), 0x0);
        assert!(cpu.alu_carry());
    }

    #[test]
    fn test_underflow_wraps() {
        let cpu = run(&[ins(Opcode::Sto, 0xB, 0x0), ins(Opcode::Sub, 0xB, 0x1)]);
        assert_eq!(cpu.memory().read(w(0xB)).value(), 0xF);
        // 0 - 1 borrows, so no carry out
        assert!(!cpu.alu_carry());
    }

    #[test]
    fn test_four_steps_per_instruction() {
        let mut cpu = Processor::new();
        cpu.load_program(&[ins(Opcode::Sto, 0x3, 0x9), ins(Opcode::Xor, 0x3, 0x5)]);
        let _ = cpu.step(); // INIT -> FETCH

        for expected_pc in 1..=2 {
            let before = cpu.memory().clone();
            let addr = cpu.program()[expected_pc - 1].addr;

            assert_eq!(cpu.step(), StepOutcome::Advanced(ControlState::Load));
            assert_eq!(cpu.step(), StepOutcome::Advanced(ControlState::Execute));
            assert_eq!(cpu.step(), StepOutcome::Advanced(ControlState::Store));
            assert_eq!(cpu.step(), StepOutcome::Advanced(ControlState::Fetch));

            assert_eq!(cpu.pc(), expected_pc);
            for a in Word4::all().filter(|&a| a != addr) {
                assert_eq!(cpu.memory().read(a), before.read(a));
            }
        }
        assert_eq!(cpu.memory().read(w(0x3)).value(), 0x9 ^ 0x5);
    }

    #[test]
    fn test_memory_only_changes_in_store() {
        let mut cpu = Processor::new();
        cpu.load_program(&[ins(Opcode::Sto, 0x2, 0x7)]);
        for _ in 0..4 {
            let _ = cpu.step();
            assert!(cpu.memory().read(w(0x2)).is_zero());
        }
        assert_eq!(cpu.step(), StepOutcome::Advanced(ControlState::Fetch));
        assert_eq!(cpu.memory().read(w(0x2)).value(), 0x7);
    }

    #[test]
    fn test_sto_ignores_old_value() {
        let cpu = run(&[ins(Opcode::Sto, 0x6, 0xC), ins(Opcode::Sto, 0x6, 0x3)]);
        assert_eq!(cpu.memory().read(w(0x6)).value(), 0x3);
    }

    #[test]
    fn test_not_ignores_immediate() {
        let cpu = run(&[ins(Opcode::Sto, 0x2, 0xA), ins(Opcode::Not, 0x2, 0xF)]);
        assert_eq!(cpu.memory().read(w(0x2)).value(), 0x5);
    }

    #[test]
    fn test_logic_opcodes() {
        let cpu = run(&[
            ins(Opcode::Sto, 0x2, 0xA),
            ins(Opcode::And, 0x2, 0x3),
            ins(Opcode::Sto, 0x3, 0xC),
            ins(Opcode::Or, 0x3, 0x5),
            ins(Opcode::Sto, 0x5, 0x9),
            ins(Opcode::Xor, 0x5, 0x6),
        ]);
        assert_eq!(cpu.memory().read(w(0x2)).value(), 0x2);
        assert_eq!(cpu.memory().read(w(0x3)).value(), 0xD);
        assert_eq!(cpu.memory().read(w(0x5)).value(), 0xF);
    }

    #[test]
    fn test_reserved_opcode_clears_cell() {
        let mut cpu = Processor::new();
        cpu.load_words(&[0x0A9, 0x7A3]).unwrap(); // STO 0xA, 0x9 ; ??? 0xA, 0x3
        assert!(cpu.run_to_completion(100).is_completed());
        assert!(cpu.memory().read(w(0xA)).is_zero());
        assert!(!cpu.alu_carry());
    }

    #[test]
    fn test_load_words_rejects_wide_word() {
        let mut cpu = Processor::new();
        assert_eq!(cpu.load_words(&[0x045, 0x900]), Err(DecodeError::WordTooWide(0x900)));
        assert!(cpu.program().is_empty());
    }

    #[test]
    fn test_halt_is_absorbing() {
        let mut cpu = run(&[ins(Opcode::Sto, 0x1, 0x1)]);
        assert!(cpu.is_halted());
        assert_eq!(cpu.state(), ControlState::Fetch);

        let mem = cpu.memory().clone();
        let (pc, cycles, records) = (cpu.pc(), cpu.cycles(), cpu.trace().len());
        for _ in 0..3 {
            assert_eq!(cpu.step(), StepOutcome::Halted);
        }
        assert_eq!(cpu.memory(), &mem);
        assert_eq!(cpu.pc(), pc);
        assert_eq!(cpu.state(), ControlState::Fetch);
        assert_eq!(cpu.cycles(), cycles);
        assert_eq!(cpu.trace().len(), records);
    }

    #[test]
    fn test_empty_program_halts_at_first_fetch() {
        let mut cpu = Processor::new();
        assert_eq!(cpu.run_to_completion(10), RunOutcome::Completed { cycles: 2 });
    }

    #[test]
    fn test_timeout() {
        let mut cpu = Processor::new();
        cpu.load_program(&[ins(Opcode::Add, 0x0, 0x1); 10]);
        let outcome = cpu.run_to_completion(5);
        assert_eq!(outcome, RunOutcome::TimedOut { cycles: 5 });
        assert!(!cpu.is_halted());

        // resuming finishes the program
        assert!(cpu.run_to_completion(100).is_completed());
        assert_eq!(cpu.memory().read(w(0x0)).value(), 10);
    }

    #[test]
    fn test_long_program_runs_past_sixteen() {
        let cpu = run(&[ins(Opcode::Add, 0x0, 0x1); 20]);
        assert_eq!(cpu.pc(), 20);
        assert_eq!(cpu.pc_word().value(), 4);
        assert_eq!(cpu.memory().read(w(0x0)).value(), 20 % 16);
    }

    #[test]
    fn test_decoded_visible_only_between_load_and_store() {
        let mut cpu = Processor::new();
        cpu.load_program(&[ins(Opcode::Add, 0x4, 0x6)]);
        let _ = cpu.step(); // -> FETCH
        let _ = cpu.step(); // -> LOAD
        assert!(cpu.decoded().is_none());
        let _ = cpu.step(); // -> EXECUTE
        let decoded = cpu.decoded().copied().unwrap();
        assert_eq!(decoded.addr.value(), 0x4);
        assert_eq!(decoded.imm.value(), 0x6);
        let _ = cpu.step(); // -> STORE
        assert!(cpu.decoded().is_some());
        let _ = cpu.step(); // -> FETCH
        assert!(cpu.decoded().is_none());
    }

    #[test]
    fn test_alu_routing() {
        let decoded = Decoded {
            opcode: Opcode::Sto,
            addr: w(1),
            imm: w(9),
            operand: w(3),
        };
        assert_eq!(decoded.alu_inputs().a.value(), 9);
        assert_eq!(decoded.alu_inputs().op, AluOp::Transfer);

        let sub = Decoded { opcode: Opcode::Sub, ..decoded };
        let inputs = sub.alu_inputs();
        assert_eq!((inputs.a.value(), inputs.b.value()), (3, 9));
        assert!(inputs.cin);

        let add = Decoded { opcode: Opcode::Add, ..decoded };
        assert!(!add.alu_inputs().cin);
    }

    #[test]
    fn test_trace_records_every_cycle() {
        let cpu = run(&[ins(Opcode::Sto, 0x4, 0x5)]);
        let records = cpu.trace().records();
        let states: Vec<_> = records.iter().map(|r| r.state).collect();
        assert_eq!(
            states,
            vec![
                ControlState::Init,
                ControlState::Fetch,
                ControlState::Load,
                ControlState::Execute,
                ControlState::Store,
                ControlState::Fetch,
            ]
        );
        let cycles: Vec<_> = records.iter().map(|r| r.cycle).collect();
        assert_eq!(cycles, vec![1, 2, 3, 4, 5, 6]);

        let load = records[2].access.unwrap();
        assert_eq!((load.kind, load.addr.value(), load.value.value()), (AccessKind::Read, 4, 0));
        let store = records[4].access.unwrap();
        assert_eq!((store.kind, store.addr.value(), store.value.value()), (AccessKind::Write, 4, 5));
        assert!(records[3].access.is_none());
    }

    #[test]
    fn test_reset_clears_everything_but_program() {
        let mut cpu = run(&[ins(Opcode::Sto, 0x4, 0x5)]);
        cpu.reset();

        assert_eq!(cpu.state(), ControlState::Init);
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.cycles(), 0);
        assert!(!cpu.is_halted());
        assert!(cpu.trace().is_empty());
        assert!(cpu.memory().non_zero().is_empty());
        assert_eq!(cpu.instruction(), Instruction::default());
        assert_eq!(cpu.program().len(), 1);

        assert!(cpu.run_to_completion(100).is_completed());
        assert_eq!(cpu.memory().read(w(0x4)).value(), 0x5);
    }

    #[test]
    fn test_load_program_mid_cycle_drops_latches() {
        let mut cpu = Processor::new();
        cpu.load_program(&[ins(Opcode::Sto, 0x4, 0x5)]);
        for _ in 0..3 {
            let _ = cpu.step(); // stop in EXECUTE
        }
        cpu.load_program(&[ins(Opcode::Sto, 0x8, 0x1)]);
        assert_eq!(cpu.state(), ControlState::Init);
        assert!(cpu.run_to_completion(100).is_completed());
        assert!(cpu.memory().read(w(0x4)).is_zero());
        assert_eq!(cpu.memory().read(w(0x8)).value(), 0x1);
    }
}
