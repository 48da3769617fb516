//! WebAssembly bindings for the 4-bit processor.
//!
//! This module provides JavaScript-friendly wrappers around the core model.

use wasm_bindgen::prelude::*;
use js_sys::Uint8Array;
use crate::cpu::{Processor, StepOutcome};
use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_word;
use crate::asm::programs::{sample, SAMPLES};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly processor wrapper.
#[wasm_bindgen]
pub struct WasmProcessor {
    cpu: Processor,
}

#[wasm_bindgen]
impl WasmProcessor {
    /// Create a new processor instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { cpu: Processor::new() }
    }

    /// Load a program from assembly source code. Returns the instruction
    /// count.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let program = assemble(source).map_err(|e| JsError::new(&e.to_string()))?;
        self.cpu.load_program(&program);
        Ok(program.len())
    }

    /// Load one of the built-in samples by 1-based number.
    #[wasm_bindgen]
    pub fn load_sample(&mut self, number: usize) -> Result<usize, JsError> {
        let s = sample(number).ok_or_else(|| JsError::new("no such sample"))?;
        self.load_asm(s.source)
    }

    /// Advance one clock cycle. Returns the new state name, or `None` once
    /// the program has completed.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Option<String> {
        match self.cpu.step() {
            StepOutcome::Advanced(state) => Some(state.name().to_string()),
            StepOutcome::Halted => None,
        }
    }

    /// Run until completion or `max_cycles`. Returns cycles taken.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> u64 {
        self.cpu.run_to_completion(u64::from(max_cycles)).cycles()
    }

    /// Reset to power-on state, keeping the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles()
    }

    /// FSM state name.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        self.cpu.state().name().to_string()
    }

    /// Program counter as an instruction index.
    #[wasm_bindgen]
    pub fn pc(&self) -> usize {
        self.cpu.pc()
    }

    /// Instruction register as an 11-bit word.
    #[wasm_bindgen]
    pub fn instruction(&self) -> u16 {
        self.cpu.instruction().encode()
    }

    #[wasm_bindgen]
    pub fn alu_result(&self) -> u8 {
        self.cpu.alu_result().value()
    }

    #[wasm_bindgen]
    pub fn alu_carry(&self) -> bool {
        self.cpu.alu_carry()
    }

    /// All 16 memory cells.
    #[wasm_bindgen]
    pub fn memory(&self) -> Uint8Array {
        Uint8Array::from(&self.cpu.memory().to_bytes()[..])
    }

    /// Cycle history as a JSON array.
    #[wasm_bindgen]
    pub fn trace_json(&self) -> Result<String, JsError> {
        self.cpu.trace().to_json().map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Default for WasmProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code to 11-bit machine words.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<Vec<u16>, JsError> {
    let program = assemble(source).map_err(|e| JsError::new(&e.to_string()))?;
    Ok(program.iter().map(|i| i.encode()).collect())
}

/// Disassemble a single 11-bit word.
#[wasm_bindgen]
pub fn wasm_disassemble(word: u16) -> String {
    disassemble_word(word)
}

/// Names of the built-in samples, in menu order.
#[wasm_bindgen]
pub fn wasm_sample_names() -> Vec<String> {
    SAMPLES.iter().map(|s| s.name.to_string()).collect()
}
