//! Debugger application state and logic.

use crate::asm::disasm::disassemble_instruction;
use crate::cpu::{ControlState, Instruction, Processor, StepOutcome};
use std::collections::BTreeSet;

/// Cycles executed per UI tick while running.
const CYCLES_PER_TICK: usize = 1;

/// Debugger application state.
pub struct DebuggerApp {
    /// The processor being debugged.
    pub cpu: Processor,
    /// Breakpoints, by program index. Execution stops in FETCH before the
    /// marked instruction is latched.
    pub breakpoints: BTreeSet<usize>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Program listing cursor, used for placing breakpoints.
    pub cursor: usize,
    /// Set when resuming from a breakpoint so the first FETCH is not caught
    /// by it again.
    resume: bool,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<Instruction>) -> Self {
        let mut cpu = Processor::new();
        cpu.load_program(&program);

        Self {
            cpu,
            breakpoints: BTreeSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            cursor: 0,
            resume: false,
        }
    }

    /// Advance one clock cycle.
    pub fn step(&mut self) {
        let before = self.cpu.state();
        match self.cpu.step() {
            StepOutcome::Advanced(next) => {
                self.status = format!("Cycle {}: {} -> {}", self.cpu.cycles(), before, next);
            }
            StepOutcome::Halted => self.halt(),
        }
    }

    /// Advance until the next instruction boundary (the next FETCH).
    pub fn step_instruction(&mut self) {
        let pc = self.cpu.pc();
        let from_fetch = self.cpu.state() == ControlState::Fetch;
        loop {
            match self.cpu.step() {
                StepOutcome::Advanced(ControlState::Fetch) => break,
                StepOutcome::Advanced(_) => {}
                StepOutcome::Halted => return self.halt(),
            }
        }
        match self.cpu.program().get(pc).filter(|_| from_fetch) {
            Some(instr) => {
                self.status = format!("{:02X}: {} done", pc, disassemble_instruction(instr));
            }
            None => self.status = format!("Cycle {}", self.cpu.cycles()),
        }
    }

    /// Run until halt or breakpoint.
    pub fn run(&mut self) {
        if self.cpu.is_halted() {
            self.halt();
            return;
        }
        self.running = true;
        self.resume = true;
        self.status = "Running...".into();
    }

    /// Stop continuous execution.
    pub fn pause(&mut self) {
        self.running = false;
        self.status = format!("Paused at cycle {}", self.cpu.cycles());
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        for _ in 0..CYCLES_PER_TICK {
            if !self.running {
                return;
            }
            if self.at_breakpoint() && !self.resume {
                self.running = false;
                self.status = format!("Breakpoint at {:02X}", self.cpu.pc());
                return;
            }
            self.resume = false;
            self.step();
        }
    }

    /// Toggle a breakpoint on the instruction under the cursor.
    pub fn toggle_breakpoint(&mut self) {
        let at = self.cursor;
        if self.breakpoints.remove(&at) {
            self.status = format!("Removed breakpoint at {:02X}", at);
        } else {
            self.breakpoints.insert(at);
            self.status = format!("Set breakpoint at {:02X}", at);
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.cpu.program().len() {
            self.cursor += 1;
        }
    }

    /// Reset the processor, keeping the program and breakpoints.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Program listing as `(index, text, is_next, has_breakpoint)`.
    pub fn listing(&self) -> Vec<(usize, String, bool, bool)> {
        self.cpu
            .program()
            .iter()
            .enumerate()
            .map(|(i, instr)| {
                (
                    i,
                    disassemble_instruction(instr),
                    i == self.cpu.pc() && !self.cpu.is_halted(),
                    self.breakpoints.contains(&i),
                )
            })
            .collect()
    }

    fn at_breakpoint(&self) -> bool {
        self.cpu.state() == ControlState::Fetch && self.breakpoints.contains(&self.cpu.pc())
    }

    fn halt(&mut self) {
        self.running = false;
        self.status = format!("Program complete after {} cycles", self.cpu.cycles());
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<Instruction>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('i') => {
                            app.running = false;
                            app.step_instruction();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => app.pause(),
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.cursor_up(),
                        KeyCode::Down => app.cursor_down(),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
