//! Fourbit - CLI Entry Point
//!
//! Commands:
//! - `fourbit-sim run [program]` - Run an assembly file or a built-in sample
//! - `fourbit-sim debug [program]` - Interactive debugger
//! - `fourbit-sim asm <source>` - Assemble to 11-bit words
//! - `fourbit-sim disasm <word>...` - Disassemble machine words
//! - `fourbit-sim examples` - List the built-in samples
//! - `fourbit-sim check-rtl <dir>` - Check Verilog structural constraints
//! - `fourbit-sim test` - Built-in self-test

use clap::{Parser, Subcommand};
use fourbit::asm::programs::{default_program, sample, DEFAULT_EXPECTED, SAMPLES};
use fourbit::{assemble, Instruction};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fourbit-sim")]
#[command(version)]
#[command(about = "A cycle-accurate model of a gate-level 4-bit processor")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it completes
    Run {
        /// Path to an assembly file (default program if omitted)
        program: Option<String>,
        /// Run built-in sample N instead (see `examples`)
        #[arg(short, long, conflicts_with = "program")]
        example: Option<usize>,
        /// Maximum number of cycles to run
        #[arg(short, long, default_value = "100")]
        max_cycles: u64,
        /// Print one line per clock cycle
        #[arg(short, long)]
        trace: bool,
        /// Print the cycle history as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to an assembly file (default program if omitted)
        program: Option<String>,
        /// Debug built-in sample N instead
        #[arg(short, long, conflicts_with = "program")]
        example: Option<usize>,
    },
    /// Assemble source to 11-bit machine words
    Asm {
        /// Path to the source file
        source: String,
    },
    /// Disassemble machine words (decimal, 0x or 0b)
    Disasm {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// List the built-in sample programs
    Examples,
    /// Check an RTL directory against the structural constraints
    CheckRtl {
        /// Directory holding the Verilog sources
        dir: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Run { program, example, max_cycles, trace, json }) => {
            let program = load_program(program.as_deref(), example);
            run_program(&program, max_cycles, trace, json);
        }
        Some(Commands::Debug { program, example }) => {
            let program = load_program(program.as_deref(), example);
            debug_program(program);
        }
        Some(Commands::Asm { source }) => {
            assemble_file(&source);
        }
        Some(Commands::Disasm { words }) => {
            disassemble_words(&words);
        }
        Some(Commands::Examples) => {
            list_examples();
        }
        Some(Commands::CheckRtl { dir }) => {
            check_rtl(&dir);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("Fourbit v{}", env!("CARGO_PKG_VERSION"));
            println!("A cycle-accurate 4-bit processor model");
            println!();
            println!("Use --help for available commands");
            println!();
            demo_datapath();
        }
    }
}

/// Logs go to stderr so `run --json` output stays parseable.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_program(path: Option<&str>, example: Option<usize>) -> Vec<Instruction> {
    if let Some(n) = example {
        let Some(s) = sample(n) else {
            eprintln!("❌ No sample {} (1-{} available)", n, SAMPLES.len());
            std::process::exit(1);
        };
        eprintln!("📝 Sample {}: {}", n, s.name);
        return match s.program() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("❌ Assembly error: {}", e);
                std::process::exit(1);
            }
        };
    }

    let Some(path) = path else {
        eprintln!("📝 Default program");
        return default_program();
    };

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    match assemble(&source) {
        Ok(program) => {
            eprintln!("📝 Assembled {} instructions from {}", program.len(), path);
            program
        }
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(program: &[Instruction], max_cycles: u64, trace: bool, json: bool) {
    use fourbit::cpu::AccessKind;
    use fourbit::Processor;

    let mut cpu = Processor::new();
    cpu.load_program(program);
    let outcome = cpu.run_to_completion(max_cycles);

    if json {
        match cpu.trace().to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialize trace: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if trace {
        println!("━━━ Execution ━━━");
        for r in cpu.trace().records() {
            let access = match r.access {
                Some(a) if a.kind == AccessKind::Read => format!("  M[{:X}] -> {:X}", a.addr, a.value),
                Some(a) => format!("  M[{:X}] <- {:X}", a.addr, a.value),
                None => String::new(),
            };
            println!(
                "{:4}  clk={}  {:<7}  pc={:<2}  ir={:011b}  alu={:X}{}",
                r.cycle,
                r.clk(),
                r.state.name(),
                r.pc,
                r.instruction,
                r.alu_result,
                access
            );
        }
        println!();
    }

    println!("━━━ Result ━━━");
    println!("Cycles: {}", outcome.cycles());
    println!("State: {}", cpu.state());
    println!("ALU:   {:X} (carry {})", cpu.alu_result(), u8::from(cpu.alu_carry()));
    println!("Memory:");
    for (i, cell) in cpu.memory().cells().iter().enumerate() {
        let sep = if i % 4 == 3 { "\n" } else { "   " };
        print!("  M[{:X}]={:X} {:04b}{}", i, cell, cell.value(), sep);
    }

    if !outcome.is_completed() {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }
}

#[cfg(feature = "tui")]
fn debug_program(program: Vec<Instruction>) {
    use fourbit::tui::run_debugger;

    eprintln!("🚀 Launching debugger...");

    if let Err(e) = run_debugger(program) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_program: Vec<Instruction>) {
    eprintln!("❌ Debugger not available (built without the `tui` feature)");
    std::process::exit(1);
}

fn assemble_file(source_path: &str) {
    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let program = match assemble(&source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("✓ Assembled {} instructions", program.len());
    print!("{}", fourbit::disassemble(&program));
}

fn disassemble_words(words: &[String]) {
    use fourbit::asm::disassemble_word;

    for text in words {
        let parsed = match text.get(..2) {
            Some("0x" | "0X") => u16::from_str_radix(&text[2..], 16),
            Some("0b" | "0B") => u16::from_str_radix(&text[2..], 2),
            _ => text.parse(),
        };
        match parsed {
            Ok(word) => println!("{:<8} {}", text, disassemble_word(word)),
            Err(e) => {
                eprintln!("❌ Invalid word '{}': {}", text, e);
                std::process::exit(1);
            }
        }
    }
}

fn list_examples() {
    for (i, s) in SAMPLES.iter().enumerate() {
        println!("{}. {}", i + 1, s.name);
        for line in s.source.lines() {
            println!("     {}", line);
        }
        println!();
    }
}

fn check_rtl(dir: &str) {
    use fourbit::RtlChecker;

    println!("Running Verilog constraint checks on {}...", dir);
    let checker = match RtlChecker::from_dir(dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let report = checker.run();
    print!("{}", report);

    if !report.passed() {
        std::process::exit(1);
    }
}

fn demo_datapath() {
    use fourbit::logic::{alu, xor1, add4};
    use fourbit::{AluOp, Word4};

    println!("━━━ Datapath Demo ━━━");
    println!();

    println!("XOR from AND/OR/NOT:");
    for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
        println!("  {} ^ {} = {}", u8::from(a), u8::from(b), u8::from(xor1(a, b)));
    }
    println!();

    let a = Word4::truncate(0xB);
    let b = Word4::truncate(0x6);
    let (sum, carry) = add4(a, b, false);
    println!("Ripple-carry adder:");
    println!("  {:04b} + {:04b} = {:04b} carry {}", a.value(), b.value(), sum.value(), u8::from(carry));
    println!();

    println!("ALU ({:04b}, {:04b}):", a.value(), b.value());
    for op in AluOp::ALL {
        let out = alu::compute(a, b, op, op == AluOp::Sub);
        println!("  {} {:<9} -> {:04b} carry {}", op, format!("{:?}", op), out.result.value(), u8::from(out.carry));
    }
}

fn run_self_test() {
    use fourbit::logic::{alu, add4, full_adder1, xor1};
    use fourbit::{AluOp, Processor, Word4};

    println!("━━━ Fourbit Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let mut check = |name: &str, ok: bool| {
        println!("{}... {}", name, if ok { "✓" } else { "✗" });
        if ok { passed += 1 } else { failed += 1 }
    };

    // XOR truth table
    let ok = [(false, false), (false, true), (true, false), (true, true)]
        .into_iter()
        .all(|(a, b)| xor1(a, b) == (a != b));
    check("XOR gate truth table", ok);

    // Full adder truth table
    let ok = (0u8..8).all(|n| {
        let (a, b, c) = (n & 4 != 0, n & 2 != 0, n & 1 != 0);
        let total = u8::from(a) + u8::from(b) + u8::from(c);
        full_adder1(a, b, c) == (total & 1 == 1, total >= 2)
    });
    check("Full adder truth table", ok);

    // Adder, exhaustive
    let ok = Word4::all().all(|a| {
        Word4::all().all(|b| {
            [false, true].into_iter().all(|cin| {
                let total = a.value() + b.value() + u8::from(cin);
                add4(a, b, cin) == (Word4::truncate(total), total >= 16)
            })
        })
    });
    check("4-bit ripple-carry adder (exhaustive)", ok);

    // ALU reference vectors
    let w = Word4::truncate;
    let vectors = [
        (AluOp::Add, 5, 6, false, 0xB, false),
        (AluOp::Add, 15, 1, false, 0x0, true),
        (AluOp::Sub, 15, 7, true, 0x8, true),
        (AluOp::Sub, 0, 1, true, 0xF, false),
        (AluOp::And, 0xA, 0x3, false, 0x2, false),
        (AluOp::Or, 0xC, 0x5, false, 0xD, false),
        (AluOp::Xor, 0xB, 0x3, false, 0x8, false),
        (AluOp::Not, 0x0, 0x0, false, 0xF, false),
    ];
    let ok = vectors.iter().all(|&(op, a, b, cin, result, carry)| {
        let out = alu::compute(w(a), w(b), op, cin);
        out.result == w(result) && out.carry == carry
    });
    check("ALU reference vectors", ok);

    // Default program end to end
    let mut cpu = Processor::new();
    cpu.load_program(&default_program());
    let outcome = cpu.run_to_completion(100);
    let ok = outcome.is_completed()
        && DEFAULT_EXPECTED
            .iter()
            .all(|&(addr, value)| cpu.memory().read(w(addr)) == w(value));
    check("Default program results", ok);

    // Every sample completes
    let ok = SAMPLES.iter().all(|s| match s.program() {
        Ok(p) => {
            let mut cpu = Processor::new();
            cpu.load_program(&p);
            cpu.run_to_completion(1000).is_completed()
        }
        Err(_) => false,
    });
    check("Sample programs complete", ok);

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
