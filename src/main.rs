//! Basic Computer Simulator - CLI Entry Point
//!
//! Commands:
//! - `mano-emu run <program>` - Run an assembly source or memory image
//! - `mano-emu debug <program>` - Interactive debugger
//! - `mano-emu asm <source>` - Assemble to a memory image
//! - `mano-emu disasm <image>` - Disassemble a memory image

use clap::{Parser, Subcommand};
use mano::asm::disasm::disassemble_word;
use mano::config::ConfigError;
use mano::cpu::MAX_CYCLE_TICKS;
use mano::{Cpu, MachineConfig, ProgramImage, RegisterName, RunOutcome};
use std::path::Path;

#[derive(Parser)]
#[command(name = "mano-emu")]
#[command(version = "0.1.0")]
#[command(about = "A cycle-accurate simulator of Mano's Basic Computer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the .asm source or memory image to execute
        program: String,
        /// Maximum number of clock ticks to run (default: 100000)
        #[arg(short, long)]
        max_ticks: Option<u64>,
        /// Start address in hex (default: lowest loaded address)
        #[arg(short, long, value_parser = parse_hex_address)]
        start: Option<u16>,
        /// Print every completed instruction cycle
        #[arg(short, long)]
        trace: bool,
        /// Characters to offer to the input device
        #[arg(short, long)]
        input: Option<String>,
        /// JSON machine configuration
        #[arg(short, long)]
        config: Option<String>,
        /// Print the final machine state as JSON
        #[arg(long)]
        dump_state: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the .asm source or memory image to debug
        program: String,
        /// JSON machine configuration
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Assemble source to a memory image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a memory image to readable text
    Disasm {
        /// Path to the image file
        image: String,
    },
    /// Run the built-in self-test
    Test,
}

/// Options for the `run` subcommand.
struct RunOptions {
    max_ticks: Option<u64>,
    start: Option<u16>,
    trace: bool,
    input: Option<String>,
    config: Option<String>,
    dump_state: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, max_ticks, start, trace, input, config, dump_state }) => {
            let options = RunOptions { max_ticks, start, trace, input, config, dump_state };
            run_program(&program, &options);
        }
        Some(Commands::Debug { program, config }) => {
            debug_program(&program, config.as_deref());
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("Basic Computer Simulator v0.1.0");
            println!("4096 x 16-bit words, one accumulator, one clock edge per step");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn parse_hex_address(text: &str) -> Result<u16, String> {
    let digits = text.trim_start_matches("0x").trim_start_matches("0X");
    let value = u16::from_str_radix(digits, 16).map_err(|e| e.to_string())?;
    if value > mano::word::ADDR_MASK {
        return Err(format!("address {:X} is wider than 12 bits", value));
    }
    Ok(value)
}

fn fail(message: String) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

/// Load a program from either an assembly source (`.asm`) or a memory image.
fn load_program(path: &str) -> ProgramImage {
    let image = if path.ends_with(".asm") {
        let source = std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("Failed to read file: {}", e)));
        let image = mano::assemble(&source)
            .unwrap_or_else(|e| fail(format!("Assembly error: {}", e)));
        println!("📝 Assembled {} words", image.len());
        image
    } else {
        let image = mano::load_image(path)
            .unwrap_or_else(|e| fail(format!("Failed to load image: {}", e)));
        println!("📂 Loaded {} words", image.len());
        image
    };

    if image.is_empty() {
        fail("No words to execute".to_string());
    }
    image
}

fn load_config(path: Option<&str>) -> MachineConfig {
    match path {
        Some(path) => MachineConfig::load(path)
            .unwrap_or_else(|e: ConfigError| fail(format!("Failed to load config: {}", e))),
        None => MachineConfig::default(),
    }
}

fn run_program(path: &str, options: &RunOptions) {
    println!("🔧 Running: {}", path);
    let image = load_program(path);

    let mut config = load_config(options.config.as_deref());
    if let Some(max_ticks) = options.max_ticks {
        config.max_ticks = max_ticks;
    }
    if let Some(start) = options.start {
        config.start_address = Some(start);
    }
    if let Some(input) = &options.input {
        config.input = input.clone();
    }

    let mut cpu = Cpu::new();
    if let Err(e) = image.load_into(&mut cpu) {
        fail(format!("Failed to load program: {}", e));
    }
    if let Err(e) = config.apply(&mut cpu, image.start().unwrap_or(0)) {
        fail(format!("Failed to configure machine: {}", e));
    }

    println!();
    println!("━━━ Execution ━━━");

    let mut output = Vec::new();
    let mut ticks = 0u64;
    let mut outcome = RunOutcome::TickBudgetExhausted { ticks: 0 };

    while ticks < config.max_ticks {
        let pc = cpu.regs.pc;
        let interrupt = cpu.regs.r;
        let word = cpu.mem.read(pc);

        outcome = cpu.step_instruction((config.max_ticks - ticks).min(MAX_CYCLE_TICKS));
        ticks += outcome.ticks();
        if let Some(byte) = cpu.take_output() {
            output.push(byte);
        }

        if options.trace && outcome.ticks() > 0 {
            let text = if interrupt {
                "(interrupt cycle)".to_string()
            } else {
                disassemble_word(word)
            };
            println!(
                "{:03X}: {:<12} AC={:04X} E={} PC={:03X}",
                pc, text, cpu.regs.ac, cpu.regs.e as u8, cpu.regs.pc
            );
        }

        if outcome.halted() {
            break;
        }
    }

    if !output.is_empty() {
        println!();
        println!("━━━ Output ━━━");
        println!("{}", String::from_utf8_lossy(&output));
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Ticks:        {}", cpu.ticks);
    println!("Instructions: {}", cpu.instructions);
    println!("State:        {}", if cpu.is_halted() { "halted" } else { "running" });
    for name in [RegisterName::Pc, RegisterName::Ar, RegisterName::Ac, RegisterName::Dr, RegisterName::Ir] {
        println!("{:<4} {:04X}", name, cpu.get_register(name));
    }
    println!(
        "E={} I={} R={} IEN={} FGI={} FGO={}",
        cpu.regs.e as u8,
        cpu.regs.i as u8,
        cpu.regs.r as u8,
        cpu.regs.ien as u8,
        cpu.regs.fgi as u8,
        cpu.regs.fgo as u8
    );

    if !outcome.halted() {
        println!();
        println!("⚠️  Reached max ticks limit ({}). Use --max-ticks to increase.", config.max_ticks);
    }

    if options.dump_state {
        match serde_json::to_string_pretty(&cpu) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(format!("Failed to serialize state: {}", e)),
        }
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, config: Option<&str>) {
    println!("🔍 Loading: {}", path);
    let image = load_program(path);
    let config = load_config(config);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = mano::run_debugger(image, config) {
        fail(format!("Debugger error: {}", e));
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _config: Option<&str>) {
    fail("This build has no debugger; rebuild with the `tui` feature".to_string());
}

fn assemble_file(source_path: &str, output: Option<String>) {
    let out_path = output.unwrap_or_else(|| {
        Path::new(source_path).with_extension("hex").to_string_lossy().into_owned()
    });

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = std::fs::read_to_string(source_path)
        .unwrap_or_else(|e| fail(format!("Failed to read file: {}", e)));
    let image = mano::assemble(&source)
        .unwrap_or_else(|e| fail(format!("Assembly error: {}", e)));

    println!("✓ Assembled {} words", image.len());

    if let Err(e) = mano::save_image(&out_path, &image) {
        fail(format!("Failed to save image: {}", e));
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(image_path: &str) {
    println!("📖 Disassembling: {}", image_path);
    println!();

    let image = mano::load_image(image_path)
        .unwrap_or_else(|e| fail(format!("Failed to load image: {}", e)));

    println!("{}", mano::disassemble(&image));
}

/// Run `program` from address 0 and return the final machine.
fn run_words(program: &[u16]) -> Option<Cpu> {
    let mut cpu = Cpu::new();
    cpu.load_program(0, program).ok()?;
    cpu.reset(0);
    cpu.run_until_halt(10_000).halted().then_some(cpu)
}

fn check(name: &str, ok: bool, passed: &mut u32, failed: &mut u32) {
    print!("{}... ", name);
    if ok {
        println!("✓");
        *passed += 1;
    } else {
        println!("✗");
        *failed += 1;
    }
}

fn run_self_test() {
    println!("━━━ Basic Computer Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    // 83 + (-23) stored at 006
    let addition = [0x2004, 0x1005, 0x3006, 0x7001, 83, 0xFFE9];
    let ok = run_words(&addition)
        .map_or(false, |cpu| cpu.mem.read(6) == 60);
    check("Addition program", ok, &mut passed, &mut failed);

    // 83 - (-23) via two's complement, stored at 008
    let subtraction = [0x2007, 0x7200, 0x7020, 0x1006, 0x3008, 0x7001, 83, 0xFFE9];
    let ok = run_words(&subtraction)
        .map_or(false, |cpu| cpu.mem.read(8) == 106);
    check("Subtraction program", ok, &mut passed, &mut failed);

    let ok = run_words(&[0x7001]).map_or(false, |mut cpu| {
        let before = serde_json::to_string(&cpu.regs).ok();
        cpu.step();
        before == serde_json::to_string(&cpu.regs).ok()
    });
    check("HLT is idempotent", ok, &mut passed, &mut failed);

    let ok = mano::assemble("ORG 0\nLDA A\nADD B\nSTA C\nHLT\nA, DEC 83\nB, DEC -23\nC, HEX 0\nEND")
        .ok()
        .map(|image| image.iter().map(|(_, word)| word).collect::<Vec<_>>())
        .and_then(|words| run_words(&words))
        .map_or(false, |cpu| cpu.mem.read(6) == 60);
    check("Assembled addition program", ok, &mut passed, &mut failed);

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
