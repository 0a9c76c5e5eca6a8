//! Debugger application state and logic.

use crate::asm::disasm::disassemble_range;
use crate::cpu::MAX_CYCLE_TICKS;
use crate::{Cpu, MachineConfig, ProgramImage, Step};
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Original program for reference.
    pub image: ProgramImage,
    /// How the machine is started on reset.
    pub config: MachineConfig,
    /// Breakpoints (by address), checked at instruction boundaries.
    pub breakpoints: HashSet<u16>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Characters the program has printed.
    pub output: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(image: ProgramImage, config: MachineConfig) -> Self {
        let mut app = Self {
            cpu: Cpu::new(),
            image,
            config,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: String::new(),
            output: String::new(),
            mem_scroll: 0,
        };
        app.reset();
        app.status = "Ready. Press 's' to tick, 'n' for next instruction, 'r' to run, 'q' to quit.".into();
        app
    }

    /// Apply one clock edge.
    pub fn tick(&mut self) {
        match self.cpu.step() {
            Step::Tick { t } => {
                self.status = format!("tick {}: t={} SC={}", self.cpu.ticks, t, self.cpu.regs.sc as u8);
            }
            Step::Halted => {
                self.status = format!("Halted after {} ticks", self.cpu.ticks);
                self.running = false;
            }
        }
        self.collect_output();
    }

    /// Run to the end of the current instruction cycle.
    pub fn step_instruction(&mut self) {
        let pc = self.cpu.regs.pc;
        let outcome = self.cpu.step_instruction(MAX_CYCLE_TICKS);
        self.collect_output();

        if outcome.halted() {
            self.status = format!("Halted after {} ticks", self.cpu.ticks);
            self.running = false;
        } else {
            self.status = format!(
                "{:03X}: {} ({} ticks)",
                pc,
                crate::asm::disasm::disassemble_word(self.cpu.regs.ir),
                outcome.ticks()
            );
        }
    }

    /// Run until halt or breakpoint.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn advance(&mut self) {
        if !self.running {
            return;
        }

        if self.cpu.is_halted() {
            self.running = false;
            self.status = format!("Halted after {} ticks", self.cpu.ticks);
            return;
        }

        self.step_instruction();

        let pc = self.cpu.regs.pc;
        if self.running && self.cpu.at_instruction_boundary() && self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={:03X}", pc);
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.regs.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:03X}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:03X}", pc);
        }
    }

    /// Reset CPU to initial state.
    pub fn reset(&mut self) {
        self.cpu.mem.clear();
        self.running = false;
        self.output.clear();

        let start = self.image.start().unwrap_or(0);
        let loaded = self
            .image
            .load_into(&mut self.cpu)
            .map_err(|e| e.to_string())
            .and_then(|_| self.config.apply(&mut self.cpu, start).map_err(|e| e.to_string()));

        self.status = match loaded {
            Ok(()) => "Reset. Ready.".into(),
            Err(e) => format!("Reset failed: {}", e),
        };
    }

    /// Get disassembly around current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u16, String, bool)> {
        let pc = self.cpu.regs.pc;
        let start = pc.saturating_sub(lines as u16 / 2);

        disassemble_range(&self.cpu.mem, start, lines)
            .into_iter()
            .map(|(addr, word, text)| (addr, format!("{:04X}  {}", word, text), addr == pc))
            .collect()
    }

    fn collect_output(&mut self) {
        while let Some(byte) = self.cpu.take_output() {
            self.output.push(byte as char);
        }
    }
}

/// Run the debugger with a program.
pub fn run_debugger(image: ProgramImage, config: MachineConfig) -> std::io::Result<()> {
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

    let mut app = DebuggerApp::new(image, config);

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
                            app.tick();
                        }
                        KeyCode::Char('n') => {
                            app.running = false;
                            app.step_instruction();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(1);
                        }
                        KeyCode::Down => {
                            if app.mem_scroll < crate::cpu::MEMORY_SIZE - 1 {
                                app.mem_scroll += 1;
                            }
                        }
                        KeyCode::PageDown => {
                            app.mem_scroll = (app.mem_scroll + 16).min(crate::cpu::MEMORY_SIZE - 1);
                        }
                        KeyCode::PageUp => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(16);
                        }
                        _ => {}
                    }
                }
            }
        }

        app.advance();

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
