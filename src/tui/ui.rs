//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::MEMORY_SIZE;
use crate::word;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    // Left side: code, registers and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(9),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory, printer output and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(4),
            Constraint::Length(5),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_output(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw disassembly around PC.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:03X}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw every register, flag and the timing state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = &app.cpu.regs;
    let value = Style::default().fg(Color::White);

    let content = vec![
        Line::from(vec![
            Span::raw("AC: "),
            Span::styled(format!("{:04X}", regs.ac), value),
            Span::raw(format!(" ({:>6})", word::to_signed(regs.ac))),
            Span::raw("   E: "),
            Span::styled(format!("{}", regs.e as u8), flag_style(regs.e)),
        ]),
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:03X}", regs.pc), Style::default().fg(Color::Yellow)),
            Span::raw("   AR: "),
            Span::styled(format!("{:03X}", regs.ar), value),
            Span::raw("   IR: "),
            Span::styled(format!("{:04X}", regs.ir), value),
        ]),
        Line::from(vec![
            Span::raw("DR: "),
            Span::styled(format!("{:04X}", regs.dr), value),
            Span::raw("  TR: "),
            Span::styled(format!("{:04X}", regs.tr), value),
            Span::raw("  INPR: "),
            Span::styled(format!("{:02X}", regs.inpr), value),
            Span::raw("  OUTR: "),
            Span::styled(format!("{:02X}", regs.outr), value),
        ]),
        Line::from(vec![
            Span::raw("T"),
            Span::styled(format!("{}", regs.t), Style::default().fg(Color::Cyan)),
            Span::raw("  SC: "),
            Span::styled(format!("{}", regs.sc as u8), flag_style(regs.sc)),
            Span::raw("  opcode: "),
            Span::styled(format!("{}", regs.opcode), value),
            Span::raw("  I: "),
            Span::styled(format!("{}", regs.i as u8), flag_style(regs.i)),
        ]),
        Line::from(vec![
            Span::raw("R: "),
            Span::styled(format!("{}", regs.r as u8), flag_style(regs.r)),
            Span::raw("  IEN: "),
            Span::styled(format!("{}", regs.ien as u8), flag_style(regs.ien)),
            Span::raw("  FGI: "),
            Span::styled(format!("{}", regs.fgi as u8), flag_style(regs.fgi)),
            Span::raw("  FGO: "),
            Span::styled(format!("{}", regs.fgo as u8), flag_style(regs.fgo)),
        ]),
        Line::from(vec![
            Span::raw("Ticks: "),
            Span::styled(format!("{}", app.cpu.ticks), Style::default().fg(Color::Cyan)),
            Span::raw("   Instructions: "),
            Span::styled(format!("{}", app.cpu.instructions), Style::default().fg(Color::Cyan)),
            Span::raw("   S: "),
            Span::styled(
                if app.cpu.is_running() { "running" } else { "halted" },
                if app.cpu.is_running() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                }),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw memory view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let start = app.mem_scroll;
    let end = (start + visible_rows).min(MEMORY_SIZE);

    let items: Vec<ListItem> = app.cpu.mem
        .dump(start, end - start)
        .into_iter()
        .map(|(addr, value)| {
            let is_pc = addr == app.cpu.regs.pc as usize;
            let is_ar = addr == app.cpu.regs.ar as usize;

            let marker = match (is_pc, is_ar) {
                (true, _) => "PC",
                (false, true) => "AR",
                _ => "  ",
            };
            let text = format!("{} {:03X}: {:04X} {:>6}", marker, addr, value, word::to_signed(value));

            let style = if is_pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if is_ar {
                Style::default().fg(Color::Cyan)
            } else if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw the characters the program has printed.
fn draw_output(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let output = Paragraph::new(app.output.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Output ")
            .borders(Borders::ALL));

    frame.render_widget(output, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Tick  n: Instruction  r: Run  p: Pause"),
        Line::from("b: Breakpoint  x: Reset  q: Quit"),
        Line::from("↑↓ PgUp PgDn: Scroll memory"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Color style for a single-bit flag.
fn flag_style(set: bool) -> Style {
    if set {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    }
}
