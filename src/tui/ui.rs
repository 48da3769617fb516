//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::{ControlState, CycleRecord, Signal, AccessKind, MEMORY_SIZE};
use crate::logic::Word4;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(12),
            Constraint::Length(Signal::ALL.len() as u16 + 2),
        ])
        .split(frame.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(rows[0]);

    // Left side: program, FSM and status
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(7),
            Constraint::Length(3),
        ])
        .split(top[0]);

    draw_program(frame, left[0], app);
    draw_fsm(frame, left[1], app);
    draw_status(frame, left[2], app);

    // Right side: memory, cycle log and help
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(MEMORY_SIZE as u16 / 2 + 2),
            Constraint::Min(4),
            Constraint::Length(4),
        ])
        .split(top[1]);

    draw_memory(frame, right[0], app);
    draw_cycle_log(frame, right[1], app);
    draw_help(frame, right[2]);

    draw_waveform(frame, rows[1], app);
}

/// Draw the program listing with the next instruction and breakpoints.
fn draw_program(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let items: Vec<ListItem> = app
        .listing()
        .into_iter()
        .map(|(idx, text, is_next, has_bp)| {
            let prefix = if is_next { "▶ " } else { "  " };
            let bp = if has_bp { "●" } else { " " };
            let cursor = if idx == app.cursor { ">" } else { " " };
            let line = format!("{cursor}{bp} {prefix}{idx:02X}: {text}");

            let style = if is_next {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if has_bp {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Program ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw the control FSM and datapath registers.
fn draw_fsm(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let cpu = &app.cpu;

    let states: Vec<Span> = [
        ControlState::Init,
        ControlState::Fetch,
        ControlState::Load,
        ControlState::Execute,
        ControlState::Store,
    ]
    .into_iter()
    .flat_map(|s| {
        let style = if s == cpu.state() && !cpu.is_halted() {
            Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        [Span::styled(format!(" {} ", s.name()), style), Span::raw(" ")]
    })
    .collect();

    let decoded = match cpu.decoded() {
        Some(d) => format!("op={} addr={:X} imm={:X} M[addr]={:X}", d.opcode, d.addr, d.imm, d.operand),
        None => "-".to_string(),
    };

    let content = vec![
        Line::from(states),
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:X}", cpu.pc_word()), Style::default().fg(Color::Yellow)),
            Span::raw("   IR: "),
            Span::styled(
                format!("{:011b}", cpu.instruction().encode()),
                Style::default().fg(Color::White),
            ),
            Span::raw(format!(" ({})", cpu.instruction())),
        ]),
        Line::from(vec![
            Span::raw("ALU: "),
            Span::styled(format!("{:X}", cpu.alu_result()), Style::default().fg(Color::White)),
            Span::raw(format!(" ({:04b})   C: ", cpu.alu_result().value())),
            Span::styled(
                if cpu.alu_carry() { "1" } else { "0" },
                Style::default().fg(if cpu.alu_carry() { Color::Red } else { Color::Gray }),
            ),
        ]),
        Line::from(vec![Span::raw("Decoded: "), Span::raw(decoded)]),
        Line::from(vec![
            Span::raw("Cycles: "),
            Span::styled(format!("{}", cpu.cycles()), Style::default().fg(Color::Cyan)),
            Span::raw("   "),
            if cpu.is_halted() {
                Span::styled("HALTED", Style::default().fg(Color::Red))
            } else {
                Span::styled("RUNNING", Style::default().fg(Color::Green))
            },
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Control FSM ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw the 16 memory cells in two columns, hex and binary.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let last_access = app.cpu.trace().last().and_then(|r| r.access);
    let half = MEMORY_SIZE / 2;

    let cell = |idx: usize| -> Span<'static> {
        let addr = Word4::truncate(idx as u8);
        let value = app.cpu.memory().read(addr);
        let text = format!("{:X}: {:X} {:04b}  ", addr, value, value.value());

        let style = match last_access {
            Some(a) if a.addr == addr && a.kind == AccessKind::Write => {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            }
            Some(a) if a.addr == addr => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            _ if !value.is_zero() => Style::default().fg(Color::White),
            _ => Style::default().fg(Color::DarkGray),
        };
        Span::styled(text, style)
    };

    let lines: Vec<Line> = (0..half)
        .map(|row| Line::from(vec![cell(row), cell(row + half)]))
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(paragraph, area);
}

/// Draw the most recent cycle records, newest last.
fn draw_cycle_log(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible = (area.height as usize).saturating_sub(2);
    let items: Vec<ListItem> = app
        .cpu
        .trace()
        .window(visible)
        .iter()
        .map(|r| ListItem::new(format_record(r)))
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Cycles ")
            .borders(Borders::ALL));

    frame.render_widget(list, area);
}

fn format_record(r: &CycleRecord) -> String {
    let access = match r.access {
        Some(a) if a.kind == AccessKind::Read => format!(" rd M[{:X}]={:X}", a.addr, a.value),
        Some(a) => format!(" wr M[{:X}]={:X}", a.addr, a.value),
        None => String::new(),
    };
    format!("{:>4} {:<7} pc={:X} alu={:X}{}", r.cycle, r.state.name(), r.pc & 0xF, r.alu_result, access)
}

/// Draw one row per signal over the trailing cycles that fit the width.
fn draw_waveform(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    const LABEL: usize = 7;
    let width = (area.width as usize).saturating_sub(LABEL + 2);
    let records = app.cpu.trace().window(width);

    let lines: Vec<Line> = Signal::ALL
        .iter()
        .map(|&signal| {
            let trace: String = records.iter().map(|r| wave_char(signal, r)).collect();
            Line::from(vec![
                Span::styled(format!("{:<1$}", signal.name(), LABEL), Style::default().fg(Color::Cyan)),
                Span::raw(trace),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .title(" Waveform ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)));

    frame.render_widget(paragraph, area);
}

/// One character of a signal's waveform row.
fn wave_char(signal: Signal, record: &CycleRecord) -> char {
    match (signal, signal.sample(record)) {
        (Signal::Clk, Some(1)) => '‾',
        (Signal::Clk, _) => '_',
        (Signal::State, _) => record.state.name().chars().next().unwrap_or('?'),
        (_, Some(v)) => char::from_digit((v & 0xF) as u32, 16)
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?'),
        (_, None) => '·',
    }
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
        Line::from("s: Cycle  i: Instruction  r: Run  p: Pause"),
        Line::from("b: Breakpoint  ↑↓: Cursor  x: Reset  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
