use colored::Colorize;

use crate::processor::{signed, Register, REGISTER_COUNT};
use crate::session::{InputMode, Session, SubState};

/// Message lines shown at once in the scrollable log window.
const MESSAGE_WINDOW: usize = 8;
/// Assembly lines shown under the log window.
const ASSEMBLY_TAIL: usize = 5;

/// A human-readable log line. Error lines carry an `ERROR:` marker.
#[derive(Clone, Debug)]
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

/// Running log of executed operations: human-readable messages plus the
/// generated pseudo-assembly. Owns no presentation; the renderer reads it.
#[derive(Default)]
pub struct Transcript {
    messages: Vec<Message>,
    assembly: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, text: &str, is_error: bool) {
        let text = if is_error {
            format!("ERROR: {text}")
        } else {
            text.to_string()
        };
        self.messages.push(Message { text, is_error });
    }

    pub fn add_assembly(&mut self, text: &str) {
        self.assembly.push(text.to_string());
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn assembly(&self) -> &[String] {
        &self.assembly
    }
}

pub mod is_minimal {
    use std::cell::RefCell;
    thread_local! {
        static VALUE: RefCell<bool> = const { RefCell::new(false) };
    }
    /// May be called multiple times
    pub fn set(new_value: bool) {
        VALUE.with(|value| *value.borrow_mut() = new_value);
    }
    pub fn get() -> bool {
        VALUE.with(|value| *value.borrow())
    }
}

/// Redraws the whole status view after each key event.
///
/// In `--minimal` mode only newly appended messages are streamed, in plain
/// text, so the output is stable for blackbox tests.
pub struct Renderer {
    seen_messages: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Self { seen_messages: 0 }
    }

    pub fn draw(&mut self, session: &Session) {
        if is_minimal::get() {
            self.draw_minimal(session);
            return;
        }
        // Clear screen and move cursor to top left
        print!("\x1B[2J\x1B[1;1H");
        self.draw_registers(session);
        self.draw_memory(session);
        self.draw_status_line(session);
        self.draw_messages(session);
        self.draw_assembly(session);
        self.seen_messages = session.transcript().messages().len();
    }

    fn draw_minimal(&mut self, session: &Session) {
        let messages = session.transcript().messages();
        for message in &messages[self.seen_messages..] {
            println!("{}", message.text);
        }
        self.seen_messages = messages.len();
    }

    fn draw_registers(&self, session: &Session) {
        let p = session.processor();
        println!("\x1b[2m┌──────────────────────────────────────────┐\x1b[0m");
        println!("\x1b[2m│         \x1b[3mhex    uint     int      binary\x1b[0m\x1b[2m  │\x1b[0m");
        for i in 0..REGISTER_COUNT {
            let reg = [Register::A, Register::X, Register::Y][i];
            let value = p.reg(reg);
            let marker = if reg == session.active() { "▸" } else { " " };
            let changed = if value != p.prev(reg) { "*" } else { " " };
            println!(
                "\x1b[2m│\x1b[0m {marker}\x1b[1m{}\x1b[0m{changed} 0x{value:02X}  {value:>5}  {:>6}    {value:08b}  \x1b[2m│\x1b[0m",
                reg.letter(),
                signed(value),
            );
        }
        let flags = p.flags();
        println!(
            "\x1b[2m│\x1b[0m  {}  {}  {}  {}                      \x1b[2m│\x1b[0m",
            flag_cell('C', flags.carry),
            flag_cell('Z', flags.zero),
            flag_cell('N', flags.negative),
            flag_cell('V', flags.overflow),
        );
        println!("\x1b[2m└──────────────────────────────────────────┘\x1b[0m");
    }

    fn draw_memory(&self, session: &Session) {
        let bank = session.processor().memory_bank();
        let cells: Vec<String> = bank.iter().map(|byte| format!("{byte:02X}")).collect();
        println!("  {} [{}]", "memory".dimmed(), cells.join(" "));
    }

    fn draw_status_line(&self, session: &Session) {
        println!("  {} {}", "mode".dimmed(), describe_state(session).bold());
    }

    fn draw_messages(&self, session: &Session) {
        let messages = session.transcript().messages();
        let end = messages.len().saturating_sub(session.scroll());
        let start = end.saturating_sub(MESSAGE_WINDOW);
        println!();
        for message in &messages[start..end] {
            if message.is_error {
                println!("  {}", message.text.red());
            } else {
                println!("  {}", message.text);
            }
        }
    }

    fn draw_assembly(&self, session: &Session) {
        let assembly = session.transcript().assembly();
        if assembly.is_empty() {
            return;
        }
        let start = assembly.len().saturating_sub(ASSEMBLY_TAIL);
        println!();
        for line in &assembly[start..] {
            println!("  {}", line.green());
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn flag_cell(letter: char, set: bool) -> String {
    if set {
        format!("{letter}=1").bold().to_string()
    } else {
        format!("{letter}=0").dimmed().to_string()
    }
}

fn describe_state(session: &Session) -> String {
    match session.input_mode() {
        InputMode::Normal => match session.sub_state() {
            SubState::Default => format!("ready (active register {})", session.active()),
            SubState::Add => "ADC, operand: 0-4 memory, d/b/h literal".to_string(),
            SubState::Subtract => "SBC, operand: 0-4 memory, d/b/h literal".to_string(),
            SubState::Load => "load, operand: 0-4 memory, d/b/h literal".to_string(),
            SubState::Store => "store, address: 0-4".to_string(),
            SubState::Logical => "logical: a AND, o ORA, e EOR".to_string(),
            SubState::And => "AND, operand: 0-4 memory, d/b/h literal".to_string(),
            SubState::Ora => "ORA, operand: 0-4 memory, d/b/h literal".to_string(),
            SubState::Eor => "EOR, operand: 0-4 memory, d/b/h literal".to_string(),
            SubState::Transfer => "transfer: x/y (shift for reverse)".to_string(),
            SubState::Quit => "quit? y/n".to_string(),
        },
        InputMode::Numerical(base) => {
            format!("{} literal: {}_", base, session.pending())
        }
    }
}
