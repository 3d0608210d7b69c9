mod literal;

pub use self::literal::{Base, LiteralError, PENDING_MAX};

use crate::key::{Key, KeyEvent};
use crate::output::Transcript;
use crate::processor::{Bitwise, Exec, MemAddr, Processor, Register, Shift, Source, Transfer};
use crate::settings::Settings;

/// Which operand-needing opcode family is currently being composed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SubState {
    #[default]
    Default,
    Add,
    Subtract,
    Transfer,
    Store,
    Load,
    Logical,
    And,
    Eor,
    Ora,
    Quit,
}

/// Whether keys map to opcodes directly or accumulate a numeric literal.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Numerical(Base),
}

/// The interactive session: owns the processor, the transcript and the input
/// state machine that feeds them.
///
/// Exactly one key event is processed at a time; the caller renders only
/// after [`Session::handle_key`] returns, so every view reflects a fully
/// settled post-operation state.
pub struct Session {
    processor: Processor,
    transcript: Transcript,
    sub_state: SubState,
    input_mode: InputMode,
    /// Literal being composed in a numerical mode. Never outlives one
    /// input-entry session: cleared on commit, cancel, or mode change.
    pending: String,
    /// Register that increment/decrement, store and load act on.
    active: Register,
    /// Message-log scroll offset, counted back from the newest line.
    scroll: usize,
    running: bool,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        let mut transcript = Transcript::new();
        transcript.add_message("WELCOME TO MNEMO - PRESS ? FOR HELP", false);
        Self {
            processor: Processor::new(settings.auto_carry),
            transcript,
            sub_state: SubState::default(),
            input_mode: InputMode::default(),
            pending: String::new(),
            active: Register::A,
            scroll: 0,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn sub_state(&self) -> SubState {
        self.sub_state
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn active(&self) -> Register {
        self.active
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Feed one key event through the state machine.
    ///
    /// Unmapped keys are silently ignored; the only reported failure is an
    /// invalid numeric literal, which lands in the message log.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.input_mode {
            InputMode::Normal => self.handle_normal(key),
            InputMode::Numerical(base) => self.handle_numerical(base, key),
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        // Quit confirmation swallows every key.
        if self.sub_state == SubState::Quit {
            if key.key == Key::Char('y') {
                self.running = false;
            } else {
                self.sub_state = SubState::Default;
            }
            return;
        }

        // Log scrolling is global to every normal-mode state and never
        // touches processor state.
        match key.key {
            Key::Up if key.kmod => return self.scroll_up(),
            Key::Down if key.kmod => return self.scroll_down(),
            Key::PageUp => return self.scroll_up(),
            Key::PageDown => return self.scroll_down(),
            _ => {}
        }

        match self.sub_state {
            SubState::Default => self.handle_default(key),
            SubState::Logical => self.handle_logical(key),
            SubState::Transfer => self.handle_transfer(key),
            SubState::Add
            | SubState::Subtract
            | SubState::Load
            | SubState::Store
            | SubState::And
            | SubState::Eor
            | SubState::Ora => self.handle_operand(key),
            SubState::Quit => unreachable!("quit is handled before dispatch"),
        }
    }

    fn handle_default(&mut self, key: KeyEvent) {
        let log = &mut self.transcript;
        match key.key {
            Key::Escape => self.sub_state = SubState::Quit,

            Key::Char('a') => self.sub_state = SubState::Add,
            Key::Char('s') => self.sub_state = SubState::Subtract,
            Key::Char('l') => self.sub_state = SubState::Load,
            Key::Char('m') => self.sub_state = SubState::Store,
            Key::Char('o') => self.sub_state = SubState::Logical,
            Key::Char('t') => self.sub_state = SubState::Transfer,

            Key::Left if key.shift => self.processor.shift(Shift::Rol, log),
            Key::Right if key.shift => self.processor.shift(Shift::Ror, log),
            Key::Left => self.processor.shift(Shift::Asl, log),
            Key::Right => self.processor.shift(Shift::Lsr, log),
            // Bracket aliases for terminals that fold shift into arrow keys.
            Key::Char('[') => self.processor.shift(Shift::Rol, log),
            Key::Char(']') => self.processor.shift(Shift::Ror, log),

            Key::Up => self.processor.increment(self.active, log),
            Key::Down => self.processor.decrement(self.active, log),

            Key::Tab => self.active = self.active.next(),

            Key::Char('c') => {
                if self.processor.flags().carry {
                    self.processor.clc(log);
                } else {
                    self.processor.sec(log);
                }
            }
            Key::Char('v') => self.processor.clv(log),

            Key::Char('?') => {
                for line in HELP.lines() {
                    log.add_message(line, false);
                }
            }

            _ => {}
        }
    }

    fn handle_logical(&mut self, key: KeyEvent) {
        match key.key {
            Key::Char('a') => self.sub_state = SubState::And,
            Key::Char('o') => self.sub_state = SubState::Ora,
            Key::Char('e') => self.sub_state = SubState::Eor,
            Key::Escape => self.sub_state = SubState::Default,
            _ => {}
        }
    }

    fn handle_transfer(&mut self, key: KeyEvent) {
        let op = match (key.key, key.shift) {
            (Key::Char('x'), false) => Transfer::Tax,
            (Key::Char('x'), true) => Transfer::Txa,
            (Key::Char('y'), false) => Transfer::Tay,
            (Key::Char('y'), true) => Transfer::Tya,
            (Key::Escape, _) => {
                self.sub_state = SubState::Default;
                return;
            }
            _ => return,
        };
        self.processor.transfer(op, &mut self.transcript);
        self.sub_state = SubState::Default;
    }

    fn handle_operand(&mut self, key: KeyEvent) {
        match key.key {
            // A memory-address digit resolves the operand immediately.
            Key::Char(ch @ '0'..='4') => {
                let addr = MemAddr::new(ch as u8 - b'0')
                    .expect("digits 0-4 lie within the memory bank");
                if self.sub_state == SubState::Store {
                    self.processor.store(self.active, addr, &mut self.transcript);
                    self.sub_state = SubState::Default;
                } else {
                    let value = self.processor.memory(addr);
                    self.dispatch_operand(value, Source::Memory(addr));
                }
            }

            // Stores take an address only; literal entry does not apply.
            Key::Char('d') if self.sub_state != SubState::Store => {
                self.enter_numerical(Base::Decimal)
            }
            Key::Char('b') if self.sub_state != SubState::Store => {
                self.enter_numerical(Base::Binary)
            }
            Key::Char('h') if self.sub_state != SubState::Store => {
                self.enter_numerical(Base::Hex)
            }

            Key::Escape => {
                // The logical children cancel one level up, not to Default.
                self.sub_state = match self.sub_state {
                    SubState::And | SubState::Eor | SubState::Ora => SubState::Logical,
                    _ => SubState::Default,
                };
            }

            _ => {}
        }
    }

    fn enter_numerical(&mut self, base: Base) {
        self.pending.clear();
        self.input_mode = InputMode::Numerical(base);
    }

    fn handle_numerical(&mut self, base: Base, key: KeyEvent) {
        match key.key {
            Key::Char(ch) if base.accepts(ch) && self.pending.len() < PENDING_MAX => {
                self.pending.push(ch);
            }
            Key::Backspace => {
                // An empty buffer backs out of the numerical mode entirely.
                if self.pending.pop().is_none() {
                    self.input_mode = InputMode::Normal;
                }
            }
            Key::Enter => self.commit(base),
            Key::Escape => {
                self.pending.clear();
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
    }

    fn commit(&mut self, base: Base) {
        // An empty buffer at commit time is "no input": ignored silently.
        if self.pending.is_empty() {
            return;
        }
        match literal::parse(base, &self.pending) {
            Ok(value) => {
                self.pending.clear();
                self.input_mode = InputMode::Normal;
                self.dispatch_operand(value, base.source());
            }
            // Invalid literal: report and stay put, buffer intact.
            Err(error) => self.transcript.add_message(&error.to_string(), true),
        }
    }

    /// Dispatch a resolved operand byte to the pending opcode family and
    /// return to the default sub-state.
    fn dispatch_operand(&mut self, value: u8, source: Source) {
        let log = &mut self.transcript;
        match self.sub_state {
            SubState::Add => self.processor.adc(value, source, Exec::LOUD, log),
            SubState::Subtract => self.processor.sbc(value, source, Exec::LOUD, log),
            SubState::Load => self.processor.load(self.active, value, source, log),
            SubState::And => self.processor.bitwise(Bitwise::And, value, source, log),
            SubState::Ora => self.processor.bitwise(Bitwise::Ora, value, source, log),
            SubState::Eor => self.processor.bitwise(Bitwise::Eor, value, source, log),
            _ => unreachable!("operand dispatch from a non-operand sub-state"),
        }
        self.sub_state = SubState::Default;
    }

    fn scroll_up(&mut self) {
        let limit = self.transcript.messages().len().saturating_sub(1);
        self.scroll = (self.scroll + 1).min(limit);
    }

    fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

const HELP: &str = include_str!("./help.txt");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Flags;

    fn session() -> Session {
        Session::new(Settings::default())
    }

    fn ch(ch: char) -> KeyEvent {
        KeyEvent::plain(Key::Char(ch))
    }

    fn feed(session: &mut Session, keys: &str) {
        for c in keys.chars() {
            session.handle_key(ch(c));
        }
    }

    fn enter(session: &mut Session) {
        session.handle_key(KeyEvent::plain(Key::Enter));
    }

    fn escape(session: &mut Session) {
        session.handle_key(KeyEvent::plain(Key::Escape));
    }

    fn last_message(session: &Session) -> &str {
        &session.transcript().messages().last().unwrap().text
    }

    #[test]
    fn load_decimal_literal() {
        let mut s = session();
        feed(&mut s, "ld5");
        enter(&mut s);
        assert_eq!(s.processor().reg(Register::A), 5);
        assert_eq!(s.sub_state(), SubState::Default);
        assert_eq!(s.input_mode(), InputMode::Normal);
        assert_eq!(s.transcript().assembly(), ["LDA #5"]);
    }

    #[test]
    fn binary_literal_length_is_enforced_with_buffer_intact() {
        let mut s = session();
        feed(&mut s, "ab1010");
        enter(&mut s);
        // Rejected: still in binary mode, buffer untouched, error logged.
        assert_eq!(s.input_mode(), InputMode::Numerical(Base::Binary));
        assert_eq!(s.pending(), "1010");
        assert_eq!(
            last_message(&s),
            "ERROR: BINARY LITERAL MUST BE EXACTLY 8 DIGITS"
        );

        feed(&mut s, "1010");
        enter(&mut s);
        assert_eq!(s.processor().reg(Register::A), 0b1010_1010);
        assert_eq!(s.transcript().assembly(), ["ADC #%10101010"]);
        assert_eq!(s.sub_state(), SubState::Default);
    }

    #[test]
    fn hex_literal_and_length_check() {
        let mut s = session();
        feed(&mut s, "lhff");
        enter(&mut s);
        assert_eq!(s.processor().reg(Register::A), 255);
        assert_eq!(s.transcript().assembly(), ["LDA #$FF"]);

        feed(&mut s, "lh100");
        enter(&mut s);
        assert_eq!(s.pending(), "100");
        assert_eq!(last_message(&s), "ERROR: HEX LITERAL MUST BE AT MOST 2 DIGITS");
    }

    #[test]
    fn empty_commit_is_silently_ignored() {
        let mut s = session();
        let messages_before = s.transcript().messages().len();
        feed(&mut s, "ad");
        enter(&mut s);
        assert_eq!(s.input_mode(), InputMode::Numerical(Base::Decimal));
        assert_eq!(s.transcript().messages().len(), messages_before);
        assert!(s.transcript().assembly().is_empty());
    }

    #[test]
    fn backspace_pops_then_exits_mode() {
        let mut s = session();
        feed(&mut s, "ad42");
        s.handle_key(KeyEvent::plain(Key::Backspace));
        assert_eq!(s.pending(), "4");
        s.handle_key(KeyEvent::plain(Key::Backspace));
        assert_eq!(s.pending(), "");
        assert_eq!(s.input_mode(), InputMode::Numerical(Base::Decimal));
        s.handle_key(KeyEvent::plain(Key::Backspace));
        assert_eq!(s.input_mode(), InputMode::Normal);
        // The pending opcode family is still selected.
        assert_eq!(s.sub_state(), SubState::Add);
    }

    #[test]
    fn escape_discards_buffer_without_dispatch() {
        let mut s = session();
        feed(&mut s, "ad42");
        escape(&mut s);
        assert_eq!(s.input_mode(), InputMode::Normal);
        assert_eq!(s.pending(), "");
        assert_eq!(s.processor().reg(Register::A), 0);
        assert!(s.transcript().assembly().is_empty());
    }

    #[test]
    fn memory_operand_resolves_immediately() {
        let mut s = session();
        // A = 7, store to address 2, clear A, load back from address 2.
        feed(&mut s, "ld7");
        enter(&mut s);
        feed(&mut s, "m2");
        assert_eq!(s.processor().memory(MemAddr::new(2).unwrap()), 7);
        feed(&mut s, "ld0");
        enter(&mut s);
        feed(&mut s, "l2");
        assert_eq!(s.processor().reg(Register::A), 7);
        assert_eq!(
            s.transcript().assembly(),
            ["LDA #7", "STA $02", "LDA #0", "LDA $02"]
        );
    }

    #[test]
    fn store_ignores_literal_mode_keys() {
        let mut s = session();
        feed(&mut s, "md");
        assert_eq!(s.sub_state(), SubState::Store);
        assert_eq!(s.input_mode(), InputMode::Normal);
    }

    #[test]
    fn active_register_routes_load_and_store() {
        let mut s = session();
        s.handle_key(KeyEvent::plain(Key::Tab));
        assert_eq!(s.active(), Register::X);
        feed(&mut s, "ld9");
        enter(&mut s);
        assert_eq!(s.processor().reg(Register::X), 9);
        feed(&mut s, "m0");
        assert_eq!(s.processor().memory(MemAddr::new(0).unwrap()), 9);
        assert_eq!(s.transcript().assembly(), ["LDX #9", "STX $00"]);
    }

    #[test]
    fn logical_family_nests_and_cancels_one_level() {
        let mut s = session();
        feed(&mut s, "oe");
        assert_eq!(s.sub_state(), SubState::Eor);
        escape(&mut s);
        assert_eq!(s.sub_state(), SubState::Logical);
        escape(&mut s);
        assert_eq!(s.sub_state(), SubState::Default);
    }

    #[test]
    fn eor_twice_restores_accumulator() {
        let mut s = session();
        feed(&mut s, "ld90");
        enter(&mut s);
        for _ in 0..2 {
            feed(&mut s, "oed37");
            enter(&mut s);
        }
        assert_eq!(s.processor().reg(Register::A), 90);
    }

    #[test]
    fn transfers_follow_shift_direction() {
        let mut s = session();
        feed(&mut s, "ld5");
        enter(&mut s);
        feed(&mut s, "tx");
        assert_eq!(s.processor().reg(Register::X), 5);

        feed(&mut s, "ld0");
        enter(&mut s);
        s.handle_key(ch('t'));
        s.handle_key(KeyEvent::shifted(Key::Char('x')));
        assert_eq!(s.processor().reg(Register::A), 5);
        assert_eq!(
            s.transcript().assembly(),
            ["LDA #5", "TAX", "LDA #0", "TXA"]
        );
    }

    #[test]
    fn quit_confirmation() {
        let mut s = session();
        escape(&mut s);
        assert_eq!(s.sub_state(), SubState::Quit);

        // Anything but `y` cancels, leaving all state untouched.
        let flags_before = s.processor().flags();
        s.handle_key(ch('n'));
        assert_eq!(s.sub_state(), SubState::Default);
        assert!(s.is_running());
        assert_eq!(s.processor().flags(), flags_before);
        assert_eq!(s.processor().flags(), Flags::default());

        escape(&mut s);
        s.handle_key(ch('y'));
        assert!(!s.is_running());
    }

    #[test]
    fn carry_key_toggles_between_sec_and_clc() {
        let mut s = session();
        s.handle_key(ch('c'));
        assert!(s.processor().flags().carry);
        assert_eq!(last_message(&s), "SEC: SET CARRY FLAG");
        s.handle_key(ch('c'));
        assert!(!s.processor().flags().carry);
        assert_eq!(last_message(&s), "CLC: CLEAR CARRY FLAG");
    }

    #[test]
    fn shifts_and_rotates_from_default_state() {
        let mut s = session();
        feed(&mut s, "lh81");
        enter(&mut s);
        s.handle_key(KeyEvent::plain(Key::Left));
        assert_eq!(s.processor().reg(Register::A), 0x02);
        assert!(s.processor().flags().carry);

        s.handle_key(KeyEvent::shifted(Key::Left));
        assert_eq!(s.processor().reg(Register::A), 0x04);
        s.handle_key(KeyEvent::shifted(Key::Right));
        assert_eq!(s.processor().reg(Register::A), 0x02);
        assert_eq!(
            s.transcript().assembly(),
            ["LDA #$81", "ASL", "ROL", "ROR"]
        );
    }

    #[test]
    fn increment_decrement_follow_active_register() {
        let mut s = session();
        s.handle_key(KeyEvent::plain(Key::Up));
        assert_eq!(s.processor().reg(Register::A), 1);
        assert_eq!(s.transcript().assembly(), ["ADC #0"]);

        s.handle_key(KeyEvent::plain(Key::Tab));
        s.handle_key(KeyEvent::plain(Key::Up));
        assert_eq!(s.processor().reg(Register::X), 1);
        s.handle_key(KeyEvent::plain(Key::Down));
        assert_eq!(s.processor().reg(Register::X), 0);
        assert_eq!(s.transcript().assembly(), ["ADC #0", "INX", "DEX"]);
    }

    #[test]
    fn scrolling_never_touches_processor_state() {
        let mut s = session();
        feed(&mut s, "ld5");
        enter(&mut s);
        let value = s.processor().reg(Register::A);

        s.handle_key(KeyEvent::modded(Key::Up));
        assert_eq!(s.scroll(), 1);
        s.handle_key(KeyEvent::plain(Key::PageDown));
        assert_eq!(s.scroll(), 0);
        assert_eq!(s.processor().reg(Register::A), value);
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let mut s = session();
        feed(&mut s, "zq8!");
        assert_eq!(s.sub_state(), SubState::Default);
        assert!(s.transcript().assembly().is_empty());

        // Digits above the memory bank are ignored in operand states too.
        feed(&mut s, "a579");
        assert_eq!(s.sub_state(), SubState::Add);
        assert!(s.transcript().assembly().is_empty());
    }

    #[test]
    fn pending_buffer_is_capped() {
        let mut s = session();
        feed(&mut s, "ad123456789");
        assert_eq!(s.pending(), "12345678");
    }
}
