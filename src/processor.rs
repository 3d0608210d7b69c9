use std::fmt;

use crate::output::Transcript;

/// Registers in the file: A, X and Y.
pub const REGISTER_COUNT: usize = 3;
/// Size of the addressable memory bank.
pub const MEMORY_SIZE: usize = 5;

/// Column that the parenthesised operand is aligned to in log messages.
const OPERAND_COLUMN: usize = 35;

/// Represents the machine registers.
///
/// `A` is the accumulator and the only register with full arithmetic/logic
/// support. `X` and `Y` support increment, decrement and transfer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Register {
    A,
    X,
    Y,
}

impl Register {
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::X => 1,
            Self::Y => 2,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::X => 'X',
            Self::Y => 'Y',
        }
    }

    /// Next register in file order, wrapping. Used to cycle the active register.
    pub fn next(self) -> Self {
        match self {
            Self::A => Self::X,
            Self::X => Self::Y,
            Self::Y => Self::A,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Memory bank address, valid by construction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MemAddr(u8);

impl MemAddr {
    pub fn new(addr: u8) -> Option<Self> {
        ((addr as usize) < MEMORY_SIZE).then_some(Self(addr))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a byte operand was supplied.
///
/// Drives assembly formatting and nothing else; arithmetic sees only the
/// resolved byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Source {
    /// Immediate binary literal: `#%00000101`
    Binary,
    /// Immediate decimal literal: `#5`
    Decimal,
    /// Immediate hex literal: `#$05`
    Hex,
    /// Dereferenced memory operand: `$02`
    Memory(MemAddr),
}

impl Source {
    fn format(self, value: u8) -> String {
        match self {
            Self::Binary => format!("#%{value:08b}"),
            Self::Decimal => format!("#{value}"),
            Self::Hex => format!("#${value:02X}"),
            Self::Memory(addr) => format!("${:02X}", addr.get()),
        }
    }
}

/// Status flags. Z, N and V are reset at the start of every flag-affecting
/// operation; carry is set and cleared explicitly per opcode.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Flags {
    pub carry: bool,
    pub zero: bool,
    pub negative: bool,
    pub overflow: bool,
}

/// Per-call execution options for ADC/SBC.
///
/// A silent call still mutates state and still emits the assembly line; only
/// the log message is suppressed. Dynamic increment/decrement relies on this.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Exec {
    pub silent: bool,
}

impl Exec {
    pub const LOUD: Exec = Exec { silent: false };
    pub const SILENT: Exec = Exec { silent: true };
}

/// Register-to-register copy operations.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transfer {
    Tax,
    Tay,
    Txa,
    Tya,
}

impl Transfer {
    /// (source, destination) registers of the copy.
    fn route(self) -> (Register, Register) {
        match self {
            Self::Tax => (Register::A, Register::X),
            Self::Tay => (Register::A, Register::Y),
            Self::Txa => (Register::X, Register::A),
            Self::Tya => (Register::Y, Register::A),
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            Self::Tax => "TAX",
            Self::Tay => "TAY",
            Self::Txa => "TXA",
            Self::Tya => "TYA",
        }
    }
}

/// Accumulator shift and rotate operations.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Shift {
    Asl,
    Lsr,
    Rol,
    Ror,
}

impl Shift {
    fn mnemonic(self) -> &'static str {
        match self {
            Self::Asl => "ASL",
            Self::Lsr => "LSR",
            Self::Rol => "ROL",
            Self::Ror => "ROR",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Asl => "Arithmetic shift left",
            Self::Lsr => "Logical shift right",
            Self::Rol => "Rotate left",
            Self::Ror => "Rotate right",
        }
    }
}

/// Accumulator bitwise operations.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bitwise {
    And,
    Ora,
    Eor,
}

impl Bitwise {
    fn apply(self, a: u8, value: u8) -> u8 {
        match self {
            Self::And => a & value,
            Self::Ora => a | value,
            Self::Eor => a ^ value,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Ora => "ORA",
            Self::Eor => "EOR",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::And => "Logical AND",
            Self::Ora => "Logical inclusive OR",
            Self::Eor => "Logical exclusive OR",
        }
    }
}

/// Two's-complement reading of a byte, as shown in the register display.
pub fn signed(byte: u8) -> i16 {
    (byte & 0x7F) as i16 - (byte & 0x80) as i16
}

/// Represents complete machine state: register file, shadow of each
/// register's previous value, memory bank and status flags.
///
/// Every operation is atomic and total; byte arithmetic wraps modulo 256 and
/// addresses/registers are bounded by construction, so no operation can fail.
pub struct Processor {
    reg: [u8; REGISTER_COUNT],
    prev: [u8; REGISTER_COUNT],
    mem: [u8; MEMORY_SIZE],
    flags: Flags,
    /// When enabled, ADC clears carry (and SBC sets it) before operating.
    /// When disabled, carry persists from the previous operation.
    auto_carry: bool,
}

impl Processor {
    pub fn new(auto_carry: bool) -> Self {
        Self {
            reg: [0; REGISTER_COUNT],
            prev: [0; REGISTER_COUNT],
            mem: [0; MEMORY_SIZE],
            flags: Flags::default(),
            auto_carry,
        }
    }

    pub fn reg(&self, reg: Register) -> u8 {
        self.reg[reg.index()]
    }

    /// Value the register held immediately before its last mutation.
    pub fn prev(&self, reg: Register) -> u8 {
        self.prev[reg.index()]
    }

    pub fn memory(&self, addr: MemAddr) -> u8 {
        self.mem[addr.index()]
    }

    pub fn memory_bank(&self) -> &[u8; MEMORY_SIZE] {
        &self.mem
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    fn write_reg(&mut self, reg: Register, value: u8) {
        let i = reg.index();
        self.prev[i] = self.reg[i];
        self.reg[i] = value;
    }

    fn clear_status(&mut self) {
        self.flags.zero = false;
        self.flags.negative = false;
        self.flags.overflow = false;
    }

    fn set_zn(&mut self, value: u8) {
        self.flags.zero = value == 0;
        self.flags.negative = value & 0x80 != 0;
    }

    /// AND/ORA/EOR against the accumulator. Carry and overflow are unaffected.
    pub fn bitwise(&mut self, op: Bitwise, value: u8, source: Source, log: &mut Transcript) {
        self.clear_status();
        let result = op.apply(self.reg(Register::A), value);
        self.write_reg(Register::A, result);
        self.set_zn(result);
        log_operand(log, Register::A, op.mnemonic(), op.description(), value);
        log.add_assembly(&format!("{} {}", op.mnemonic(), source.format(value)));
    }

    /// LDA/LDX/LDY depending on the target register.
    pub fn load(&mut self, reg: Register, value: u8, source: Source, log: &mut Transcript) {
        self.clear_status();
        self.write_reg(reg, value);
        self.set_zn(value);
        let mnemonic = match reg {
            Register::A => "LDA",
            Register::X => "LDX",
            Register::Y => "LDY",
        };
        let description = format!("Load register {reg}");
        log_operand(log, reg, mnemonic, &description, value);
        log.add_assembly(&format!("{} {}", mnemonic, source.format(value)));
    }

    /// STA/STX/STY depending on the source register. No flags are touched.
    pub fn store(&mut self, reg: Register, addr: MemAddr, log: &mut Transcript) {
        let value = self.reg(reg);
        self.mem[addr.index()] = value;
        let mnemonic = match reg {
            Register::A => "STA",
            Register::X => "STX",
            Register::Y => "STY",
        };
        let head = format!("[{}] {}: Store register {}", reg.letter(), mnemonic, reg);
        log.add_message(&format!("{head:<OPERAND_COLUMN$}(${:02X})", addr.get()), false);
        log.add_assembly(&format!("{} ${:02X}", mnemonic, addr.get()));
    }

    /// TAX/TAY/TXA/TYA. Z/N are set from the copied value.
    pub fn transfer(&mut self, op: Transfer, log: &mut Transcript) {
        let (src, dst) = op.route();
        self.clear_status();
        let value = self.reg(src);
        self.write_reg(dst, value);
        self.set_zn(value);
        log.add_message(
            &format!("[{}] {}: Transfer {src} to {dst}", dst.letter(), op.mnemonic()),
            false,
        );
        log.add_assembly(op.mnemonic());
    }

    /// ASL/LSR/ROL/ROR on the accumulator.
    ///
    /// Rotations are pure 8-bit rotations (the carried-out bit re-enters the
    /// byte directly, not through the carry flag), so `ROL` then `ROR` is the
    /// identity. Carry receives the bit shifted out in all four cases.
    pub fn shift(&mut self, op: Shift, log: &mut Transcript) {
        self.clear_status();
        let value = self.reg(Register::A);
        let (result, carry) = match op {
            Shift::Asl => (value << 1, value & 0x80 != 0),
            Shift::Lsr => (value >> 1, value & 0x01 != 0),
            Shift::Rol => (value.rotate_left(1), value & 0x80 != 0),
            Shift::Ror => (value.rotate_right(1), value & 0x01 != 0),
        };
        self.flags.carry = carry;
        self.write_reg(Register::A, result);
        self.set_zn(result);
        log.add_message(
            &format!("[A] {}: {}", op.mnemonic(), op.description()),
            false,
        );
        log.add_assembly(op.mnemonic());
    }

    /// Increment the given register by one, wrapping.
    ///
    /// X and Y use INX/INY directly. A routes through ADC with a literal
    /// operand of zero: the +1 is carried in through the carry flag, which is
    /// forced set only when it is not already set. A carry left over from a
    /// previous operation is therefore consumed by the increment rather than
    /// stacking on top of it.
    pub fn increment(&mut self, reg: Register, log: &mut Transcript) {
        match reg {
            Register::A => {
                self.adc_inner(0, Source::Decimal, Exec::SILENT, true, log);
                log.add_message("[A] INC: Increment A", false);
            }
            _ => self.step(reg, 1, log),
        }
    }

    /// Decrement the given register by one, wrapping.
    ///
    /// The mirror image of [`Processor::increment`]: A routes through SBC
    /// with operand zero and carry forced clear (borrow of one) only when it
    /// is not already clear.
    pub fn decrement(&mut self, reg: Register, log: &mut Transcript) {
        match reg {
            Register::A => {
                self.sbc_inner(0, Source::Decimal, Exec::SILENT, true, log);
                log.add_message("[A] DEC: Decrement A", false);
            }
            _ => self.step(reg, u8::MAX, log),
        }
    }

    /// INX/INY/DEX/DEY. `delta` is 1 or -1 as a wrapping byte.
    fn step(&mut self, reg: Register, delta: u8, log: &mut Transcript) {
        debug_assert!(reg != Register::A, "accumulator steps go through ADC/SBC");
        self.clear_status();
        let result = self.reg(reg).wrapping_add(delta);
        self.write_reg(reg, result);
        self.set_zn(result);
        let (mnemonic, verb) = if delta == 1 {
            (format!("IN{}", reg.letter()), "Increment")
        } else {
            (format!("DE{}", reg.letter()), "Decrement")
        };
        log.add_message(&format!("[{}] {}: {} {}", reg.letter(), mnemonic, verb, reg), false);
        log.add_assembly(&mnemonic);
    }

    /// ADC: accumulator += operand + carry.
    pub fn adc(&mut self, value: u8, source: Source, exec: Exec, log: &mut Transcript) {
        self.adc_inner(value, source, exec, false, log);
    }

    /// SBC: accumulator -= operand + (1 - carry).
    pub fn sbc(&mut self, value: u8, source: Source, exec: Exec, log: &mut Transcript) {
        self.sbc_inner(value, source, exec, false, log);
    }

    fn adc_inner(
        &mut self,
        value: u8,
        source: Source,
        exec: Exec,
        increment: bool,
        log: &mut Transcript,
    ) {
        self.clear_status();
        if increment {
            // Increment bypasses the auto-carry adjustment so the +1 rides
            // in on the carry flag, unless carry is already set.
            if !self.flags.carry {
                self.flags.carry = true;
            }
        } else if self.auto_carry {
            self.flags.carry = false;
        }

        let a = self.reg(Register::A);
        let carry_in = self.flags.carry as u8;
        let result = a.wrapping_add(value).wrapping_add(carry_in);

        // Carry tracks the sign bit dropping out; overflow tracks it appearing.
        self.flags.carry = a & 0x80 != 0 && result & 0x80 == 0;
        if a & 0x80 == 0 && result & 0x80 != 0 {
            self.flags.overflow = true;
        }

        self.write_reg(Register::A, result);
        self.set_zn(result);

        if !exec.silent {
            log_operand(log, Register::A, "ADC", "Add with carry", value);
        }
        log.add_assembly(&format!("ADC {}", source.format(value)));
    }

    fn sbc_inner(
        &mut self,
        value: u8,
        source: Source,
        exec: Exec,
        decrement: bool,
        log: &mut Transcript,
    ) {
        self.clear_status();
        if decrement {
            // Decrement bypasses the auto-carry adjustment so the -1 rides
            // in as a borrow, unless carry is already clear.
            if self.flags.carry {
                self.flags.carry = false;
            }
        } else if self.auto_carry {
            self.flags.carry = true;
        }

        let a = self.reg(Register::A);
        let borrow = 1 - self.flags.carry as i16;
        let wide = a as i16 - value as i16 - borrow;
        let result = wide as u8;

        // Carry is only ever cleared here, on underflow below zero.
        if wide < 0 {
            self.flags.carry = false;
        }
        if a & 0x80 == 0 && result & 0x80 != 0 {
            self.flags.overflow = true;
        }

        self.write_reg(Register::A, result);
        self.set_zn(result);

        if !exec.silent {
            log_operand(log, Register::A, "SBC", "Subtract with carry", value);
        }
        log.add_assembly(&format!("SBC {}", source.format(value)));
    }

    /// CLC. Flag-only: Z/N/V and registers are untouched.
    pub fn clc(&mut self, log: &mut Transcript) {
        self.flags.carry = false;
        log.add_message("CLC: CLEAR CARRY FLAG", false);
        log.add_assembly("CLC");
    }

    /// SEC. Flag-only.
    pub fn sec(&mut self, log: &mut Transcript) {
        self.flags.carry = true;
        log.add_message("SEC: SET CARRY FLAG", false);
        log.add_assembly("SEC");
    }

    /// CLV. Flag-only.
    pub fn clv(&mut self, log: &mut Transcript) {
        self.flags.overflow = false;
        log.add_message("CLV: CLEAR OVERFLOW FLAG", false);
        log.add_assembly("CLV");
    }
}

/// Operand-bearing message line, e.g.
/// `[A] ADC: Add with carry            (00000101)`.
fn log_operand(log: &mut Transcript, reg: Register, mnemonic: &str, description: &str, value: u8) {
    let head = format!("[{}] {}: {}", reg.letter(), mnemonic, description);
    log.add_message(&format!("{head:<OPERAND_COLUMN$}({value:08b})"), false);
}
