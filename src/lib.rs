// Machine model
mod processor;
pub use processor::{
    signed, Bitwise, Exec, Flags, MemAddr, Processor, Register, Shift, Source, Transfer,
    MEMORY_SIZE, REGISTER_COUNT,
};

// Input state machine
mod session;
pub use session::{Base, InputMode, LiteralError, Session, SubState};

// Terminal boundary
mod key;
pub use key::{Key, KeyEvent, KeySource};
mod output;
pub use output::{is_minimal, Message, Renderer, Transcript};

mod settings;
pub use settings::{KeyMod, Settings};
