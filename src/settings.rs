/// Which physical modifier acts as the logical "keyMod" when decoding input.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyMod {
    Ctrl,
    Alt,
}

/// Runtime configuration, resolved once at startup from CLI flags.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
    /// When enabled, ADC clears carry before adding and SBC sets carry
    /// before subtracting. When disabled, carry persists across operations
    /// and acts as a +1 bias (borrow-as-not-carry for SBC).
    pub auto_carry: bool,
    pub key_mod: KeyMod,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_carry: true,
            key_mod: KeyMod::Ctrl,
        }
    }
}
