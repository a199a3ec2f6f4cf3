//! Raw ADC word to calibrated RMS current.

/// Swap the two bytes of a bus word. SMBus word reads deliver the low byte
/// first while the converter sends its result MSB first.
#[inline]
pub fn swap16(word: u16) -> u16 {
    word.swap_bytes()
}

/// Reinterpret a 16-bit two's complement code as signed.
#[inline]
pub fn sign16(code: u16) -> i16 {
    code as i16
}

/// Round to `decimals` places, half away from zero.
#[inline]
pub fn round_to(x: f64, decimals: u8) -> f64 {
    let f = 10f64.powi(i32::from(decimals));
    (x * f).round() / f
}

/// Calibration chain from ADC code to line current.
///
/// Definition:
///   volts  = vref * code / resolution
///   amps   = volts / shunt_ohm * ct_ratio / rms_factor
///   result = round(|amps|, decimals)
///
/// The converter sees the clamp's secondary current across a shunt after
/// rectification and averaging, so `rms_factor` (0.9005 for a sine) turns the
/// averaged value back into RMS. The sign of the code carries no information
/// for a rectified signal and is dropped.
///
/// Example (reference board): code 1000 → 0.0625 V → 6.25 mA secondary →
/// 18.75 A averaged → 20.821766 A RMS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub vref: f64,
    pub resolution: f64,
    pub shunt_ohm: f64,
    pub ct_ratio: f64,
    pub rms_factor: f64,
    pub decimals: u8,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            vref: 2.048,
            resolution: 32768.0,
            shunt_ohm: 10.0,
            ct_ratio: 3000.0,
            rms_factor: 0.9005,
            decimals: 6,
        }
    }
}

impl Calibration {
    /// Convert a signed converter code to amperes (non-negative, rounded).
    pub fn code_to_amps(&self, code: i16) -> f64 {
        let volts = self.vref * f64::from(code) / self.resolution;
        let amps = volts / self.shunt_ohm * self.ct_ratio / self.rms_factor;
        round_to(amps.abs(), self.decimals)
    }

    /// Convert a word as returned by `Transport::read_sample`.
    #[inline]
    pub fn word_to_amps(&self, bus_word: u16) -> f64 {
        self.code_to_amps(sign16(swap16(bus_word)))
    }
}
