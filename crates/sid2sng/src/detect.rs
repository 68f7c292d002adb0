//! Optional player feature detection.
//!
//! The tracker's export strips every feature the song does not use, and the
//! stripped player packs its data tighter: no pulse table pointers when
//! there is no pulse runner, no gate timer column in fixed-parameter mode,
//! and so on. Which variant we are looking at is not recorded anywhere, but
//! each optional feature leaves a short machine-code idiom in the player.
//! Operand bytes move with relocation, opcodes do not, so the idioms are
//! matched with wildcards over the operands.

use crate::matcher::BytePattern;

/// Pulse runner: `sta $d402,x` / skip / `sta $d403,x` writing the pulse
/// register pair.
const PULSE_IDIOM: &[u8] = b"\x9d\x02\xd4.\x9d\x03\xd4";

/// Filter runner: `adc` cutoff accumulator / `sta $d416` absolute store to
/// the filter cutoff register.
const FILTER_IDIOM: &[u8] = b"\x6d..\x8d\x16\xd4";

/// Per-instrument vibrato: `lda vibdelay,y` / `cmp counter,y` / `bcc`.
const INSTR_VIBRATO_IDIOM: &[u8] = b"\xb9..\xd9..\x90";

/// Variable gate/wave parameters: `lda gatetimer,y` / `sta zp` /
/// `lda firstwave,y` / `sta zp`.
const VARIABLE_PARAMS_IDIOM: &[u8] = b"\xb9..\x85.\xb9..\x85.";

/// Wavetable delay handling: `cmp #$10` / `bcc` / `cmp #$f0` classifying a
/// wave table left byte into the delay range.
const WAVE_DELAY_IDIOM: &[u8] = b"\xc9\x10\x90.\xc9\xf0";

/// Which optional features the compiled player carries.
///
/// Each flag changes how tightly the data region is packed, so a wrong
/// flag shifts every later read. The validator usually catches that as a
/// cursor mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// Pulse modulation table present.
    pub pulse: bool,
    /// Filter modulation table present.
    pub filter: bool,
    /// Per-instrument vibrato pointers and delays present.
    pub instr_vibrato: bool,
    /// Gate timer and first waveform stored per instrument.
    pub variable_params: bool,
    /// Wave table delay values need the one-step compensation on read.
    pub wave_delay: bool,
}

impl Default for Features {
    /// Everything assumed present, matching a full-featured player.
    fn default() -> Self {
        Self {
            pulse: true,
            filter: true,
            instr_vibrato: true,
            variable_params: true,
            wave_delay: true,
        }
    }
}

/// Manual overrides for the decode, combinable with autodetection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RipOptions {
    /// Treat the pulse table as absent.
    pub no_pulse: bool,
    /// Treat the filter table as absent.
    pub no_filter: bool,
    /// Treat per-instrument vibrato data as absent.
    pub no_instr_vibrato: bool,
    /// Gate timer / first waveform are compiled constants, not data.
    pub fixed_params: bool,
    /// Skip the wave table delay compensation.
    pub no_wave_delay: bool,
    /// Skip signature matching entirely; only manual flags apply.
    pub no_autodetect: bool,
}

impl Features {
    /// Scan the blob for each feature's idiom. Absence of a match means the
    /// feature was compiled out.
    pub fn detect(data: &[u8]) -> Self {
        let found = |src: &[u8]| BytePattern::compile(src).find(data).is_some();
        Self {
            pulse: found(PULSE_IDIOM),
            filter: found(FILTER_IDIOM),
            instr_vibrato: found(INSTR_VIBRATO_IDIOM),
            variable_params: found(VARIABLE_PARAMS_IDIOM),
            wave_delay: found(WAVE_DELAY_IDIOM),
        }
    }

    /// Resolve the effective feature set: autodetect unless disabled, then
    /// apply the manual disable flags on top.
    pub fn resolve(data: &[u8], options: &RipOptions) -> Self {
        let mut features = if options.no_autodetect {
            Self::default()
        } else {
            Self::detect(data)
        };
        if options.no_pulse {
            features.pulse = false;
        }
        if options.no_filter {
            features.filter = false;
        }
        if options.no_instr_vibrato {
            features.instr_vibrato = false;
        }
        if options.fixed_params {
            features.variable_params = false;
        }
        if options.no_wave_delay {
            features.wave_delay = false;
        }
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob_with(idioms: &[&[u8]]) -> Vec<u8> {
        let mut data = vec![0xEAu8; 16];
        for idiom in idioms {
            // Fill wildcard slots with an arbitrary operand byte.
            data.extend(idiom.iter().map(|&b| if b == b'.' { 0x7B } else { b }));
            data.extend_from_slice(&[0xEA; 5]);
        }
        data
    }

    #[test]
    fn absent_idioms_clear_their_flags() {
        let data = blob_with(&[PULSE_IDIOM, WAVE_DELAY_IDIOM]);
        let f = Features::detect(&data);
        assert!(f.pulse);
        assert!(f.wave_delay);
        assert!(!f.filter);
        assert!(!f.instr_vibrato);
        assert!(!f.variable_params);
    }

    #[test]
    fn manual_flags_override_detection() {
        let data = blob_with(&[
            PULSE_IDIOM,
            FILTER_IDIOM,
            INSTR_VIBRATO_IDIOM,
            VARIABLE_PARAMS_IDIOM,
            WAVE_DELAY_IDIOM,
        ]);
        let options = RipOptions {
            no_pulse: true,
            fixed_params: true,
            ..Default::default()
        };
        let f = Features::resolve(&data, &options);
        assert!(!f.pulse);
        assert!(!f.variable_params);
        assert!(f.filter);
        assert!(f.instr_vibrato);
        assert!(f.wave_delay);
    }

    #[test]
    fn no_autodetect_assumes_everything_present() {
        let data = blob_with(&[]);
        let options = RipOptions {
            no_autodetect: true,
            ..Default::default()
        };
        assert_eq!(Features::resolve(&data, &options), Features::default());
    }

    #[test]
    fn detection_tolerates_any_operand_bytes() {
        // Operands that collide with text-special values must still match.
        for operand in [0x00u8, 0x0A, 0x0D, b'.', b'\\'] {
            let mut data = vec![0u8; 8];
            data.extend(
                PULSE_IDIOM
                    .iter()
                    .map(|&b| if b == b'.' { operand } else { b }),
            );
            assert!(
                Features::detect(&data).pulse,
                "operand 0x{operand:02x} must not break the match"
            );
        }
    }
}
