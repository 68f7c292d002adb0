//! Command line front end for the SID ripper.
//!
//! Reads a compiled player binary, decodes the song data out of it and
//! writes a tracker save file. Feature autodetection can be overridden per
//! flag when a rip comes out misaligned.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use sid2sng::song::{
    FIRSTNOTE, KEYOFF, KEYON, LASTNOTE, MAX_TABLES, REPEAT, REST, TRANSDOWN, TRANSUP,
};
use sid2sng::{rip, Features, RipOptions, Song};

#[derive(Parser)]
#[command(name = "sid2sng")]
#[command(about = "Rip GoatTracker song data out of a compiled SID file")]
struct Args {
    /// SID file to rip
    input: PathBuf,

    /// Output song file
    #[arg(default_value = "out.sng")]
    output: PathBuf,

    /// Assume the player has no pulse table
    #[arg(long)]
    no_pulse: bool,

    /// Assume the player has no filter table
    #[arg(long)]
    no_filter: bool,

    /// Assume the player has no per-instrument vibrato data
    #[arg(long)]
    no_instr_vibrato: bool,

    /// Assume gate timer and first waveform are compiled constants
    #[arg(long)]
    fixed_params: bool,

    /// Skip the wave table delay compensation
    #[arg(long)]
    no_wave_delay: bool,

    /// Skip feature autodetection; only the flags above apply
    #[arg(long)]
    no_autodetect: bool,

    /// Dump the decoded song to stdout
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data = fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let options = RipOptions {
        no_pulse: args.no_pulse,
        no_filter: args.no_filter,
        no_instr_vibrato: args.no_instr_vibrato,
        fixed_params: args.fixed_params,
        no_wave_delay: args.no_wave_delay,
        no_autodetect: args.no_autodetect,
    };

    let outcome = rip(&data, &options)
        .with_context(|| format!("ripping {}", args.input.display()))?;

    eprintln!("{}", text_field(&outcome.header.name));
    eprintln!("{}", text_field(&outcome.header.author));
    eprintln!("{}", text_field(&outcome.header.released));
    eprintln!(
        "load ${:04x} init ${:04x} play ${:04x}, {} subtune(s), {} channels",
        outcome.header.load_addr,
        outcome.header.init_addr,
        outcome.header.play_addr,
        outcome.song.song_order.len(),
        outcome.song.channel_count(),
    );
    eprintln!("features: {}", feature_line(&outcome.features));

    for warning in &outcome.warnings {
        eprintln!("warning: {warning}");
    }

    if args.verbose {
        print!("{}", dump_song(&outcome.song));
    }

    sid2sng::sng::save(&outcome.song, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    eprintln!(
        "wrote {} ({} patterns, {} instruments)",
        args.output.display(),
        outcome.song.patterns.len(),
        outcome.song.instrument_count(),
    );

    Ok(())
}

/// Fixed-width header text with the zero padding trimmed.
fn text_field(raw: &[u8]) -> String {
    raw.iter()
        .take_while(|&&b| b != 0)
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect()
}

fn feature_line(features: &Features) -> String {
    let named = [
        (features.pulse, "pulse"),
        (features.filter, "filter"),
        (features.instr_vibrato, "vibrato"),
        (features.variable_params, "variable-params"),
        (features.wave_delay, "wave-delay"),
    ];
    let present: Vec<&str> = named.iter().filter(|(on, _)| *on).map(|&(_, n)| n).collect();
    if present.is_empty() {
        "none".to_string()
    } else {
        present.join(" ")
    }
}

const NOTE_LETTERS: &[u8; 12] = b"CCDDEFFGGAAB";
const NOTE_SHARPS: &[u8; 12] = b"-#-#--#-#-#-";

/// Three-character note column: name, sharp mark, octave.
fn note_name(note: u8) -> String {
    match note {
        FIRSTNOTE..=LASTNOTE => {
            let n = (note - FIRSTNOTE) as usize;
            format!(
                "{}{}{}",
                NOTE_LETTERS[n % 12] as char,
                NOTE_SHARPS[n % 12] as char,
                n / 12
            )
        }
        REST => "...".to_string(),
        KEYOFF => "OFF".to_string(),
        KEYON => " ON".to_string(),
        _ => "END".to_string(),
    }
}

fn order_entry(x: u8) -> String {
    match x {
        0..=0xCF => format!("{x:02X}"),
        REPEAT..=0xDF => format!("R{:X}", x - REPEAT),
        TRANSDOWN..=0xEF => format!("-{:X}", TRANSUP - x),
        _ => format!("+{:X}", x - TRANSUP),
    }
}

fn dump_song(song: &Song) -> String {
    let mut out = String::new();

    for (s, subtune) in song.song_order.iter().enumerate() {
        let _ = writeln!(out, "subtune {s}:");
        for (c, order) in subtune.iter().enumerate() {
            let entries: Vec<String> = order[..order.len() - 2]
                .iter()
                .map(|&x| order_entry(x))
                .collect();
            let restart = order[order.len() - 1];
            let _ = writeln!(
                out,
                "  ch{c}: {} (restart {restart:02X})",
                entries.join(" ")
            );
        }
    }

    let _ = writeln!(out, "instruments:");
    for (i, instr) in song.instruments.iter().enumerate().skip(1) {
        let _ = writeln!(
            out,
            "  {i:02X}: ad {:02X} sr {:02X} ptr {:02X}/{:02X}/{:02X}/{:02X} vib {:02X} gate {:02X} wave {:02X}",
            instr.ad,
            instr.sr,
            instr.table_ptr[0],
            instr.table_ptr[1],
            instr.table_ptr[2],
            instr.table_ptr[3],
            instr.vibdelay,
            instr.gatetimer,
            instr.firstwave,
        );
    }

    for t in 0..MAX_TABLES {
        let name = ["wave", "pulse", "filter", "speed"][t];
        if song.ltable[t].is_empty() {
            continue;
        }
        let _ = writeln!(out, "{name} table:");
        for (i, (lt, rt)) in song.ltable[t].iter().zip(&song.rtable[t]).enumerate() {
            let _ = writeln!(out, "  {:02X}: {lt:02X} {rt:02X}", i + 1);
        }
    }

    for (p, pattern) in song.patterns.iter().enumerate() {
        let _ = writeln!(out, "pattern {p:02X}:");
        for row in pattern.chunks_exact(4) {
            let _ = writeln!(
                out,
                "  {} {:02X} {:X}{:02X}",
                note_name(row[0]),
                row[1],
                row[2],
                row[3]
            );
        }
    }

    out
}
