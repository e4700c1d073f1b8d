//! Command-line encoder: raw 16-bit PCM in, packed codec2 frames out.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use codec2::{CodecConfig, Encoder, Mode};

fn parse_mode(s: &str) -> Option<Mode> {
    Some(match s {
        "3200" => Mode::Mode3200,
        "2400" => Mode::Mode2400,
        "1600" => Mode::Mode1600,
        "1400" => Mode::Mode1400,
        "1300" => Mode::Mode1300,
        "1200" => Mode::Mode1200,
        "700C" => Mode::Mode700C,
        "450" => Mode::Mode450,
        _ => return None,
    })
}

fn main() {
    codec2::init();
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: {} <mode> <InputRawSpeechFile> <OutputBitFile>", args[0]);
        eprintln!("  mode: 3200 | 2400 | 1600 | 1400 | 1300 | 1200 | 700C | 450");
        eprintln!("  input is headerless 16-bit signed little-endian PCM");
        std::process::exit(1);
    }

    let Some(mode) = parse_mode(&args[1]) else {
        eprintln!("Error: unknown mode '{}'", args[1]);
        std::process::exit(1);
    };

    let mut encoder = match Encoder::new(CodecConfig::new(mode)) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: failed to create encoder: {e}");
            std::process::exit(1);
        }
    };

    let in_path = Path::new(&args[2]);
    let out_path = Path::new(&args[3]);
    let mut reader = BufReader::new(File::open(in_path).expect("failed to open input file"));
    let mut writer = BufWriter::new(File::create(out_path).expect("failed to create output file"));

    let samples_per_frame = encoder.samples_per_frame();
    let mut pcm = vec![0i16; samples_per_frame];
    let mut frame_bytes = vec![0u8; mode.bytes_per_frame()];
    let mut raw = vec![0u8; samples_per_frame * 2];
    let mut frames = 0u64;

    loop {
        let mut total_read = 0;
        while total_read < raw.len() {
            match reader.read(&mut raw[total_read..]) {
                Ok(0) => break,
                Ok(n) => total_read += n,
                Err(e) => {
                    eprintln!("Error reading input: {e}");
                    std::process::exit(1);
                }
            }
        }
        if total_read == 0 {
            break;
        }
        if total_read < raw.len() {
            raw[total_read..].fill(0);
        }
        for (sample, chunk) in pcm.iter_mut().zip(raw.chunks_exact(2)) {
            *sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        }

        encoder.encode(&mut frame_bytes, &pcm).expect("encode should be total for a valid frame");
        writer.write_all(&frame_bytes).expect("failed to write bitstream frame");
        frames += 1;

        if total_read < raw.len() {
            break;
        }
    }

    writer.flush().expect("failed to flush output");
    eprintln!("{mode} mode: encoded {frames} frames ({} bytes/frame)", mode.bytes_per_frame());
}
