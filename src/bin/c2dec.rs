//! Command-line decoder: packed codec2 frames in, raw 16-bit PCM out.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use codec2::{CodecConfig, Decoder, Mode};

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
        "450PWB" => Mode::Mode450Pwb,
        _ => return None,
    })
}

fn main() {
    codec2::init();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <mode> <InputBitFile> <OutputRawSpeechFile> [--ber <estimate>]", args[0]);
        eprintln!("  mode: 3200 | 2400 | 1600 | 1400 | 1300 | 1200 | 700C | 450 | 450PWB");
        std::process::exit(1);
    }

    let Some(mode) = parse_mode(&args[1]) else {
        eprintln!("Error: unknown mode '{}'", args[1]);
        std::process::exit(1);
    };

    let ber_est = if args.len() >= 6 && args[4] == "--ber" {
        args[5].parse::<f32>().unwrap_or(0.0)
    } else {
        0.0
    };

    let mut decoder = match Decoder::new(CodecConfig::new(mode)) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: failed to create decoder: {e}");
            std::process::exit(1);
        }
    };

    let in_path = Path::new(&args[2]);
    let out_path = Path::new(&args[3]);
    let mut reader = BufReader::new(File::open(in_path).expect("failed to open input file"));
    let mut writer = BufWriter::new(File::create(out_path).expect("failed to create output file"));

    let bytes_per_frame = mode.bytes_per_frame();
    let mut frame_bytes = vec![0u8; bytes_per_frame];
    let mut pcm = vec![0i16; decoder.samples_per_frame()];
    let mut raw = vec![0u8; pcm.len() * 2];
    let mut frames = 0u64;

    loop {
        let mut total_read = 0;
        while total_read < frame_bytes.len() {
            match reader.read(&mut frame_bytes[total_read..]) {
                Ok(0) => break,
                Ok(n) => total_read += n,
                Err(e) => {
                    eprintln!("Error reading bitstream: {e}");
                    std::process::exit(1);
                }
            }
        }
        if total_read == 0 {
            break;
        }
        if total_read < frame_bytes.len() {
            frame_bytes[total_read..].fill(0);
        }

        decoder
            .decode_ber(&mut pcm, &frame_bytes, ber_est)
            .expect("decode should be total for a validly constructed decoder");

        for (chunk, sample) in raw.chunks_exact_mut(2).zip(pcm.iter()) {
            let bytes = sample.to_le_bytes();
            chunk[0] = bytes[0];
            chunk[1] = bytes[1];
        }
        writer.write_all(&raw).expect("failed to write PCM");
        frames += 1;

        if total_read < frame_bytes.len() {
            break;
        }
    }

    writer.flush().expect("failed to flush output");
    eprintln!("{mode} mode: decoded {frames} frames");
}
