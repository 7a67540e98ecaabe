use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use std::process::Command;

fn to_bytes(samples: &[f64]) -> Vec<u8> {
    samples.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn to_f64(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect()
}

fn trace(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 10.0 + 0.05 * i as f64 + (i as f64 * 0.2).sin())
        .collect()
}

#[test]
fn basic_usage() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("rec-filter")?;
    let tmp = assert_fs::TempDir::new()?;
    let input = tmp.child("input.raw");
    let output = tmp.child("output.raw");
    input.write_binary(&vec![0u8; 8 * 1000])?;

    cmd.arg(input.path()).arg(output.path()).arg("--c-hp").arg("0.9");
    cmd.assert().success();
    let out = std::fs::read(output.path())?;
    assert_eq!(out.len(), 8 * 1000);
    assert!(to_f64(&out).iter().all(|&y| y == 0.0));
    Ok(())
}

#[test]
fn matches_library() -> anyhow::Result<()> {
    let tmp = assert_fs::TempDir::new()?;
    let input = tmp.child("input.raw");
    let output = tmp.child("output.raw");
    let signal = trace(3000);
    input.write_binary(&to_bytes(&signal))?;

    Command::cargo_bin("rec-filter")?
        .arg(input.path())
        .arg(output.path())
        .args(&["--c-hp", "0.94", "--c-lp", "0.06", "--chunk-size", "77"])
        .assert()
        .success();

    let (expected, _) =
        rec_filter::apply_bandpass(&signal, 0.94, 0.06, rec_filter::Continuation::Fresh)?;
    assert_eq!(to_f64(&std::fs::read(output.path())?), expected);
    Ok(())
}

#[test]
fn invalid_wav() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("rec-filter")?;
    let tmp = assert_fs::TempDir::new()?;
    let input = tmp.child("input.wav");
    let output = tmp.child("output.wav");
    input.write_binary(&vec![0u8; 480 * 10])?;

    cmd.arg(input.path()).arg(output.path()).arg("--c-hp").arg("0.9");
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("no RIFF tag found"));

    let input = tmp.child("input.raw");
    input.write_binary(&vec![0u8; 480 * 10])?;
    let mut cmd = Command::cargo_bin("rec-filter")?;
    cmd.arg("--wav-in")
        .arg(input.path())
        .arg(output.path())
        .arg("--c-hp")
        .arg("0.9");
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("no RIFF tag found"));

    Ok(())
}

#[test]
fn invalid_coefficient() -> anyhow::Result<()> {
    let tmp = assert_fs::TempDir::new()?;
    let input = tmp.child("input.raw");
    let output = tmp.child("output.raw");
    input.write_binary(&vec![0u8; 80])?;

    Command::cargo_bin("rec-filter")?
        .arg(input.path())
        .arg(output.path())
        .args(&["--c-hp", "1.5"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("outside the open interval"));

    Command::cargo_bin("rec-filter")?
        .arg(input.path())
        .arg(output.path())
        .args(&["--c-hp", "0.9", "--c-lp", "1"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("C_LP"));
    Ok(())
}

#[test]
fn truncated_raw_input() -> anyhow::Result<()> {
    let tmp = assert_fs::TempDir::new()?;
    let input = tmp.child("input.raw");
    let output = tmp.child("output.raw");
    input.write_binary(&[0u8; 12])?;

    Command::cargo_bin("rec-filter")?
        .arg(input.path())
        .arg(output.path())
        .args(&["--c-hp", "0.9"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("multiple of 8 bytes"));
    Ok(())
}

#[test]
fn state_files_continue_the_stream() -> anyhow::Result<()> {
    let tmp = assert_fs::TempDir::new()?;
    let signal = trace(2 * 1500);
    let (first, second) = signal.split_at(1100);

    let whole_in = tmp.child("whole.raw");
    let whole_out = tmp.child("whole.out.raw");
    whole_in.write_binary(&to_bytes(&signal))?;
    Command::cargo_bin("rec-filter")?
        .arg(whole_in.path())
        .arg(whole_out.path())
        .args(&["--channels", "2", "--c-hp", "0.95", "--c-lp", "0.2"])
        .assert()
        .success();

    let first_in = tmp.child("first.raw");
    let first_out = tmp.child("first.out.raw");
    let second_in = tmp.child("second.raw");
    let second_out = tmp.child("second.out.raw");
    let state = tmp.child("state.json");
    first_in.write_binary(&to_bytes(first))?;
    second_in.write_binary(&to_bytes(second))?;

    Command::cargo_bin("rec-filter")?
        .arg(first_in.path())
        .arg(first_out.path())
        .args(&["--channels", "2", "--c-hp", "0.95", "--c-lp", "0.2"])
        .arg("--state-out")
        .arg(state.path())
        .assert()
        .success();

    let states: Vec<rec_filter::FilterState> =
        serde_json::from_slice(&std::fs::read(state.path())?)?;
    assert_eq!(states.len(), 2);
    assert!(states.iter().all(|s| s.position() == 550));

    Command::cargo_bin("rec-filter")?
        .arg(second_in.path())
        .arg(second_out.path())
        .args(&["--channels", "2", "--c-hp", "0.95", "--c-lp", "0.2"])
        .arg("--state-in")
        .arg(state.path())
        .arg("--state-out")
        .arg(state.path())
        .assert()
        .success();

    let mut pieces = std::fs::read(first_out.path())?;
    pieces.extend(std::fs::read(second_out.path())?);
    assert_eq!(pieces, std::fs::read(whole_out.path())?);

    let states: Vec<rec_filter::FilterState> =
        serde_json::from_slice(&std::fs::read(state.path())?)?;
    assert!(states.iter().all(|s| s.position() == 1500));

    // A band-pass state cannot continue a high-pass stream.
    Command::cargo_bin("rec-filter")?
        .arg(second_in.path())
        .arg(second_out.path())
        .args(&["--channels", "2", "--c-hp", "0.95"])
        .arg("--state-in")
        .arg(state.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("cannot continue"));

    // Nor can a state file with the wrong number of channels.
    Command::cargo_bin("rec-filter")?
        .arg(second_in.path())
        .arg(second_out.path())
        .args(&["--c-hp", "0.95", "--c-lp", "0.2"])
        .arg("--state-in")
        .arg(state.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("2 channel states"));
    Ok(())
}

#[test]
fn wav_round_trip() -> anyhow::Result<()> {
    let tmp = assert_fs::TempDir::new()?;
    let input = tmp.child("input.wav");
    let output = tmp.child("output.wav");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 200,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let samples: Vec<i16> = (0..1000).map(|i| (500 + i) as i16).collect();
    let mut writer = hound::WavWriter::create(input.path(), spec)?;
    for &s in &samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;

    Command::cargo_bin("rec-filter")?
        .arg(input.path())
        .arg(output.path())
        .args(&["--c-hp", "0.9"])
        .assert()
        .success();

    let mut reader = hound::WavReader::open(output.path())?;
    assert_eq!(reader.spec().sample_rate, 200);
    assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
    let filtered: Vec<f32> = reader.samples::<f32>().collect::<Result<_, _>>()?;

    let signal: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
    let (expected, _) = rec_filter::apply_highpass(&signal, 0.9, rec_filter::Continuation::Fresh)?;
    assert_eq!(filtered.len(), expected.len());
    for (&y, &e) in filtered.iter().zip(&expected) {
        assert_eq!(y, e as f32);
    }
    Ok(())
}

#[test]
fn zero_chunk_size_is_rejected() -> anyhow::Result<()> {
    let tmp = assert_fs::TempDir::new()?;
    let input = tmp.child("input.raw");
    let output = tmp.child("output.raw");
    input.write_binary(&to_bytes(&trace(100)))?;

    Command::cargo_bin("rec-filter")?
        .arg(input.path())
        .arg(output.path())
        .args(&["--c-hp", "0.9", "--chunk-size", "0"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("--chunk-size must be at least 1"));
    Ok(())
}

#[test]
fn non_finite_state_is_not_saved() -> anyhow::Result<()> {
    let tmp = assert_fs::TempDir::new()?;
    let input = tmp.child("input.raw");
    let output = tmp.child("output.raw");
    let state = tmp.child("state.json");
    let mut signal = trace(200);
    // Second channel of an interleaved stereo recording.
    signal[51] = f64::NAN;
    input.write_binary(&to_bytes(&signal))?;

    Command::cargo_bin("rec-filter")?
        .arg(input.path())
        .arg(output.path())
        .args(&["--channels", "2", "--c-hp", "0.9"])
        .arg("--state-out")
        .arg(state.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("Channel 1 has a non-finite filter state"));
    assert!(!state.path().exists());
    Ok(())
}
