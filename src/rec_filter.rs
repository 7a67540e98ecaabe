use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Error};
use clap::{arg, crate_version, Command};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};

use rec_filter::{Bandpass, Design, FilterState, Highpass, RecursiveFilter};

const DEFAULT_CHUNK_SIZE: usize = 4096;

trait ReadFrame {
    fn next_frame(&mut self) -> Result<Option<&[f64]>, Error>;
    fn channels(&self) -> usize;
}

// Raw input is interleaved little-endian f64.
struct RawSampleIter<R: Read> {
    reader: R,
}

struct IterReadFrame<I> {
    samples: I,
    buf: Vec<f64>,
}

impl<I: Iterator<Item = Result<f64, Error>>> IterReadFrame<I> {
    fn new(iter: I, channels: usize) -> IterReadFrame<I> {
        IterReadFrame {
            samples: iter,
            buf: vec![0.0; channels],
        }
    }
}

impl<R: Read> Iterator for RawSampleIter<R> {
    type Item = Result<f64, Error>;

    fn next(&mut self) -> Option<Result<f64, Error>> {
        let mut bytes = [0u8; 8];
        let mut filled = 0;
        while filled < bytes.len() {
            match self.reader.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
        match filled {
            0 => None,
            8 => Some(Ok(f64::from_le_bytes(bytes))),
            _ => Some(Err(anyhow!(
                "Unexpected end of input (expected a multiple of 8 bytes)"
            ))),
        }
    }
}

impl<I: Iterator<Item = Result<f64, Error>>> ReadFrame for IterReadFrame<I> {
    fn next_frame(&mut self) -> Result<Option<&[f64]>, Error> {
        for (i, sample) in self.buf.iter_mut().enumerate() {
            match self.samples.next() {
                None => {
                    if i == 0 {
                        return Ok(None);
                    } else {
                        return Err(anyhow!(
                            "Unexpected end of input (expected a multiple of {} samples)",
                            self.buf.len()
                        ));
                    }
                }
                Some(Err(e)) => return Err(e),
                Some(Ok(x)) => *sample = x,
            }
        }
        Ok(Some(&self.buf[..]))
    }

    fn channels(&self) -> usize {
        self.buf.len()
    }
}

trait FrameWriter {
    fn write_frames(&mut self, buf: &[f64]) -> Result<(), Error>;
    fn finalize(&mut self) -> Result<(), Error>;
}

struct RawFrameWriter<W: Write> {
    writer: W,
}

struct WavFrameWriter<W: Write + Seek> {
    // Only `None` once finalized.
    writer: Option<WavWriter<W>>,
}

impl<W: Write> FrameWriter for RawFrameWriter<W> {
    fn write_frames(&mut self, buf: &[f64]) -> Result<(), Error> {
        for x in buf {
            self.writer.write_all(&x.to_le_bytes())?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Seek> FrameWriter for WavFrameWriter<W> {
    fn write_frames(&mut self, buf: &[f64]) -> Result<(), Error> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| anyhow!("WAV output already finalized"))?;
        for &x in buf {
            writer.write_sample(x as f32)?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), Error> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }
}

fn raw_frames<R: Read + 'static>(r: R, channels: usize) -> Box<dyn ReadFrame> {
    Box::new(IterReadFrame::new(RawSampleIter { reader: r }, channels))
}

// Integer samples keep their raw counts; no rescaling to [-1, 1].
fn wav_frames<R: Read + 'static>(wav: WavReader<R>) -> Box<dyn ReadFrame> {
    let channels = wav.spec().channels as usize;
    match wav.spec().sample_format {
        SampleFormat::Int => {
            let iter = wav
                .into_samples::<i32>()
                .map(|s| s.map(f64::from).map_err(|e| e.into()));
            Box::new(IterReadFrame::new(iter, channels))
        }
        SampleFormat::Float => {
            let iter = wav
                .into_samples::<f32>()
                .map(|s| s.map(f64::from).map_err(|e| e.into()));
            Box::new(IterReadFrame::new(iter, channels))
        }
    }
}

fn load_states(path: &str, design: Design, channels: usize) -> Result<Vec<RecursiveFilter>, Error> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open state file \"{}\"", path))?;
    let states: Vec<FilterState> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse state file \"{}\"", path))?;
    if states.len() != channels {
        bail!(
            "State file \"{}\" holds {} channel states but the input has {} channels",
            path,
            states.len(),
            channels
        );
    }
    let filters = states
        .into_iter()
        .map(|state| RecursiveFilter::resume(design, state))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Cannot continue from state file \"{}\"", path))?;
    for (ch, filter) in filters.iter().enumerate() {
        info!(
            "channel {}: continuing stream {} at sample {}",
            ch,
            filter.stream(),
            filter.position()
        );
    }
    Ok(filters)
}

fn save_states(path: &str, filters: Vec<RecursiveFilter>) -> Result<(), Error> {
    let states: Vec<FilterState> = filters.into_iter().map(RecursiveFilter::into_state).collect();
    // JSON has no NaN or infinity, so such a state could not be loaded back.
    if let Some(ch) = states.iter().position(|state| !state.is_finite()) {
        bail!(
            "Channel {} has a non-finite filter state (NaN or infinite input?); not saving \"{}\"",
            ch,
            path
        );
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to open state file \"{}\"", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &states)?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches =
        Command::new("rec-filter")
            .version(crate_version!())
            .about("Apply a recursive high-pass or band-pass filter to a recording")
            .arg(arg!(<INPUT> "input file"))
            .arg(arg!(<OUTPUT> "output file"))
            .arg(arg!(--"c-hp" <C_HP> "high-pass coefficient, strictly between 0 and 1")
                    .validator(|s| s.parse::<f32>()),
            )
            .arg(arg!(--"c-lp" <C_LP> "low-pass coefficient; if given, the filter is a band-pass").required(false)
                    .validator(|s| s.parse::<f32>()),
            )
            .arg(arg!(--"wav-in" "the input is a wav file (default is to detect wav files by their filename)"))
            .arg(arg!(--"wav-out" "the output is a wav file (default is to detect wav files by their filename)"))
            .arg(
                arg!(--channels <CHANNELS> "for raw input, the number of interleaved channels (defaults to 1)")
                    .required(false)
                    .validator(|s| s.parse::<u16>()),
            )
            .arg(
                arg!(--"sample-rate" <RATE> "for raw input, the sample rate written to a wav output (defaults to 100Hz)")
                    .required(false)
                    .validator(|s| s.parse::<u32>()),
            )
            .arg(
                arg!(--"chunk-size" <FRAMES> "number of frames filtered per call (defaults to 4096)")
                    .required(false)
                    .validator(|s| s.parse::<usize>()),
            )
            .arg(arg!(--"state-in" <PATH> "continue the streams saved in this state file").required(false))
            .arg(arg!(--"state-out" <PATH> "save the stream states to this file").required(false))
            .get_matches();

    let in_name = matches
        .value_of("INPUT")
        .ok_or_else(|| anyhow!("missing INPUT"))?;
    let out_name = matches
        .value_of("OUTPUT")
        .ok_or_else(|| anyhow!("missing OUTPUT"))?;

    let c_hp: f32 = matches.value_of_t("c-hp")?;
    let design = if matches.is_present("c-lp") {
        let c_lp: f32 = matches.value_of_t("c-lp")?;
        Design::from(Bandpass::new(c_hp, c_lp)?)
    } else {
        Design::from(Highpass::new(c_hp)?)
    };
    let chunk_size: usize = matches
        .value_of_t("chunk-size")
        .unwrap_or(DEFAULT_CHUNK_SIZE);
    if chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }

    let in_file = BufReader::new(
        File::open(in_name)
            .with_context(|| format!("Failed to open input file \"{}\"", in_name))?,
    );
    let in_wav =
        matches.is_present("wav-in") || Path::new(in_name).extension() == Some("wav".as_ref());
    let out_wav =
        matches.is_present("wav-out") || Path::new(out_name).extension() == Some("wav".as_ref());

    let (mut frames, sample_rate) = if in_wav {
        let wav_reader = WavReader::new(in_file)?;
        let sample_rate = wav_reader.spec().sample_rate;
        (wav_frames(wav_reader), sample_rate)
    } else {
        let channels: u16 = matches.value_of_t("channels").unwrap_or(1);
        if channels == 0 {
            bail!("--channels must be at least 1");
        }
        let sample_rate: u32 = matches.value_of_t("sample-rate").unwrap_or(100);
        (raw_frames(in_file, channels as usize), sample_rate)
    };
    let channels = frames.channels();

    let mut filters = match matches.value_of("state-in") {
        Some(path) => load_states(path, design, channels)?,
        None => (0..channels).map(|_| RecursiveFilter::new(design)).collect(),
    };

    let out_file = BufWriter::new(
        File::create(out_name)
            .with_context(|| format!("Failed to open output file \"{}\"", out_name))?,
    );
    let mut frame_writer: Box<dyn FrameWriter> = if out_wav {
        let spec = WavSpec {
            channels: channels as u16,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let writer = WavWriter::new(out_file, spec)?;
        Box::new(WavFrameWriter {
            writer: Some(writer),
        })
    } else {
        Box::new(RawFrameWriter { writer: out_file })
    };

    let mut in_bufs = vec![vec![0.0; chunk_size]; channels];
    let mut out_bufs = vec![vec![0.0; chunk_size]; channels];
    let mut out_buf = vec![0.0; chunk_size * channels];
    loop {
        let mut len = 0;
        while len < chunk_size {
            match frames.next_frame()? {
                Some(buf) => {
                    for j in 0..channels {
                        in_bufs[j][len] = buf[j];
                    }
                    len += 1;
                }
                None => break,
            }
        }
        if len == 0 {
            break;
        }

        for j in 0..channels {
            filters[j].process(&mut out_bufs[j][..len], &in_bufs[j][..len])?;
        }
        for i in 0..len {
            for j in 0..channels {
                out_buf[i * channels + j] = out_bufs[j][i];
            }
        }
        frame_writer.write_frames(&out_buf[..len * channels])?;
        debug!("wrote {} frames", len);

        if len < chunk_size {
            break;
        }
    }
    frame_writer.finalize()?;

    if let Some(path) = matches.value_of("state-out") {
        save_states(path, filters)?;
    }

    Ok(())
}
