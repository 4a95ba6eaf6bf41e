//! jbgtopbm - JBIG to Portable Bitmap converter.
//!
//! Reads a bi-level image entity (BIE) and writes a PBM file, or a PGM file
//! when the image has several bit planes.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::debug;
use thiserror::Error;

use jbig_rs::constants::{BIH_SIZE, DRIVER_READ_CHUNK, MAXIMUM_MERGE_PLANES};
use jbig_rs::diagnose::diagnose_bie;
use jbig_rs::marker_scanner::apply_newlen;
use jbig_rs::pnm::{write_pbm_header, write_pgm_header};
use jbig_rs::{DecodeStatus, JbigDecoder, JbigError, Options, PlaneCoding, merge_planes};

/// JBIG to PBM converter
#[derive(Parser)]
#[command(name = "jbgtopbm")]
#[command(version)]
#[command(about = "Reads a bi-level image entity (BIE) as input file", long_about = None)]
struct Cli {
    /// If possible decode only up to a resolution layer not wider than this
    #[arg(short = 'x', value_name = "number")]
    max_width: Option<u32>,

    /// If possible decode only up to a resolution layer not higher than this
    #[arg(short = 'y', value_name = "number")]
    max_height: Option<u32>,

    /// Decode a progressive sequence of multiple concatenated BIEs
    #[arg(short = 'm')]
    multi: bool,

    /// Use binary code for multiple bit planes (default: Gray code)
    #[arg(short = 'b')]
    binary: bool,

    /// Diagnose single BIE, print header, list marker sequences
    #[arg(short = 'd')]
    diagnose: bool,

    /// Decode only one single bit plane (0 = first plane)
    #[arg(short = 'p', value_name = "number")]
    plane: Option<u32>,

    /// Input file, `-` or nothing for standard input
    input: Option<String>,

    /// Output file, standard output when omitted
    output: Option<PathBuf>,
}

/// Settings of one converter run.
#[derive(Debug, Clone)]
struct DriverConfig {
    program: String,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    max_width: u32,
    max_height: u32,
    multi: bool,
    coding: PlaneCoding,
    diagnose: bool,
    plane: Option<u32>,
}

impl DriverConfig {
    fn new(program: String, cli: Cli) -> Self {
        Self {
            program,
            input: cli.input.filter(|name| name != "-").map(PathBuf::from),
            output: cli.output,
            max_width: cli.max_width.unwrap_or(u32::MAX),
            max_height: cli.max_height.unwrap_or(u32::MAX),
            multi: cli.multi,
            coding: if cli.binary {
                PlaneCoding::Binary
            } else {
                PlaneCoding::Gray
            },
            diagnose: cli.diagnose,
            plane: cli.plane,
        }
    }

    fn input_name(&self) -> String {
        self.input
            .as_ref()
            .map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string())
    }

    fn output_name(&self) -> String {
        self.output
            .as_ref()
            .map_or_else(|| "<stdout>".to_string(), |path| path.display().to_string())
    }
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("Can't open input file '{name}': {source}")]
    OpenInput { name: String, source: io::Error },
    #[error("Can't open output file '{name}': {source}")]
    OpenOutput { name: String, source: io::Error },
    #[error("Input file '{name}' ({len} bytes) must be at least 20 bytes long")]
    ShortInput { name: String, len: usize },
    #[error("Problem while reading input file '{name}': {source}")]
    Read { name: String, source: io::Error },
    #[error("Problem with input file '{name}': {source}")]
    Decode { name: String, source: JbigError },
    #[error("Image has only {0} planes!")]
    PlaneOutOfRange(u8),
    #[error("Image has too many planes ({0})!")]
    TooManyPlanes(u8),
    #[error("Problem while writing output file '{name}': {source}")]
    Write { name: String, source: io::Error },
}

/// Output target; a file is removed again when the run fails.
enum Output {
    Stdout(BufWriter<io::Stdout>),
    File { path: PathBuf, writer: BufWriter<File> },
}

impl Output {
    fn create(config: &DriverConfig) -> Result<Self, DriverError> {
        match &config.output {
            None => Ok(Self::Stdout(BufWriter::new(io::stdout()))),
            Some(path) => {
                let file = File::create(path).map_err(|source| DriverError::OpenOutput {
                    name: config.output_name(),
                    source,
                })?;
                Ok(Self::File {
                    path: path.clone(),
                    writer: BufWriter::new(file),
                })
            }
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(writer) => writer,
            Self::File { writer, .. } => writer,
        }
    }

    fn discard(self) {
        if let Self::File { path, writer } = self {
            drop(writer);
            if fs::remove_file(&path).is_ok() {
                debug!("removed partial output file {}", path.display());
            }
        }
    }
}

/// Reads until `buffer` is full or the input ends.
fn read_up_to(input: &mut dyn Read, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match input.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn wants_more(status: DecodeStatus, multi: bool) -> bool {
    status == DecodeStatus::NeedMoreData || (status == DecodeStatus::Complete && multi)
}

/// Feeds `data` while the decoder asks for more.
fn feed_all(
    decoder: &mut JbigDecoder,
    mut data: &[u8],
    status: &mut DecodeStatus,
    multi: bool,
) -> Result<(), JbigError> {
    while !data.is_empty() && wants_more(*status, multi) {
        let (used, next) = decoder.feed(data)?;
        data = &data[used..];
        *status = next;
    }
    Ok(())
}

fn decode(config: &DriverConfig, input: &mut dyn Read) -> Result<JbigDecoder, DriverError> {
    let read_error = |source| DriverError::Read {
        name: config.input_name(),
        source,
    };
    let decode_error = |source| DriverError::Decode {
        name: config.input_name(),
        source,
    };

    let mut decoder = JbigDecoder::new();
    decoder.set_max_size(config.max_width, config.max_height);

    let mut buffer = vec![0u8; DRIVER_READ_CHUNK];
    let len = read_up_to(input, &mut buffer[..BIH_SIZE]).map_err(read_error)?;
    if len < BIH_SIZE {
        return Err(DriverError::ShortInput {
            name: config.input_name(),
            len,
        });
    }

    let mut status = DecodeStatus::NeedMoreData;
    if buffer[BIH_SIZE - 1] & Options::VLENGTH.bits() != 0 {
        // NEWLEN may follow anywhere, so the whole input is needed first.
        let mut bie = buffer[..BIH_SIZE].to_vec();
        input.read_to_end(&mut bie).map_err(read_error)?;
        debug!("VLENGTH set, read {} bytes", bie.len());
        apply_newlen(&mut bie).map_err(decode_error)?;
        feed_all(&mut decoder, &bie, &mut status, config.multi).map_err(decode_error)?;
    } else {
        let mut len = len;
        loop {
            feed_all(&mut decoder, &buffer[..len], &mut status, config.multi)
                .map_err(decode_error)?;
            if !wants_more(status, config.multi) {
                break;
            }
            len = read_up_to(input, &mut buffer).map_err(read_error)?;
            if len == 0 {
                break;
            }
        }
    }

    match status {
        DecodeStatus::Complete if config.multi => {
            // All input went to the decoder, so it must not stop inside a marker.
            decoder.finish().map_err(decode_error)?;
            Ok(decoder)
        }
        DecodeStatus::Complete | DecodeStatus::Interrupted => Ok(decoder),
        DecodeStatus::NeedMoreData => Err(decode_error(JbigError::NeedMoreData)),
    }
}

fn write_image(
    config: &DriverConfig,
    decoder: JbigDecoder,
    output: &mut dyn Write,
) -> Result<(), DriverError> {
    let write_error = |source| DriverError::Write {
        name: config.output_name(),
        source,
    };
    let decode_error = |source| DriverError::Decode {
        name: config.input_name(),
        source,
    };

    let planes = decoder.planes();
    if let Some(plane) = config.plane
        && plane >= planes as u32
    {
        return Err(DriverError::PlaneOutOfRange(planes));
    }

    let (width, height) = (decoder.width(), decoder.height());
    if planes == 1 || config.plane.is_some() {
        let plane = config.plane.unwrap_or(0) as u8;
        let bitmap = decoder.plane_bitmap(plane).map_err(decode_error)?;
        write_pbm_header(output, width, height).map_err(write_error)?;
        output.write_all(bitmap.as_bytes()).map_err(write_error)?;
    } else {
        if planes > MAXIMUM_MERGE_PLANES {
            return Err(DriverError::TooManyPlanes(planes));
        }
        let maxval = (1u64 << planes) - 1;
        write_pgm_header(output, width, height, maxval).map_err(write_error)?;
        let image = decoder.into_image().map_err(decode_error)?;
        merge_planes(&image, config.coding, output)
            .map_err(|e| write_error(io::Error::other(e)))?;
    }
    output.flush().map_err(write_error)
}

fn open_input(config: &DriverConfig) -> Result<Box<dyn Read>, DriverError> {
    match &config.input {
        None => Ok(Box::new(io::stdin())),
        Some(path) => {
            let file = File::open(path).map_err(|source| DriverError::OpenInput {
                name: config.input_name(),
                source,
            })?;
            Ok(Box::new(file))
        }
    }
}

fn run(config: &DriverConfig) -> Result<(), DriverError> {
    let mut input = open_input(config)?;

    if config.diagnose {
        let mut bie = Vec::new();
        input
            .read_to_end(&mut bie)
            .map_err(|source| DriverError::Read {
                name: config.input_name(),
                source,
            })?;
        let mut stdout = io::stdout().lock();
        return diagnose_bie(&bie, &mut stdout).map_err(|source| DriverError::Write {
            name: config.output_name(),
            source,
        });
    }

    let mut output = Output::create(config)?;
    let result = decode(config, &mut *input)
        .and_then(|decoder| write_image(config, decoder, output.writer()));
    if result.is_err() {
        output.discard();
    }
    result
}

fn main() -> ExitCode {
    jbig_rs::logger::init();

    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "jbgtopbm".to_string());
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    let config = DriverConfig::new(program, cli);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", config.program, e);
            ExitCode::FAILURE
        }
    }
}
