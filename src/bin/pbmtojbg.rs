//! pbmtojbg - Portable Bitmap to JBIG converter.
//!
//! Creates a bi-level image entity (BIE) from a PBM file, or from a PGM file
//! whose bit planes are encoded one by one.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use thiserror::Error;

use jbig_rs::bitmap_header::ceil_half;
use jbig_rs::pnm::{PnmError, read_pnm};
use jbig_rs::{
    EncoderOptions, JbigEncoder, JbigError, LayerSelection, Options, Order, PlaneCoding,
};

/// PBM to JBIG converter
#[derive(Parser)]
#[command(name = "pbmtojbg")]
#[command(version)]
#[command(about = "Creates a bi-level image entity (BIE) as output file", long_about = None)]
#[command(disable_help_flag = true)]
struct Cli {
    /// Sequential coding, no differential layers (like -d 0)
    #[arg(short = 'q')]
    sequential: bool,

    /// Maximum width of lowest resolution layer
    #[arg(short = 'x', value_name = "number", default_value_t = 640)]
    lowest_width: u32,

    /// Maximum height of lowest resolution layer
    #[arg(short = 'y', value_name = "number", default_value_t = 480)]
    lowest_height: u32,

    /// Lowest layer written to output file
    #[arg(short = 'l', value_name = "number")]
    lowest_layer: Option<u8>,

    /// Highest layer written to output file
    #[arg(short = 'h', value_name = "number")]
    highest_layer: Option<u8>,

    /// Use binary code for multiple bitplanes (default: Gray code)
    #[arg(short = 'b')]
    binary: bool,

    /// Total number of differential layers (overrides -x and -y)
    #[arg(short = 'd', value_name = "number")]
    layers: Option<u8>,

    /// Height of a stripe in layer 0
    #[arg(short = 's', value_name = "number")]
    stripe_height: Option<u32>,

    /// Maximum adaptive template pixel horizontal offset
    #[arg(short = 'm', value_name = "number", default_value_t = 8)]
    max_at_offset: u8,

    /// Encode only that many most significant planes
    #[arg(short = 't', value_name = "number")]
    encode_planes: Option<u8>,

    /// Order byte value: add 1=SMID, 2=ILEAVE, 4=SEQ, 8=HITOLO
    #[arg(short = 'o', value_name = "number", default_value_t = 3)]
    order: u8,

    /// Options byte value: add DPON=4, TPBON=8, TPDON=16, LRLTWO=64
    #[arg(short = 'p', value_name = "number", default_value_t = 28)]
    options: u8,

    /// Announce in header initially this larger image height
    #[arg(short = 'Y', value_name = "number")]
    announced_height: Option<u32>,

    /// Verbose output
    #[arg(short = 'v')]
    verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Input file, `-` or nothing for standard input
    input: Option<String>,

    /// Output file, standard output when omitted
    output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct DriverConfig {
    program: String,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    coding: PlaneCoding,
    encode_planes: Option<u8>,
    verbose: bool,
    options: EncoderOptions,
}

impl DriverConfig {
    fn new(program: String, cli: Cli) -> Self {
        let layers = match (cli.sequential, cli.layers) {
            (true, _) => LayerSelection::Count(0),
            (false, Some(d)) => LayerSelection::Count(d),
            (false, None) => LayerSelection::LowestLayerMax {
                width: cli.lowest_width,
                height: cli.lowest_height,
            },
        };
        let options = EncoderOptions {
            order: Order::from_bits_retain(cli.order),
            options: Options::from_bits_retain(cli.options),
            l0: cli.stripe_height.filter(|&l0| l0 > 0),
            mx: cli.max_at_offset,
            layers,
            lowest_layer: cli.lowest_layer,
            highest_layer: cli.highest_layer,
            announced_height: cli.announced_height.filter(|&yd| yd > 0),
            ..EncoderOptions::default()
        };
        Self {
            program,
            input: cli.input.filter(|name| name != "-").map(PathBuf::from),
            output: cli.output,
            coding: if cli.binary {
                PlaneCoding::Binary
            } else {
                PlaneCoding::Gray
            },
            encode_planes: cli.encode_planes,
            verbose: cli.verbose,
            options,
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
    #[error("Problem while reading input file '{name}': {source}")]
    Read { name: String, source: io::Error },
    #[error("Input file '{name}' does not look like a PBM file!")]
    NotPnm { name: String },
    #[error("Unsupported PBM type P{0}!")]
    UnsupportedType(char),
    #[error("Unexpected end of input file '{name}'!")]
    UnexpectedEof { name: String },
    #[error("Problem with input file '{name}': {source}")]
    Format { name: String, source: PnmError },
    #[error("Can't encode '{name}': {source}")]
    Encode { name: String, source: JbigError },
    #[error("Problem while writing output file '{name}': {source}")]
    Write { name: String, source: io::Error },
}

fn read_input(config: &DriverConfig) -> Result<Vec<u8>, DriverError> {
    let read_error = |source| DriverError::Read {
        name: config.input_name(),
        source,
    };
    let mut data = Vec::new();
    match &config.input {
        None => {
            io::stdin().lock().read_to_end(&mut data).map_err(read_error)?;
        }
        Some(path) => {
            let mut file = File::open(path).map_err(|source| DriverError::OpenInput {
                name: config.input_name(),
                source,
            })?;
            file.read_to_end(&mut data).map_err(read_error)?;
        }
    }
    Ok(data)
}

fn build_encoder(config: &DriverConfig, data: &[u8]) -> Result<JbigEncoder, DriverError> {
    let image = read_pnm(data).map_err(|e| match e {
        PnmError::NotPnm => DriverError::NotPnm {
            name: config.input_name(),
        },
        PnmError::UnsupportedType(kind) => DriverError::UnsupportedType(kind),
        PnmError::UnexpectedEof => DriverError::UnexpectedEof {
            name: config.input_name(),
        },
        source => DriverError::Format {
            name: config.input_name(),
            source,
        },
    })?;
    let encode_error = |source| DriverError::Encode {
        name: config.input_name(),
        source,
    };

    let (width, height) = (image.width(), image.height());
    let bits = image.bits();
    let count = config
        .encode_planes
        .filter(|&count| count > 0 && count <= bits)
        .unwrap_or(bits);
    let planes = image
        .into_planes(count, config.coding)
        .map_err(encode_error)?;
    JbigEncoder::new(width, height, planes, config.options.clone()).map_err(encode_error)
}

fn flags<const N: usize>(bits: u8, names: [(u8, &str); N]) -> String {
    names
        .iter()
        .filter(|(bit, _)| bits & bit != 0)
        .map(|(_, name)| format!(" {name}"))
        .collect()
}

fn print_summary(
    config: &DriverConfig,
    encoder: &JbigEncoder,
    total_length: usize,
) -> Result<(), JbigError> {
    let (width, height) = (encoder.width(), encoder.height());
    let header = encoder.header()?;
    let d = encoder.differential_layers()?;
    let (dl, dh) = (header.dl, header.d);
    let lowest = (d - dl) as u32;
    let highest = (d - dh) as u32;

    eprintln!("Information about the created JBIG bi-level image entity (BIE):\n");
    eprintln!("              input image size: {width} x {height} pixel");
    eprintln!("                    bit planes: {}", header.planes);
    if header.planes > 1 {
        let code = match config.coding {
            PlaneCoding::Gray => "Gray",
            PlaneCoding::Binary => "binary",
        };
        eprintln!("                      encoding: {code} code, MSB first");
    }
    eprintln!("                       stripes: {}", header.stripes());
    eprintln!("   lines per stripe in layer 0: {}", header.l0);
    eprintln!("  total number of diff. layers: {d}");
    eprintln!("           lowest layer in BIE: {dl}");
    eprintln!("          highest layer in BIE: {dh}");
    eprintln!(
        "             lowest layer size: {} x {} pixel",
        ceil_half(width, lowest),
        ceil_half(height, lowest)
    );
    eprintln!(
        "            highest layer size: {} x {} pixel",
        ceil_half(width, highest),
        ceil_half(height, highest)
    );
    eprintln!(
        "                   option bits:{}",
        flags(
            header.options.bits(),
            [
                (Options::LRLTWO.bits(), "LRLTWO"),
                (Options::VLENGTH.bits(), "VLENGTH"),
                (Options::TPDON.bits(), "TPDON"),
                (Options::TPBON.bits(), "TPBON"),
                (Options::DPON.bits(), "DPON"),
                (Options::DPPRIV.bits(), "DPPRIV"),
                (Options::DPLAST.bits(), "DPLAST"),
            ]
        )
    );
    eprintln!(
        "                    order bits:{}",
        flags(
            header.order.bits(),
            [
                (Order::HITOLO.bits(), "HITOLO"),
                (Order::SEQ.bits(), "SEQ"),
                (Order::ILEAVE.bits(), "ILEAVE"),
                (Order::SMID.bits(), "SMID"),
            ]
        )
    );
    eprintln!("           AT maximum x-offset: {}", header.mx);
    eprintln!("           AT maximum y-offset: {}", header.my);
    eprintln!("         length of output file: {total_length} byte\n");
    Ok(())
}

fn run(config: &DriverConfig) -> Result<(), DriverError> {
    let data = read_input(config)?;
    let encoder = build_encoder(config, &data)?;
    let encode_error = |source| DriverError::Encode {
        name: config.input_name(),
        source,
    };
    let bie = encoder.encode_to_vec().map_err(encode_error)?;

    let write_error = |source| DriverError::Write {
        name: config.output_name(),
        source,
    };
    match &config.output {
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bie).map_err(write_error)?;
            stdout.flush().map_err(write_error)?;
        }
        Some(path) => {
            let file = File::create(path).map_err(|source| DriverError::OpenOutput {
                name: config.output_name(),
                source,
            })?;
            let mut writer = BufWriter::new(file);
            let written = writer.write_all(&bie).and_then(|()| writer.flush());
            if let Err(source) = written {
                drop(writer);
                let _ = fs::remove_file(path);
                return Err(write_error(source));
            }
        }
    }

    if config.verbose {
        print_summary(config, &encoder, bie.len()).map_err(encode_error)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    jbig_rs::logger::init();

    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "pbmtojbg".to_string());
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
