use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bitdiet::{huffman, inspect, BlockPartitioner, Error, PartitionConfig, StreamFormat};
use clap::Parser;
use memmap2::Mmap;

#[derive(Parser, Debug)]
#[command(name = "bitdiet")]
#[command(about = "Block-parallel static Huffman compression")]
#[command(version)]
struct Args {
    /// Compress the input (default)
    #[arg(short, long, conflicts_with_all = ["decompress", "check"])]
    compress: bool,

    /// Decompress a plain or block-partitioned stream
    #[arg(short, long, conflicts_with = "check")]
    decompress: bool,

    /// Validate the stream headers and exit (0=valid, 1=not valid, 2=error)
    #[arg(long)]
    check: bool,

    /// Input file (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Output file (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Number of threads (0 = auto, 1 = single-threaded)
    #[arg(short = 't', long, default_value = "0")]
    threads: usize,

    /// Uncompressed bytes per block
    #[arg(long, default_value_t = bitdiet::partition::DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Emit a single non-partitioned Huffman stream
    #[arg(long, conflicts_with = "decompress")]
    plain: bool,

    /// Report sizes and timing on stderr
    #[arg(short = 'v', long)]
    info: bool,
}

const EXIT_OK: u8 = 0;
const EXIT_CODEC_ERROR: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(Error::Io(e)) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
        Err(e @ Error::InvalidConfig(_)) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            eprintln!("bitdiet error: {}", e);
            ExitCode::from(EXIT_CODEC_ERROR)
        }
    }
}

/// Input bytes, memory-mapped for regular files
enum Input {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Input {
    fn open(path: &Path) -> io::Result<Self> {
        if path.to_str() == Some("-") {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            return Ok(Input::Owned(buf));
        }

        let file = File::open(path)?;
        // Zero-length files cannot be mapped on every platform
        if file.metadata()?.len() == 0 {
            return Ok(Input::Owned(Vec::new()));
        }
        // SAFETY: the map is read-only and dropped before the process exits;
        // concurrent truncation of the input by another process is not supported.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Input::Mapped(map))
    }

    fn as_bytes(&self) -> &[u8] {
        match self {
            Input::Mapped(map) => &map[..],
            Input::Owned(buf) => &buf[..],
        }
    }
}

fn run() -> Result<u8, Error> {
    let args = Args::parse();

    let input = Input::open(&args.input)?;
    let data = input.as_bytes();

    if args.check {
        return Ok(run_check_mode(data));
    }

    let partitioner = BlockPartitioner::new(PartitionConfig {
        block_size: args.block_size,
        num_threads: args.threads,
    });

    let start = std::time::Instant::now();
    let (mode, output) = if args.decompress {
        ("decompress", partitioner.decompress(data)?)
    } else if args.plain {
        ("compress", huffman::encode(data)?)
    } else {
        ("compress", partitioner.compress(data)?)
    };
    let elapsed = start.elapsed();

    write_output(&args.output, &output)?;

    if args.info {
        eprintln!("{}", size_report(mode, data.len(), output.len()));
        eprintln!("  Time:             {:.2?}", elapsed);
        eprintln!(
            "  Throughput:       {:.1} MB/s",
            data.len() as f64 / elapsed.as_secs_f64() / 1_000_000.0
        );
    }

    Ok(EXIT_OK)
}

fn write_output(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut output: Box<dyn Write> = if path.to_str() == Some("-") {
        Box::new(io::stdout().lock())
    } else {
        Box::new(BufWriter::new(File::create(path)?))
    };
    output.write_all(bytes)?;
    output.flush()
}

fn size_report(mode: &str, input_len: usize, output_len: usize) -> String {
    let percent =
        if input_len == 0 { 0.0 } else { output_len as f64 * 100.0 / input_len as f64 };
    format!("{} {} -> {} ({:.1}%)", mode, input_len, output_len, percent)
}

fn run_check_mode(data: &[u8]) -> u8 {
    match inspect(data) {
        Ok(info) => {
            let format = match info.format {
                StreamFormat::Huffman => "huffman",
                StreamFormat::Bitdiet => "bitdiet",
            };
            eprintln!("Format: {}", format);
            eprintln!("Blocks: {}", info.block_count());
            if let Some(size) = info.total_original_len() {
                eprintln!("Uncompressed size: {} bytes", size);
            }
            EXIT_OK
        }
        Err(e) if e.is_corrupt_input() => {
            eprintln!("Not a valid stream: {}", e);
            EXIT_CODEC_ERROR
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    }
}
