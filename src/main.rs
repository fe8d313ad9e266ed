use clap::{Parser, Subcommand};
use datapak::archive::Archive;
use datapak::checksum::ChecksumAlgo;
use datapak::codec::CompMethod;
use datapak::io_stream::{ReaderOptions, WriterOptions};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dpk", version = "1.0.0", about = "The DataPak (.dpk) container format CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack one or more files into a .dpk archive
    Pack {
        #[arg(short, long)]
        output: PathBuf,
        /// Compression method: zstd (default), zlib, lz4, none
        #[arg(short, long, default_value = "zstd")]
        codec: String,
        #[arg(short, long, default_value = "3")]
        level: i32,
        /// Per-file checksum algorithm
        #[arg(long, default_value = "crc32")]
        checksum: String,
        /// Compress each file independently instead of as one joint stream,
        /// enabling random access at the cost of ratio
        #[arg(long)]
        per_file: bool,
        #[arg(num_args = 0..)]
        input: Vec<PathBuf>,
    },
    /// Unpack a .dpk archive
    Unpack {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// List archive contents
    List { input: PathBuf },
    /// Show archive metadata
    Info { input: PathBuf },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprint!("{e}");
            return ExitCode::from(1);
        }
    };
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Pack { output, codec, level, checksum, per_file, input } => {
            if input.is_empty() {
                return Err("no input files given".into());
            }
            let comp_method = CompMethod::from_name(&codec).ok_or_else(|| format!("unknown compression method '{codec}'"))?;
            let checksum_algo = ChecksumAlgo::from_name(&checksum).ok_or_else(|| format!("unknown checksum algorithm '{checksum}'"))?;

            let options = WriterOptions {
                comp_method,
                comp_level: level,
                checksum_type: checksum_algo,
                per_file_compression: per_file,
                ..WriterOptions::default()
            };
            let mut ar = Archive::create(&output, Vec::new(), options)?;
            for path in &input {
                let name = path.file_name().ok_or("input path has no file name")?.to_string_lossy().into_owned();
                ar.add_file(path, &name, Vec::new())?;
                println!("  packed  {}", path.display());
            }
            ar.finalize()?;
            let size = std::fs::metadata(&output)?.len();
            println!("Created: {}  ({size} B on disk)", output.display());
        }

        Commands::Unpack { input, output_dir } => {
            let mut ar = Archive::open(&input, ReaderOptions::default())?;
            ar.extract_all(&output_dir)?;
            println!("Unpacked to: {}", output_dir.display());
        }

        Commands::List { input } => {
            let ar = Archive::open(&input, ReaderOptions::default())?;
            println!("Archive: {}", input.display());
            println!("{:<32} {:>14} {:>14}  Checksum", "Name", "Size", "Compressed");
            for entry in ar.list() {
                let checksum = entry.checksum_hex.as_deref().unwrap_or("-");
                println!("{:<32} {:>14} {:>14}  {checksum}", entry.name, entry.uncomp_size, entry.comp_size);
            }
        }

        Commands::Info { input } => {
            let ar = Archive::open(&input, ReaderOptions::default())?;
            let file_size = std::fs::metadata(&input)?.len();
            let entries = ar.list();
            let header = ar.header()?;

            println!("── DataPak archive ──────────────────────────────────────");
            println!("  Path              {}", input.display());
            println!("  File size         {file_size} B");
            println!("  Compression       {}", header.comp_method()?.name());
            println!("  Checksum          {}", header.checksum_algo()?.name());
            println!("  Per-file comp.    {}", header.flags.per_file_comp);
            println!("  Random access     {}", ar.random_access()?);
            println!("  Files             {}", entries.len());
            println!("  Index size        {} B", header.index_size);
        }
    }

    Ok(())
}
