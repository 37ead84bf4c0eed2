use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell as CompShell};
use diskmark::commands::bench::{handle_bench, BenchOptions};
use diskmark::BenchError;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "diskmark")]
#[command(version)]
#[command(about = "Directory-level disk benchmarks driven by fio")]
#[command(long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    bench: BenchArgs,
}

#[derive(Args)]
struct BenchArgs {
    /// Directory to benchmark
    #[arg(default_value = ".")]
    target: PathBuf,
    /// Size of the test file (e.g. 512m, 1G)
    #[arg(short = 's', long = "size")]
    size: Option<String>,
    /// Number of loops per sub-job
    #[arg(short = 'n', long = "number")]
    number: Option<u32>,
    /// Jobs as pattern,queue_depth,threads[,block_size] (e.g. "seq,8,1 rnd,32,16")
    #[arg(short = 'x', long = "jobs", num_args = 1.., value_delimiter = ' ')]
    jobs: Vec<String>,
    /// Add a mixed read/write sub-job with this read percentage
    #[arg(
        short = 'm',
        long = "mix",
        num_args = 0..=1,
        default_missing_value = "70",
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    mix: Option<u8>,
    /// Fill I/O buffers with zeroes instead of random data
    #[arg(short = '0', long = "zero-buffers")]
    zero_buffers: bool,
    /// Write the fio job file to FILE ('-' for stdout) and exit
    #[arg(short = 'f', long = "dump-config", value_name = "FILE")]
    dump_config: Option<String>,
    /// Hide IOPS and latency rows for random jobs
    #[arg(long = "no-extra-info")]
    no_extra_info: bool,
    /// fio executable to run
    #[arg(long = "engine", value_name = "PATH")]
    engine: Option<String>,
    /// Extra report formats (comma-separated: json, csv)
    #[arg(long = "report")]
    report: Option<String>,
    /// Enable debug logging
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions (internal)
    #[command(hide = true)]
    Completions {
        /// Shell: bash, zsh, fish
        shell: String,
    },
    /// Generate man page (internal)
    #[command(hide = true)]
    Man,
}

pub fn print_banner() {
    let banner = format!("diskmark v{}", env!("CARGO_PKG_VERSION"));

    if atty::is(atty::Stream::Stdout) {
        println!("{}", banner.cyan().bold());
    } else {
        println!("{}", banner);
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("diskmark=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("diskmark=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            let sh = match shell.as_str() {
                "bash" => CompShell::Bash,
                "zsh" => CompShell::Zsh,
                "fish" => CompShell::Fish,
                "powershell" | "pwsh" => CompShell::PowerShell,
                "elvish" => CompShell::Elvish,
                other => {
                    eprintln!(
                        "Unsupported shell: {} (use bash|zsh|fish|powershell|elvish)",
                        other
                    );
                    std::process::exit(2);
                }
            };
            generate(sh, &mut cmd, name, &mut std::io::stdout());
        }
        Some(Commands::Man) => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            man.render(&mut std::io::stdout())?;
        }
        None => {
            let args = cli.bench;
            init_logging(args.debug);

            // The job file may be going to stdout.
            if args.dump_config.is_none() {
                print_banner();
            }

            let result = handle_bench(BenchOptions {
                target: args.target,
                size: args.size,
                loops: args.number,
                jobs: args.jobs,
                mix: args.mix,
                zero_buffers: args.zero_buffers,
                dump_config: args.dump_config,
                extra_info: !args.no_extra_info,
                engine: args.engine,
                report: args.report,
            })
            .await;

            if let Err(e) = result {
                if matches!(e.downcast_ref::<BenchError>(), Some(BenchError::Interrupted)) {
                    eprintln!("{} Benchmark interrupted, test files removed", "✖".red());
                    std::process::exit(130);
                }
                return Err(e);
            }
        }
    }

    Ok(())
}
