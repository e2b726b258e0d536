use clap::Parser;
use cssprune_lib::prune::{self, PruneOptions, DEFAULT_SUFFIX};
use std::path::PathBuf;

const CSSPRUNE_INTRO: &str = "cssprune - drops CSS selectors no element of the page uses";

#[derive(Parser)]
#[command(name = "cssprune")]
#[command(about = "Remove unused selectors from a stylesheet")]
struct Args {
    /// Stylesheet to prune.
    stylesheet: PathBuf,

    /// HTML document the stylesheet is applied to.
    markup: PathBuf,

    /// Output file name (default: stylesheet path plus suffix).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Suffix appended to the stylesheet path for the output file.
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    suffix: String,

    /// Print the pruned stylesheet instead of writing it.
    #[arg(long)]
    stdout: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // parse the args given in terminal
    let args: Args = Args::parse();
    let options = PruneOptions {
        stylesheet: args.stylesheet,
        markup: args.markup,
        output: args.output,
        suffix: args.suffix,
    };

    let report = match prune::run(&options) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    if args.stdout {
        print!("{}", report.output);
        return;
    }

    println!("{}", CSSPRUNE_INTRO);
    println!("css rules: {}", report.selectors);
    println!("unused rules: {}", report.unused);
    match prune::write_output(&options, &report) {
        Ok(path) => println!("written optimized css: {}", path.display()),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}
