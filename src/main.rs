use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::{error, info};
use polysurrogate::{DEFAULT_MAX_TERMS, PolynomialModel, basis::Basis, io};

/// polynomial surrogate fitting for sampled scalar measurements
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Maximum number of monomials a basis may contain
    #[arg(long, global = true, env = "POLYSURROGATE_MAX_TERMS", default_value_t = DEFAULT_MAX_TERMS)]
    max_terms: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists the monomial exponents for a variable count and degree
    Basis {
        /// Number of input variables
        #[arg(short = 'n', long)]
        nvars: usize,

        /// Maximum total degree
        #[arg(short = 'p', long, default_value_t = 3)]
        degree: u32,
    },

    /// Fits a model to a sample table whose last column is the label
    Fit {
        /// Sample table (CSV)
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Maximum total degree
        #[arg(short = 'p', long, default_value_t = 3)]
        degree: u32,

        /// Where to write the fitted model
        #[arg(short = 'o', long, default_value = "model.json")]
        output: PathBuf,
    },

    /// Evaluates a fitted model on query tables
    Predict {
        /// Fitted model file
        #[arg(short = 'm', long)]
        model: PathBuf,

        #[command(flatten)]
        input: Input,

        /// Output file suffix
        #[arg(long, default_value = "predicted")]
        output_suffix: String,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
    /// Path of the query table(s)
    #[arg(short = 'f', long, value_delimiter = ' ', num_args = 1..)]
    file: Option<Vec<String>>,

    /// Directory of query tables
    #[arg(short = 'd', long)]
    dir: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    match &args.command {
        Command::Basis { nvars, degree } => print_basis(*nvars, *degree, args.max_terms)?,
        Command::Fit {
            file,
            degree,
            output,
        } => fit_file(file, *degree, output, args.max_terms)?,
        Command::Predict {
            model,
            input,
            output_suffix,
        } => {
            let model = io::load_model(model, args.max_terms)?;
            let files = query_files(input)?;

            files.into_iter().for_each(|file| {
                if let Err(e) = predict_file(&model, &file, output_suffix) {
                    error!("Unable to evaluate file {}: {}", file, e);
                }
            });
        }
    }

    Ok(())
}

fn print_basis(nvars: usize, degree: u32, max_terms: usize) -> polysurrogate::Result<()> {
    let basis = Basis::new(nvars, degree, max_terms)?;
    println!("{} terms", basis.len());
    for (i, exponents) in basis.iter().enumerate() {
        let exponents: Vec<String> = exponents.iter().map(|e| e.to_string()).collect();
        println!("{}\t({})", i, exponents.join(", "));
    }
    Ok(())
}

fn fit_file(
    file: &Path,
    degree: u32,
    output: &Path,
    max_terms: usize,
) -> polysurrogate::Result<()> {
    info!("Fitting {}...", file.display());

    let (samples, labels) = io::read_samples(file)?;
    let mut model = PolynomialModel::with_max_terms(samples.ncols(), degree, max_terms)?;
    let report = model.fit(&samples, &labels)?;

    println!(
        "samples {}\nterms {}\nrank {}\nrms error {:.6e}\nmax abs error {:.6e}\nr2 {:.9}",
        report.samples,
        report.terms,
        report.rank,
        report.rms_error,
        report.max_abs_error,
        report.r_squared
    );

    io::save_model(output, &model)
}

fn query_files(input: &Input) -> std::io::Result<Vec<String>> {
    if let Some(files) = &input.file {
        Ok(files.clone())
    } else if let Some(dir) = &input.dir {
        Ok(io::read_dir_tables(dir)?
            .iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect())
    } else {
        Ok(vec![])
    }
}

fn predict_file(
    model: &PolynomialModel,
    file: &str,
    output_suffix: &str,
) -> polysurrogate::Result<()> {
    info!("Evaluating {}...", file);

    let queries = io::read_table(file)?;
    let predictions = model.evaluate(&queries)?;
    io::save_predictions(file, output_suffix, &predictions)?;

    Ok(())
}
