use clap::Parser;
use serde_json::Value;
use slateq::{index, logging, request, snapshot};
use slateq::{Config, DateOrder, QueryRequest, Response, Result};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "slateq",
    about = "Query cached campus event and tour listings by date, audience, category, and flags"
)]
struct Cli {
    #[arg(long, env = "SLATEQ_SNAPSHOT", help = "Path to the cached JSON snapshot")]
    snapshot: Option<PathBuf>,

    #[arg(long, help = "Read the snapshot from stdin")]
    stdin: bool,

    #[arg(long, env = "SLATEQ_VERTICAL", default_value = "events")]
    vertical: String,

    #[arg(long, env = "SLATEQ_CONFIG", help = "YAML file with vertical field bindings")]
    config: Option<PathBuf>,

    #[arg(long, help = "Query description as a JSON object")]
    request: Option<String>,

    #[arg(long, help = "Two-digit month, e.g. 08")]
    month: Option<String>,

    #[arg(long, help = "Two-digit day, e.g. 05")]
    day: Option<String>,

    #[arg(long, help = "Four-digit year")]
    year: Option<String>,

    #[arg(long, help = "Audience flag field, e.g. TREvent or FYEvent")]
    audience: Option<String>,

    #[arg(long)]
    spotlight: bool,

    #[arg(long = "virtual")]
    virtual_only: bool,

    #[arg(long)]
    inperson: bool,

    #[arg(long)]
    category: Option<String>,

    #[arg(
        long,
        help = "Print the unfiltered grouped listings",
        conflicts_with_all = [
            "request", "month", "day", "year", "audience",
            "spotlight", "virtual_only", "inperson", "category",
        ]
    )]
    baseline: bool,

    #[arg(long, help = "Wrap output in a statusCode/headers/body envelope")]
    envelope: bool,

    #[arg(long, help = "Order dates by year, month, day instead of as strings")]
    chronological: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut vertical = config.vertical(&cli.vertical)?.clone();
    if cli.chronological {
        vertical = vertical.with_date_order(DateOrder::Chronological);
    }

    let raw = if cli.stdin {
        snapshot::load_stdin()?
    } else {
        match &cli.snapshot {
            Some(path) => snapshot::load_file(path)?,
            None => {
                eprintln!("Error: No snapshot specified. Use --snapshot, --stdin or set SLATEQ_SNAPSHOT");
                return Ok(ExitCode::from(2));
            }
        }
    };

    let view = if cli.baseline {
        index::build(raw, &vertical)?
    } else {
        let query = build_request(cli)?;
        request::execute(raw, &vertical, &query)?
    };

    let output = if cli.envelope {
        serde_json::to_string_pretty(&Response::ok(&view))?
    } else {
        serde_json::to_string_pretty(&view)?
    };
    println!("{}", output);

    if view.is_empty() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::from(0))
    }
}

/// Flags win over fields of `--request`.
fn build_request(cli: &Cli) -> Result<QueryRequest> {
    let mut request = match &cli.request {
        Some(json) => QueryRequest::from_json(json)?,
        None => QueryRequest::default(),
    };

    let overrides = [
        (&cli.month, &mut request.month),
        (&cli.day, &mut request.day),
        (&cli.year, &mut request.year),
        (&cli.audience, &mut request.audience),
        (&cli.category, &mut request.category),
    ];
    for (flag, field) in overrides {
        if let Some(value) = flag {
            *field = Some(Value::String(value.clone()));
        }
    }

    let switches = [
        (cli.spotlight, &mut request.spotlight),
        (cli.virtual_only, &mut request.virtual_only),
        (cli.inperson, &mut request.inperson),
    ];
    for (on, field) in switches {
        if on {
            *field = Some(Value::Bool(true));
        }
    }

    Ok(request)
}
