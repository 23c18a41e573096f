use clap::{Parser, Subcommand, ValueEnum};
use hub_spoke_network::build_stacks;
use hub_spoke_network::config::NetworkConfig;
use hub_spoke_network::models::Unit;
use hub_spoke_network::output::{print_plan, subnet_print, write_stack};
use hub_spoke_network::processing::apply_waves;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hub-spoke-network")]
#[command(about = "Synthesize the hub/spoke network stacks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Shared config file (default: $HUB_SPOKE_CONFIG or ./config.json)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Saved describe-availability-zones output to use instead of the AWS CLI
    #[arg(long, global = true)]
    zones_file: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and write stack documents
    Synth {
        #[arg(value_enum, default_value_t = Target::All)]
        target: Target,

        /// Directory for the <stack>.json files
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,
    },

    /// Show the apply waves of each stack
    Plan {
        #[arg(value_enum, default_value_t = Target::All)]
        target: Target,
    },

    /// Print the subnet layout as CSV
    Subnets {
        #[arg(value_enum, default_value_t = Target::All)]
        target: Target,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Target {
    Hub,
    Spoke,
    Dns,
    All,
}

impl Target {
    fn units(self) -> Vec<Unit> {
        match self {
            Target::Hub => vec![Unit::Hub],
            Target::Spoke => vec![Unit::Spoke],
            Target::Dns => vec![Unit::Dns],
            Target::All => vec![Unit::Hub, Unit::Spoke, Unit::Dns],
        }
    }
}

fn main() {
    // Do as little as possible in main.rs as it can't contain any tests
    if let Err(e) = log4rs::init_file("log4rs.yml", Default::default()) {
        eprintln!("Error initializing log4rs from log4rs.yml: {e}");
    }
    dotenv::dotenv().ok();
    log::info!("#Start main()");

    if let Err(e) = run(Cli::parse()) {
        log::error!("{e}");
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = NetworkConfig::load(cli.config.as_deref())?;
    let zones_file = cli.zones_file.as_deref();

    match cli.command {
        Commands::Synth { target, out_dir } => {
            for stack in build_stacks(&target.units(), &config, zones_file)? {
                let path = write_stack(&stack, &out_dir)?;
                println!("{stack} -> {}", path.display());
            }
        }
        Commands::Plan { target } => {
            for stack in build_stacks(&target.units(), &config, zones_file)? {
                let waves = apply_waves(&stack)?;
                print_plan(&stack, &waves)?;
            }
        }
        Commands::Subnets { target } => {
            for stack in build_stacks(&target.units(), &config, zones_file)? {
                subnet_print(&stack)?;
            }
        }
    }
    Ok(())
}
