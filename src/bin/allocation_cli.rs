use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;

use alloy_primitives::utils::format_ether;
use alloy_primitives::U256;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use airdrop_allocation::allocation::bytes_to_hex;
use airdrop_allocation::config::Config;
use airdrop_allocation::whitelist::parse_amount;
use airdrop_allocation::{
    compare_export, parse_hash, verify_proof, AllocationExport, AllocationIndex, VestingState, Whitelist,
};

#[derive(Parser, Debug)]
#[command(name = "allocation-cli")]
#[command(about = "Airdrop allocation proofs and vesting state from a whitelist", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./allocation.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Whitelist file (.json or .csv), overrides `whitelist.path`
    #[arg(short, long, global = true)]
    whitelist: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the Merkle root of the whitelist
    Root,

    /// Write the root and a proof for every address as JSON
    Export {
        /// Output JSON file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty print JSON output
        #[arg(short, long, default_value_t = false)]
        pretty: bool,

        /// Expected root hash to compare against (with 0x prefix)
        #[arg(long)]
        compare_root: Option<String>,

        /// Reference JSON file to compare output against
        #[arg(long)]
        compare_json: Option<PathBuf>,
    },

    /// Show the allocation and proof for an address
    Allocation {
        address: String,
    },

    /// Check a proof against a root
    Verify {
        #[arg(long)]
        root: String,

        #[arg(long)]
        leaf: String,

        /// Sibling hash, repeat in proof order
        #[arg(long = "proof")]
        proof: Vec<String>,
    },

    /// Show vesting state for an address
    Vesting {
        address: String,

        /// Evaluate at this unix timestamp instead of now
        #[arg(long)]
        at: Option<u64>,

        /// Amount already claimed on chain, in base units
        #[arg(long)]
        claimed: Option<String>,
    },
}

fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|time| time.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

fn load_index(config: &Config, whitelist_override: Option<PathBuf>) -> Result<AllocationIndex> {
    let path = whitelist_override.unwrap_or_else(|| config.whitelist.path.clone());
    let whitelist = Whitelist::load(&path)
        .with_context(|| format!("Failed to load whitelist from {:?}", path))?;

    Ok(AllocationIndex::build(whitelist))
}

fn load_reference_json(path: &Path) -> Result<AllocationExport> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open reference JSON file: {:?}", path))?;

    let data: AllocationExport = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse reference JSON file: {:?}", path))?;

    Ok(data)
}

fn write_output(output: Option<&Path>, data: &AllocationExport, pretty: bool) -> Result<()> {
    let json_string = if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    };

    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            file.write_all(json_string.as_bytes())
                .with_context(|| format!("Failed to write to output file: {:?}", path))?;
            info!("Wrote {} allocations to {:?}", data.allocations.len(), path);
        }
        None => println!("{}", json_string),
    }

    Ok(())
}

fn run_export(
    index: &AllocationIndex,
    output: Option<PathBuf>,
    pretty: bool,
    compare_root: Option<String>,
    compare_json: Option<PathBuf>,
) -> Result<bool> {
    let export = index.export();
    let mut success = true;

    if let Some(expected_root) = compare_root {
        let matches = export.root_hash.eq_ignore_ascii_case(expected_root.trim());
        eprintln!("Expected root: {}", expected_root);
        eprintln!("Actual root:   {}", export.root_hash);
        if !matches {
            eprintln!("✗ ERROR: Root hash comparison failed!");
            success = false;
        }
    }

    if let Some(reference_path) = compare_json {
        let reference = load_reference_json(&reference_path)?;
        let report = compare_export(&export, &reference);
        eprintln!("{}", report);
        if !report.is_success() {
            eprintln!("✗ ERROR: Output comparison with reference JSON failed!");
            success = false;
        }
    }

    write_output(output.as_deref(), &export, pretty)?;

    Ok(success)
}

fn print_vesting_state(state: &VestingState, claimed: Option<U256>) {
    println!("Total allocation: {} ({})", state.total_allocation, format_ether(state.total_allocation));
    println!("Vested:           {}", state.vested_amount);
    println!("Claimable:        {}", state.claimable_amount);
    println!("Locked:           {}", state.locked_amount);
    println!("Progress:         {:.2}%", state.vesting_progress());

    match state.cliff_ends_at {
        Some(cliff) => println!(
            "Cliff ends at:    {} ({})",
            format_timestamp(cliff),
            if state.is_after_cliff { "passed" } else { "pending" }
        ),
        None => println!("Cliff ends at:    no vesting schedule"),
    }

    if let Some(claimed) = claimed {
        println!("Already claimed:  {}", claimed);
        println!("Releasable now:   {}", state.releasable(claimed));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    debug!("Configuration loaded: {:?}", config);

    let exit_code = match cli.command {
        Commands::Root => {
            let index = load_index(&config, cli.whitelist)?;
            println!("{}", bytes_to_hex(index.root().as_slice()));
            0
        }
        Commands::Export {
            output,
            pretty,
            compare_root,
            compare_json,
        } => {
            let index = load_index(&config, cli.whitelist)?;
            if run_export(&index, output, pretty, compare_root, compare_json)? { 0 } else { 1 }
        }
        Commands::Allocation { address } => {
            let index = load_index(&config, cli.whitelist)?;
            match index.lookup(&address)? {
                Some(allocation) => {
                    println!("Address: {}", allocation.address.to_checksum(None));
                    println!("Amount:  {} ({} tokens)", allocation.amount, format_ether(allocation.amount));
                    if !allocation.tier.is_empty() {
                        println!("Tier:    {}", allocation.tier);
                    }
                    if !allocation.reason.is_empty() {
                        println!("Reason:  {}", allocation.reason);
                    }
                    println!("Root:    {}", bytes_to_hex(index.root().as_slice()));
                    println!("Leaf:    {}", bytes_to_hex(allocation.leaf.as_slice()));
                    println!("Proof:");
                    for (level, hash) in allocation.proof_hex().iter().enumerate() {
                        println!("  [{}] {}", level, hash);
                    }
                    0
                }
                None => {
                    println!("Not eligible: {} is not on the whitelist", address.trim());
                    1
                }
            }
        }
        Commands::Verify { root, leaf, proof } => {
            let root = parse_hash(&root)?;
            let leaf = parse_hash(&leaf)?;
            let proof = proof
                .iter()
                .map(|hash| parse_hash(hash))
                .collect::<Result<Vec<_>, _>>()?;

            if verify_proof(&root, &leaf, &proof) {
                println!("✓ Proof is valid");
                0
            } else {
                println!("✗ Proof is INVALID");
                1
            }
        }
        Commands::Vesting { address, at, claimed } => {
            let index = load_index(&config, cli.whitelist)?;
            let claimed = claimed
                .map(|value| parse_amount("claimed", &value))
                .transpose()?;

            match index.lookup(&address)? {
                Some(allocation) => {
                    let now = match at {
                        Some(timestamp) => timestamp,
                        None => u64::try_from(Utc::now().timestamp()).unwrap_or(0),
                    };
                    println!("Evaluated at:     {}", format_timestamp(now));
                    print_vesting_state(&allocation.vesting_state(now), claimed);
                    if let Some(schedule) = allocation.vesting {
                        println!("Fully vested at:  {}", format_timestamp(schedule.ends_at()));
                    }
                    0
                }
                None => {
                    println!("Not eligible: {} is not on the whitelist", address.trim());
                    1
                }
            }
        }
    };

    if exit_code != 0 {
        process::exit(exit_code);
    }

    Ok(())
}
