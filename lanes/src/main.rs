use clap::{Parser, Subcommand};
use lanes::{
    print_box, validate_event, Backend, BatchVerifier, EventValidator, LaneConfig, NostrEvent,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

/// Batch secp256k1 signature verification for Nostr events
#[derive(Parser)]
#[command(name = "lanes", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify the signatures of the events in FILE
    ///
    /// FILE holds either a JSON array of events or one event per line.
    Verify {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Backend::Cpu)]
        backend: Backend,

        /// Number of CPU lanes (defaults to one per core)
        #[arg(long)]
        lanes: Option<usize>,

        /// Batches up to this size are verified on the calling thread
        #[arg(long, default_value_t = lanes::config::DEFAULT_INLINE_THRESHOLD)]
        inline_threshold: usize,

        /// Also check that each event id matches its contents
        #[arg(long)]
        check_ids: bool,

        /// Print a verdict line for every event
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show the available backends and curve parameters
    Info,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Verify {
            file,
            backend,
            lanes,
            inline_threshold,
            check_ids,
            verbose,
        } => {
            let mut config = LaneConfig::default()
                .with_backend(backend)
                .with_inline_threshold(inline_threshold);
            if let Some(lanes) = lanes {
                config = config.with_lanes(lanes);
            }
            run_verify(&file, &config, check_ids, verbose)
        }
        Command::Info => run_info(),
    };

    match result {
        Ok(code) => code,
        Err(message) => {
            log::error!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn load_events(file: &PathBuf) -> Result<Vec<NostrEvent>, String> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| format!("cannot read {}: {}", file.display(), e))?;

    if text.trim_start().starts_with('[') {
        return serde_json::from_str(&text)
            .map_err(|e| format!("{}: invalid event array: {}", file.display(), e));
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| format!("{}:{}: invalid event: {}", file.display(), i + 1, e))
        })
        .collect()
}

fn run_verify(
    file: &PathBuf,
    config: &LaneConfig,
    check_ids: bool,
    verbose: bool,
) -> Result<ExitCode, String> {
    let events = load_events(file)?;
    log::info!("Loaded {} events from {}", events.len(), file.display());

    let verifier = BatchVerifier::new(config).map_err(|e| e.to_string())?;
    let validator = EventValidator::new(verifier);

    let start = Instant::now();
    let flags = match validator.try_validate(&events) {
        Ok(flags) => flags,
        Err(err) => {
            log::error!("Batch failed (code {}): {}", err.code(), err);
            println!("✗ batch failed, all {} events rejected", events.len());
            return Ok(ExitCode::from(2));
        }
    };
    let elapsed = start.elapsed();

    let mut valid = 0usize;
    for (event, &ok) in events.iter().zip(&flags) {
        let id_ok = !check_ids || event.id_matches();
        let accepted = ok && id_ok;
        if accepted {
            valid += 1;
        }
        if verbose || !accepted {
            let reason = if accepted {
                String::new()
            } else if !id_ok {
                " (id does not match contents)".to_string()
            } else {
                rejection_reason(event)
            };
            let status = if accepted { "✓" } else { "✗" };
            println!("{} {}{}", status, event.id, reason);
        }
    }

    println!();
    println!("Verified:  {}/{}", valid, events.len());
    println!("Backend:   {}", validator.verifier().executor_name());
    println!("Time:      {:.3} ms", elapsed.as_secs_f64() * 1000.0);
    if !events.is_empty() {
        println!(
            "Rate:      {:.0} signatures/sec",
            events.len() as f64 / elapsed.as_secs_f64()
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Explains a batch rejection by re-checking the event on this thread
///
/// The batch path only reports 0/1; the single-event hook supplies the
/// relay message. A recheck that accepts means the two paths disagree.
fn rejection_reason(event: &NostrEvent) -> String {
    match validate_event(event) {
        Err(e) => format!(" ({})", e),
        Ok(()) => {
            log::warn!(
                "Event {} was rejected by the batch but accepted on recheck",
                event.id
            );
            " (rejected by batch, accepted on recheck)".to_string()
        }
    }
}

fn run_info() -> Result<ExitCode, String> {
    print_box("secp256k1 batch verification");

    let curve = k1::CurveConstants::get();
    println!("p  = {}", curve.p);
    println!("n  = {}", curve.n);
    println!("Gx = {}", curve.generator.x);
    println!("Gy = {}", curve.generator.y);
    println!();

    let cpu = lanes::CpuLanes::new(None).map_err(|e| e.to_string())?;
    println!("cpu: {} lanes", lanes::LaneExecutor::lanes(&cpu));

    #[cfg(feature = "gpu")]
    match lanes::gpu::GpuLanes::new(&LaneConfig::default()) {
        Ok(gpu) => {
            let info = gpu.context().adapter_info();
            println!("gpu: {} ({:?})", info.name, info.backend);
        }
        Err(e) => println!("gpu: unavailable ({})", e),
    }
    #[cfg(not(feature = "gpu"))]
    println!("gpu: not built (enable the `gpu` feature)");

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanes::SignedEvent;

    #[test]
    fn test_cli_parses_verify() {
        let cli = Cli::try_parse_from([
            "lanes",
            "verify",
            "events.json",
            "--backend",
            "cpu",
            "--lanes",
            "4",
        ])
        .unwrap();
        match cli.command {
            Command::Verify {
                lanes, backend, ..
            } => {
                assert_eq!(lanes, Some(4));
                assert_eq!(backend, Backend::Cpu);
            }
            Command::Info => panic!("expected verify"),
        }
    }

    fn satoshi_event() -> NostrEvent {
        // private key 1 signing sha256("Satoshi Nakamoto")
        NostrEvent {
            id: "a0dc65ffca799873cbea0ac274015b9526505daaaed385155425f7337704883e".into(),
            pubkey: "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798".into(),
            created_at: 0,
            kind: 1,
            tags: Vec::new(),
            content: String::new(),
            sig: "934b1ea10a4b3c1757e2b0c017d0b6143ce3c9a7e6a4a49860d7a6ab210ee3d8\
                  2442ce9d2b916064108014783e923ec36b49743e2ffa1c4496f01a512aafd9e5"
                .into(),
        }
    }

    #[test]
    fn test_rejection_reason_messages() {
        let mut bad = satoshi_event();
        bad.sig.replace_range(0..2, "94");
        assert_eq!(rejection_reason(&bad), " (invalid: Bad signature)");

        let mut malformed = satoshi_event();
        malformed.pubkey = "xyz".into();
        assert!(rejection_reason(&malformed).contains("Signature validation error"));
    }

    #[test]
    fn test_rejection_reason_flags_disagreement() {
        assert_eq!(
            rejection_reason(&satoshi_event()),
            " (rejected by batch, accepted on recheck)"
        );
    }

    #[test]
    fn test_event_decoding_helpers() {
        let event = NostrEvent {
            id: "ab".repeat(32),
            pubkey: "cd".repeat(32),
            created_at: 0,
            kind: 1,
            tags: Vec::new(),
            content: String::new(),
            sig: "ef".repeat(64),
        };
        assert!(event.request().is_some());
    }
}
