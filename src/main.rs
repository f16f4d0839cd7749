use std::path::Path;
use std::process;
use std::sync::Arc;
use std::thread;

use hc_adapters::{BuildHost, Builder, LogUi, ShellProvisioner};
use hc_core::CancelToken;
use hcflow_rust::{BuildFile, HostError, OpenSshFactory};
use log::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "uso: hcflow [--validate] <build.json>";

/// Ctrl-C levanta la cancelación; el build termina el step en curso y
/// deshace lo creado.
fn watch_interrupt(cancel: CancelToken) {
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                warn!("could not install the interrupt handler: {e}");
                return;
            }
        };
        if rt.block_on(tokio::signal::ctrl_c()).is_ok() {
            warn!("interrupt received, cancelling the build");
            cancel.cancel();
        }
    });
}

fn validate(path: &Path) -> Result<(), HostError> {
    let file = BuildFile::load(path)?;
    let builder = Builder::prepare(file.builder)?;
    info!("build file is valid: {:?} build '{}'", builder.config().kind, builder.config().build_name);
    Ok(())
}

fn build(path: &Path) -> Result<String, HostError> {
    let file = BuildFile::load(path)?;
    let builder = Builder::prepare(file.builder)?;
    let cancel = CancelToken::new();
    watch_interrupt(cancel.clone());

    let host = BuildHost { ui: Arc::new(LogUi),
                           cancel,
                           provisioner: Arc::new(ShellProvisioner::new(file.provision)),
                           communicators: Arc::new(OpenSshFactory) };
    let artifact = builder.run(host)?;
    Ok(artifact.label())
}

fn main() {
    // .env opcional con las credenciales HYPERCLOUD_*
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                             .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (validate_only, path) = match args.as_slice() {
        [flag, path] if flag == "--validate" => (true, path),
        [path] if !path.starts_with("--") => (false, path),
        _ => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    let result = if validate_only {
        validate(Path::new(path)).map(|()| String::from("ok"))
    } else {
        build(Path::new(path))
    };
    match result {
        Ok(label) => println!("{label}"),
        Err(e) => {
            eprintln!("[hcflow] {e}");
            process::exit(e.exit_code());
        }
    }
}
