//! `par2` entry point: forwards every argument to the bundled par2cmdline-turbo binary.

use par2cmdline_turbo::launcher;
use std::ffi::OsString;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    let result = launcher::install_root().and_then(|root| {
        let program = launcher::binary_path(&root);
        let transfer = launcher::default_transfer();
        launcher::launch(transfer.as_ref(), &program, &args, &mut std::io::stdout())
    });

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:?}", e);
            std::process::exit(1);
        }
    }
}
