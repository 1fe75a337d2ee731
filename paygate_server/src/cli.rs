use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 17] = [
        "RUST_LOG",
        "PGP_HOST",
        "PGP_PORT",
        "PGP_DATABASE_URL",
        "PGP_BASE_URL",
        "PGP_RECEIPT_PATH",
        "PGP_CANCEL_PATH",
        "PGP_ERROR_PATH",
        "PGP_USE_X_FORWARDED_FOR",
        "PGP_CALLBACK_SERVER_ALLOWED_NETWORKS",
        "PGP_LANGUAGE",
        "PGP_SHOP_TITLE",
        "PGP_SWEEP_ENABLED",
        "PGP_SWEEP_INTERVAL",
        "PGP_SWEEP_WINDOW",
        "PGP_SWEEP_PAGE_SIZE",
        "PGP_PAYGATE_MERCHANT_CODE",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
