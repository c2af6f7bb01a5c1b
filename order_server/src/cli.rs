use std::{env, env::VarError};

/// There's no real CLI for the server. Any argument at all prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
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
    const DISPLAY_ENVS: [&str; 7] = [
        "RUST_LOG",
        "EPD_HOST",
        "EPD_PORT",
        "EPD_ALLOWED_CURRENCIES",
        "EPD_ALLOWED_TOKENS",
        "EPD_SETTLE_PROBABILITY",
        "EPD_SIMULATOR_SEED",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    });
    let secret_set = ["EPD_WEBHOOK_SECRET", "WEBHOOK_SECRET"].iter().any(|n| env::var(n).is_ok_and(|s| !s.is_empty()));
    println!("  {:<35} {:<15}", "EPD_WEBHOOK_SECRET", if secret_set { "****" } else { "Not set" });
}
