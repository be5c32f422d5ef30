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
    // Secrets (CPG_JWT_SECRET, CPG_STRIPE_SECRET_KEY, CPG_PAYPAL_SECRET, CPG_MAILER_API_KEY) are deliberately absent
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "CPG_HOST",
        "CPG_PORT",
        "CPG_DATABASE_URL",
        "CPG_AUTO_MIGRATE",
        "CPG_ADMIN_GROUP",
        "CPG_STRIPE_API_BASE",
        "CPG_PAYPAL_CLIENT_ID",
        "CPG_PAYPAL_ENV",
        "CPG_PAYPAL_API_BASE",
        "CPG_PAYMENT_WEBHOOK_URL",
        "CPG_REFUND_WEBHOOK_URL",
        "CPG_MAILER_URL",
        "CPG_MAILER_ADMIN_EMAIL",
        "CPG_MAILER_CONFIRMATION_SUBJECT",
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
