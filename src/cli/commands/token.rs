use anyhow::Context;
use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::output::output_success;
use crate::cli::OutputFormat;
use crate::config::config;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "User id the token identifies")]
    pub user: Uuid,

    #[arg(long, help = "Display name carried in the token")]
    pub name: Option<String>,

    #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config().security;
    let hours = args.hours.unwrap_or(security.jwt_expiry_hours);

    let claims = Claims::new(args.user, args.name, hours).context("building token claims")?;
    let token = generate_jwt(&claims, &security.jwt_secret).context("signing token")?;

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            json!({ "token": token, "user_id": args.user, "expires_at": claims.exp }),
            &[],
        ),
        OutputFormat::Text => {
            // Bare token so it can be captured with $(coursectl token ...)
            println!("{}", token);
            Ok(())
        }
    }
}
