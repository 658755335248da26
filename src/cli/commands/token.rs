use crate::auth::{Role, TokenIssuer};
use crate::config::AppConfig;

pub fn handle(config: &AppConfig, subject: &str, role: &str, hours: Option<u64>) -> anyhow::Result<()> {
    if Role::from_wire(role).is_none() {
        let known: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
        anyhow::bail!("unknown role '{}' (expected one of: {})", role, known.join(", "));
    }

    let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
    let issuer = TokenIssuer::new(&config.security.jwt_secret, hours)?;
    let token = issuer.issue(subject, role)?;

    tracing::info!("Issued {} token for '{}' valid {}h", role, subject, hours);
    println!("{}", token);
    Ok(())
}
