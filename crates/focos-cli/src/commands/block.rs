use serde::Serialize;

use focos_core::elevation::{self, SystemRunner};
use focos_core::{BlockResponse, Config, HostsBlockManager, Platform, SessionError, StrictLock};

fn manager() -> Result<HostsBlockManager, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    Ok(HostsBlockManager::from_config(&config.hosts))
}

/// Refuse while a strict session in any focos process holds the lock.
fn ensure_unlocked() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(lock) = StrictLock::active()? {
        tracing::warn!(pid = lock.pid, until = %lock.until, "hosts change refused during strict session");
        return Err(SessionError::StrictLocked.into());
    }
    Ok(())
}

/// Print the response and turn a failure into an error exit.
fn report(response: BlockResponse, json: bool, done: &str) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(&response)?);
    } else if response.success {
        println!("{done}");
    }
    match response.error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

pub async fn block(sites: Vec<String>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    ensure_unlocked()?;
    let manager = manager()?;
    let response = BlockResponse::from(manager.apply(&sites).await);
    report(response, json, "blocked")
}

pub async fn unblock(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    ensure_unlocked()?;
    let manager = manager()?;
    let response = BlockResponse::from(manager.clear().await);
    report(response, json, "unblocked")
}

#[derive(Serialize)]
struct Status {
    hosts_path: String,
    blocking: bool,
    domains: Vec<String>,
    elevated: bool,
    /// End of the strict session holding the block, if one is running.
    strict_until: Option<String>,
}

pub async fn status(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let manager = manager()?;
    let domains = manager.current_block().await?;
    let status = Status {
        hosts_path: manager.hosts_path().display().to_string(),
        blocking: domains.is_some(),
        domains: domains.unwrap_or_default(),
        elevated: elevation::is_elevated(Platform::current(), &SystemRunner).await,
        strict_until: StrictLock::active()?.map(|lock| lock.until.to_rfc3339()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else if status.blocking {
        println!("Blocking {} site(s) in {}:", status.domains.len(), status.hosts_path);
        for domain in &status.domains {
            println!("  {domain}");
        }
    } else {
        println!("Not blocking ({})", status.hosts_path);
    }
    if let Some(until) = &status.strict_until {
        println!("Strict session running until {until}; the block cannot be changed.");
    }
    if !status.elevated {
        println!("Not running as administrator; changes will ask for permission.");
    }
    Ok(())
}

pub async fn elevated() -> Result<(), Box<dyn std::error::Error>> {
    let elevated = elevation::is_elevated(Platform::current(), &SystemRunner).await;
    println!("{elevated}");
    Ok(())
}
