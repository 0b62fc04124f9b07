//! Terminal implementations of the credential and certificate prompts.

use std::fmt::Display;
use std::path::PathBuf;

use async_trait::async_trait;
use dialoguer::Input;
use eapnm::{CertificatePrompt, ConfigureError, CredentialPrompt, ProviderInfo};

fn prompt_err(e: impl Display) -> ConfigureError {
    ConfigureError::Prompt(e.to_string())
}

/// Asks on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

fn greet(provider: &ProviderInfo) {
    if !provider.display_name.is_empty() {
        eprintln!("Configuring networks of {}", provider.display_name);
    }
}

/// Checks a username the same way the library will.
fn check_username(input: &str, prefix: &str, suffix: &str) -> Result<(), String> {
    if input.is_empty() {
        return Err("username cannot be empty".into());
    }
    if !input.starts_with(prefix) {
        return Err(format!("username must start with '{prefix}'"));
    }
    if !input.ends_with(suffix) {
        return Err(format!("username must end with '{suffix}'"));
    }
    if !suffix.is_empty() && input.len() <= suffix.len() {
        return Err(format!("username needs a name before '{suffix}'"));
    }
    Ok(())
}

fn read_username(prefix: String, suffix: String) -> eapnm::Result<String> {
    let label = match (prefix.is_empty(), suffix.is_empty()) {
        (true, true) => "Username".to_string(),
        (false, true) => format!("Username ({prefix}...)"),
        (true, false) => format!("Username (...{suffix})"),
        (false, false) => format!("Username ({prefix}...{suffix})"),
    };
    Input::<String>::new()
        .with_prompt(label)
        .validate_with(move |input: &String| check_username(input, &prefix, &suffix))
        .interact_text()
        .map_err(prompt_err)
}

fn read_password() -> eapnm::Result<String> {
    loop {
        let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
        if password.is_empty() {
            eprintln!("Password cannot be empty");
            continue;
        }
        let confirm = rpassword::prompt_password("Confirm password: ").map_err(prompt_err)?;
        if password == confirm {
            return Ok(password);
        }
        eprintln!("Passwords do not match");
    }
}

fn read_certificate(mut container: Vec<u8>) -> eapnm::Result<(Vec<u8>, String)> {
    while container.is_empty() {
        let path: String = Input::new()
            .with_prompt("Path to client certificate (.p12)")
            .interact_text()
            .map_err(prompt_err)?;
        match std::fs::read(PathBuf::from(path.trim())) {
            Ok(bytes) if !bytes.is_empty() => container = bytes,
            Ok(_) => eprintln!("File is empty"),
            Err(e) => eprintln!("Cannot read {path}: {e}"),
        }
    }
    let passphrase = rpassword::prompt_password("Certificate passphrase: ").map_err(prompt_err)?;
    Ok((container, passphrase))
}

#[async_trait]
impl CredentialPrompt for TerminalPrompt {
    async fn credentials(
        &self,
        prefix: &str,
        suffix: &str,
        provider: &ProviderInfo,
    ) -> eapnm::Result<(String, String)> {
        greet(provider);
        let (prefix, suffix) = (prefix.to_string(), suffix.to_string());
        tokio::task::spawn_blocking(move || -> eapnm::Result<(String, String)> {
            let username = read_username(prefix, suffix)?;
            let password = read_password()?;
            Ok((username, password))
        })
        .await
        .map_err(prompt_err)?
    }
}

#[async_trait]
impl CertificatePrompt for TerminalPrompt {
    async fn certificate(
        &self,
        container: &[u8],
        _passphrase: &str,
        provider: &ProviderInfo,
    ) -> eapnm::Result<(Vec<u8>, String)> {
        greet(provider);
        let container = container.to_vec();
        tokio::task::spawn_blocking(move || read_certificate(container))
            .await
            .map_err(prompt_err)?
    }
}
