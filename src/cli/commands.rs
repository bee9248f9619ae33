//! CLI command implementations

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::fs::File;
use std::path::Path;

use crate::config::{ensure_in_alphabet, CipherConfig};
use crate::engine::CipherEngine;
use crate::machine::Generator;
use crate::serialization::{render_html, JsonKeySerializer, KeyMaterial, KeySerializer};

use super::args::{Cli, Commands};

/// Execute a parsed CLI invocation.
pub fn run(cli: Cli) -> Result<()> {
    let config = CipherConfig {
        seed: cli.seed,
        ..CipherConfig::default()
    };
    config.validate()?;

    match cli.command {
        Commands::NewKeys { html } => cmd_new_keys(&cli.keys, html, cli.verbose, &config),
        Commands::Encrypt { text } => cmd_encrypt(&text, &cli.keys, cli.verbose, &config),
        Commands::Decrypt { text } => cmd_decrypt(&text, &cli.keys, &config),
        Commands::RoundTrip { text } => cmd_round_trip(&text, &cli.keys, &config),
    }
}

fn cmd_new_keys(keys_path: &Path, html: bool, verbose: bool, config: &CipherConfig) -> Result<()> {
    let machines = Generator::from_config(config).generate(
        &config.source_alphabet,
        &config.cipher_alphabet,
        config.num_states,
    )?;
    let engine = CipherEngine::new(machines, config)?;
    let keys = KeyMaterial::from_engine(&engine);

    let file = File::create(keys_path)
        .with_context(|| format!("creating {}", keys_path.display()))?;
    JsonKeySerializer::save(&keys, file)?;
    println!("{} {}", "wrote".green(), keys_path.display());

    if html {
        let html_path = keys_path.with_extension("html");
        std::fs::write(&html_path, render_html(engine.machines()))
            .with_context(|| format!("writing {}", html_path.display()))?;
        println!("{} {}", "wrote".green(), html_path.display());
    }

    if verbose {
        for &letter in engine.machines().letters() {
            let queued = engine.word_store().queued(letter);
            println!("{}", format!("  '{letter}': {queued} words pooled").dimmed());
        }
    }

    Ok(())
}

fn cmd_encrypt(text: &str, keys_path: &Path, verbose: bool, config: &CipherConfig) -> Result<()> {
    ensure_in_alphabet(text, &config.source_alphabet)?;
    let mut engine = load_engine(keys_path, config)?;

    let ciphertext = engine.encrypt(text)?;
    if verbose {
        let fragments = text.chars().count() + 1;
        println!(
            "{}",
            format!("  {fragments} fragments (parity included)").dimmed()
        );
    }
    println!("{ciphertext}");

    Ok(())
}

fn cmd_decrypt(text: &str, keys_path: &Path, config: &CipherConfig) -> Result<()> {
    ensure_in_alphabet(text, &config.cipher_alphabet)?;
    let engine = load_engine(keys_path, config)?;

    let plaintext = engine.decrypt(text)?;
    println!("{plaintext}");

    Ok(())
}

fn cmd_round_trip(text: &str, keys_path: &Path, config: &CipherConfig) -> Result<()> {
    ensure_in_alphabet(text, &config.source_alphabet)?;
    let mut engine = load_engine(keys_path, config)?;

    let ciphertext = engine.encrypt(text)?;
    let recovered = engine.decrypt(&ciphertext)?;
    println!("{} {}", "cipher:".bold(), ciphertext);
    println!("{} {}", "recovered:".bold(), recovered);

    if recovered != text {
        bail!("round trip mismatch: recovered \"{recovered}\"");
    }
    println!("{}", "round trip OK".green().bold());

    Ok(())
}

fn load_engine(keys_path: &Path, config: &CipherConfig) -> Result<CipherEngine> {
    let file = File::open(keys_path)
        .with_context(|| format!("no key material at {}", keys_path.display()))?;
    let keys = JsonKeySerializer::load(file)?;
    Ok(keys.into_engine(config)?)
}
