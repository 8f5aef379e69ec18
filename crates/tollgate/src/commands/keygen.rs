//! Keygen command - prints fresh cookie encryption material.

use anyhow::Result;
use clap::Args;
use rand::{Rng, distr::Alphanumeric};

use tollgate_server::crypto::{IV_LEN, KEY_LEN};

use super::Context;

/// Arguments for the keygen command.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Print only the values, one per line, without variable names
    #[arg(long)]
    pub raw: bool,
}

/// Run the keygen command.
///
/// Output is ready to append to a `.env` file. Rotating these values
/// invalidates every session cookie already issued.
pub fn run(args: KeygenArgs, _ctx: &Context) -> Result<()> {
    let (secret, iv) = generate();

    if args.raw {
        println!("{}", secret);
        println!("{}", iv);
    } else {
        println!("AES_SECRET={}", secret);
        println!("AES_IV={}", iv);
    }

    Ok(())
}

/// A full-length key and IV, both alphanumeric.
fn generate() -> (String, String) {
    (random_alphanumeric(KEY_LEN), random_alphanumeric(IV_LEN))
}

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
