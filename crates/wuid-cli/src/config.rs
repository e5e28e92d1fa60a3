use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use wuid::Shard;

/// Command-line arguments for the `wuid` binary.
///
/// Every flag can also be supplied through the environment (or a `.env` file),
/// which is how deployments usually pin the shard and the epoch file.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wuid",
    version,
    about = "Mint globally unique 64-bit ids backed by a file epoch counter"
)]
pub struct CliArgs {
    /// Diagnostic label attached to every log line.
    ///
    /// Environment variable: `WUID_TAG`
    #[arg(long, env = "WUID_TAG", default_value_t = String::from("wuid-cli"))]
    pub tag: String,

    /// Shard tag in `[1, 15]` reserving the top four bits of every id.
    ///
    /// Processes sharing an epoch file must use different shards, or none.
    ///
    /// Environment variable: `WUID_SHARD`
    #[arg(long, env = "WUID_SHARD")]
    pub shard: Option<u8>,

    /// Number of ids to print.
    ///
    /// Environment variable: `WUID_COUNT`
    #[arg(short = 'n', long, env = "WUID_COUNT", default_value_t = 1)]
    pub count: u64,

    /// File holding the last allocated epoch. Created on first use.
    ///
    /// Environment variable: `WUID_EPOCH_FILE`
    #[arg(long, env = "WUID_EPOCH_FILE", default_value = "wuid.epoch")]
    pub epoch_file: PathBuf,

    /// Print ids as zero-padded hexadecimal instead of decimal.
    #[arg(long, env = "WUID_HEX", default_value_t = false)]
    pub hex: bool,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub tag: String,
    pub shard: Option<Shard>,
    pub count: u64,
    pub epoch_file: PathBuf,
    pub hex: bool,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.count == 0 {
            bail!("WUID_COUNT must be greater than 0");
        }
        if args.tag.trim().is_empty() {
            bail!("WUID_TAG must not be empty");
        }
        let shard = args.shard.map(Shard::new).transpose()?;

        Ok(Self {
            tag: args.tag,
            shard,
            count: args.count,
            epoch_file: args.epoch_file,
            hex: args.hex,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<CliConfig> {
        let args = CliArgs::try_parse_from(std::iter::once("wuid").chain(args.iter().copied()))?;
        CliConfig::try_from(args)
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.count, 1);
        assert!(config.shard.is_none());
        assert!(!config.hex);
    }

    #[test]
    fn shard_is_validated() {
        let config = parse(&["--shard", "7"]).unwrap();
        assert_eq!(config.shard.map(Shard::get), Some(7));

        let err = parse(&["--shard", "16"]).unwrap_err();
        assert_eq!(err.to_string(), "shard must be in between [1, 15], got 16");
        assert!(parse(&["--shard", "0"]).is_err());
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(parse(&["-n", "0"]).is_err());
    }
}
