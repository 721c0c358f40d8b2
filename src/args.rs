use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the `cysafe` demo binary.
#[derive(Parser, Debug)]
#[clap(
    name = "cysafe",
    version,
    about = "Scan a file or URL against several detection services and print the report",
    long_about = None
)]
pub struct CysafeArgs {
    /// Configuration file (defaults to ~/.config/cysafe/config.toml)
    #[clap(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Never call the network; every provider answers synthetically
    #[clap(long, global = true)]
    pub offline: bool,

    /// Log output format: pretty, compact or json
    #[clap(long = "log-format", global = true, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Verbose logging
    #[clap(short, long, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: ScanCommand,
}

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub enum ScanCommand {
    /// Scan an http(s) URL
    Url {
        /// Absolute URL
        url: String,
    },
    /// Hash and scan a local file
    File {
        path: PathBuf,

        /// MIME type reported for the file
        #[clap(long, value_name = "TYPE")]
        mime: Option<String>,
    },
    /// Scan by a precomputed MD5, SHA-1 or SHA-256 digest
    Hash {
        hash: String,

        /// File size in bytes, if known
        #[clap(long, default_value_t = 0)]
        size: u64,

        #[clap(long, value_name = "TYPE")]
        mime: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_with_global_flags() {
        let args = CysafeArgs::try_parse_from([
            "cysafe",
            "url",
            "https://example.com",
            "--offline",
            "--log-format",
            "compact",
        ])
        .unwrap();
        assert!(args.offline);
        assert_eq!(args.log_format.as_deref(), Some("compact"));
        assert_eq!(
            args.command,
            ScanCommand::Url {
                url: "https://example.com".to_string()
            }
        );
    }

    #[test]
    fn test_parse_hash() {
        let args = CysafeArgs::try_parse_from([
            "cysafe",
            "-v",
            "hash",
            "d41d8cd98f00b204e9800998ecf8427e",
            "--size",
            "42",
        ])
        .unwrap();
        assert!(args.verbose);
        match args.command {
            ScanCommand::Hash { hash, size, mime } => {
                assert_eq!(hash, "d41d8cd98f00b204e9800998ecf8427e");
                assert_eq!(size, 42);
                assert!(mime.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(CysafeArgs::try_parse_from(["cysafe"]).is_err());
    }
}
