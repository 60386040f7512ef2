//! Command-line interface

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "swapbot", about = "Automated order execution and settlement engine")]
pub struct Arguments {
    /// Path to the TOML config file
    #[arg(long, default_value = "swapbot.toml")]
    pub config: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Enable verbose logging (implies debug)
    #[arg(long)]
    pub verbose: bool,
}

impl Arguments {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_flags() {
        let args = Arguments::parse_from(["swapbot"]);
        assert_eq!(args.config, "swapbot.toml");
        assert!(!args.debug);
        assert!(!args.verbose);
    }

    #[test]
    fn flags_parse() {
        let args = Arguments::parse_from(["swapbot", "--config", "/etc/swapbot.toml", "--verbose"]);
        assert_eq!(args.config, "/etc/swapbot.toml");
        assert!(args.verbose);
    }
}
