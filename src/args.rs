use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Bot,
    Screenshot,
}

#[derive(Debug)]
pub struct Args {
    pub mode: Mode,
    pub debug: bool,
    pub config_path: Option<PathBuf>,
}

impl Args {
    pub fn parse() -> Option<Self> {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse flags (program name already removed). `None` means exit without running.
    pub fn parse_from<I: IntoIterator<Item = String>>(args: I) -> Option<Self> {
        let mut mode = Mode::Bot;
        let mut debug = false;
        let mut config_path: Option<PathBuf> = None;

        for arg in args {
            if arg == "--help" || arg == "-h" {
                print_help();
                return None;
            } else if arg == "--version" || arg == "-v" {
                println!(
                    "TFT ADB Run v{} ({})",
                    env!("APP_VERSION_DISPLAY"),
                    env!("APP_BUILD_YEAR")
                );
                return None;
            } else if arg == "--debug" {
                debug = true;
            } else if arg == "--screenshot" || arg == "-s" {
                mode = Mode::Screenshot;
            } else if let Some(path) = arg.strip_prefix("--config=") {
                if path.is_empty() {
                    eprintln!("❌ --config needs a path");
                    return None;
                }
                config_path = Some(PathBuf::from(path));
            } else {
                eprintln!("❌ Unknown argument: {}", arg);
                print_help();
                return None;
            }
        }

        Some(Args {
            mode,
            debug,
            config_path,
        })
    }
}

fn print_help() {
    println!("🤖 TFT ADB Run");
    println!();
    println!("USAGE:");
    println!("    tft-adb-run [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    (no flags)          Run the bot");
    println!("    --config=PATH       Config file (default: ~/.tft-adb-run/config.yaml)");
    println!("    --screenshot, -s    Take a screenshot and save to file (cli-screenshot.png)");
    println!("    --debug             Enable debug logging");
    println!("    --help, -h          Show this help message");
    println!("    --version, -v       Show version information");
    println!();
    println!("WHILE RUNNING (type and press enter):");
    println!("    p                   Pause or resume");
    println!("    n                   Toggle playing another game after this one");
    println!();
    println!("EXAMPLES:");
    println!("    tft-adb-run");
    println!("    tft-adb-run --debug --config=./config.yaml");
    println!("    tft-adb-run --screenshot");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Option<Args> {
        Args::parse_from(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_defaults_run_the_bot() {
        let args = parse(&[]).expect("args");
        assert_eq!(args.mode, Mode::Bot);
        assert!(!args.debug);
        assert!(args.config_path.is_none());
    }

    #[test]
    fn test_flags() {
        let args = parse(&["--debug", "-s", "--config=/tmp/bot.yaml"]).expect("args");
        assert_eq!(args.mode, Mode::Screenshot);
        assert!(args.debug);
        assert_eq!(args.config_path, Some(PathBuf::from("/tmp/bot.yaml")));
    }

    #[test]
    fn test_unknown_or_incomplete_flags_stop() {
        assert!(parse(&["--gui"]).is_none());
        assert!(parse(&["--config="]).is_none());
        assert!(parse(&["--help"]).is_none());
    }
}
