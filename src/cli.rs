use clap::{Arg, Command, ArgAction};

pub const DEFAULT_CONFIG_PATH: &str = "config/trafficcam.yaml";

pub fn build_cli() -> Command {
    Command::new("trafficcam")
        .version("0.1.0")
        .about("Fetches traffic camera snapshots and archives them to Google Drive.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom configuration file")
                .default_value(DEFAULT_CONFIG_PATH)
                .action(ArgAction::Set)
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
        )
}
