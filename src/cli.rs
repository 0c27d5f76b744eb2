use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "mkbootiso")]
pub struct Cli {
    /// Source installer ISO to remaster
    pub iso: PathBuf,

    /// Output path for the remastered image
    #[arg(short, long, default_value = "bootiso.iso")]
    pub output: PathBuf,

    /// Kickstart file to embed in the image
    #[arg(short, long, default_value = "edge.ks")]
    pub kickstart: String,

    /// Extra kernel command-line token, appended after "quiet" (repeatable)
    #[arg(long = "kargs", value_name = "ID")]
    pub kargs: Vec<String>,

    /// SHA-256 digest the source image must match
    #[arg(long, value_name = "HEX")]
    pub checksum: Option<String>,

    /// Enable debug logging and mastering tool output
    #[arg(short, long)]
    pub verbose: bool,
}
