use clap::{Parser, Subcommand};
use url::Url;

use subdomain_gateway::codec::{decode_cid, encode_multibase, Multibase, DAG_PB};
use subdomain_gateway::gateway::{
    decode_dnslink_label, encode_dnslink_label, to_path_url, to_subdomain_url, PathRecovery,
};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Address translation CLI for the subdomain gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a path-form gateway URL to its canonical subdomain form
    Subdomain { url: String },
    /// Recover the path form (and identifier case) of a subdomain URL
    Path { url: String },
    /// Decode a CID and print its canonical CIDv1 base32 form
    Cid { text: String },
    /// Inline a DNSLink domain into a single DNS label
    Dnslink { domain: String },
    /// Recover a DNSLink domain from an inlined label
    Undnslink { label: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Subdomain { url } => {
            let url = Url::parse(&url)?;
            match to_subdomain_url(&url) {
                Some(redirect) => {
                    println!("{} {}", redirect.status, redirect.location);
                    println!("cache-control: {}", redirect.cache_control);
                }
                None => println!("pass through (not a translatable gateway path)"),
            }
        }
        Commands::Path { url } => {
            let url = Url::parse(&url)?;
            match to_path_url(&url) {
                PathRecovery::Recovered(recovered) => println!("{recovered}"),
                PathRecovery::CanonicalRedirect(redirect) => {
                    println!("{} {}", redirect.status, redirect.location);
                }
                PathRecovery::NotGateway => println!("not a gateway URL"),
            }
        }
        Commands::Cid { text } => match decode_cid(&text) {
            Some(cid) => {
                println!("version:   {}", cid.version);
                println!("codec:     0x{:02x}", cid.codec);
                println!(
                    "multihash: {}",
                    encode_multibase(&cid.multihash, Multibase::Base16Lower)
                );
                println!(
                    "canonical: {}",
                    encode_multibase(&cid.to_v1_bytes(DAG_PB), Multibase::Base32Lower)
                );
            }
            None => {
                eprintln!("Error: not a decodable CID");
                std::process::exit(1);
            }
        },
        Commands::Dnslink { domain } => println!("{}", encode_dnslink_label(&domain)),
        Commands::Undnslink { label } => println!("{}", decode_dnslink_label(&label)),
    }

    Ok(())
}
