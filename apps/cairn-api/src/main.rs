use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = cairn_api::Args::parse();
	cairn_api::run(args).await
}
