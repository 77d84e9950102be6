fn main() -> anyhow::Result<()> {
    overlaykit::cli::run_cli()
}
