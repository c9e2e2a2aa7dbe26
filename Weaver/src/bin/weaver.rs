fn main() -> anyhow::Result<()> {
    weaver::cli::run_cli()
}
