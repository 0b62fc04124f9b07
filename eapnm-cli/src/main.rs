fn main() -> anyhow::Result<()> {
    eapnm_cli::run()
}
