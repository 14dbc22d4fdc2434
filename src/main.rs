use anyhow::Result;

fn main() -> Result<()> {
    astrosmith::cli::run()
}
